use std::path::Path;

use image::DynamicImage;
use ort::{
    execution_providers::CPUExecutionProvider,
    session::{
        Session,
        builder::{GraphOptimizationLevel, SessionBuilder},
    },
};
use snafu::ResultExt;

use crate::error::{IoReadSnafu, OrtInitSnafu, PdfsenseError};

pub trait Model {
    type Input;
    type Output;
    type Config;

    const INPUT_NAME: &'static str;
    const OUTPUT_NAME: &'static str;
    const MODEL_NAME: &'static str;

    fn load(&self) -> &[u8];
    fn config(&self) -> &Self::Config;
}

pub trait OnnxSession<M: Model> {
    type Output;
    type Extra;

    fn preprocess(&self, image: &DynamicImage) -> Result<M::Input, PdfsenseError>;

    fn postprocess(
        &self,
        output: M::Output,
        extra: Self::Extra,
    ) -> Result<Self::Output, PdfsenseError>;

    fn infer(
        &mut self,
        input: M::Input,
        input_name: &str,
        output_name: &str,
    ) -> Result<M::Output, PdfsenseError>;

    fn run(
        &mut self,
        image: &DynamicImage,
        extra: Self::Extra,
    ) -> Result<Self::Output, PdfsenseError> {
        let input = self.preprocess(image)?;

        let output = self.infer(input, M::INPUT_NAME, M::OUTPUT_NAME)?;

        self.postprocess(output, extra)
    }
}

/// Read serialized model weights from disk.
pub fn read_weights(path: impl AsRef<Path>) -> Result<Vec<u8>, PdfsenseError> {
    let path = path.as_ref();
    std::fs::read(path).context(IoReadSnafu {
        path: path.display().to_string(),
    })
}

/// common session builder
pub fn session_builder(intra_threads: usize) -> Result<SessionBuilder, PdfsenseError> {
    let session_builder = Session::builder()
        .context(OrtInitSnafu { stage: "builder" })?
        .with_execution_providers(vec![
            #[cfg(all(feature = "coreml", target_os = "macos"))]
            {
                use ort::execution_providers::CoreMLExecutionProvider;
                use ort::execution_providers::coreml::*;
                CoreMLExecutionProvider::default()
                    .with_model_format(CoreMLModelFormat::MLProgram)
                    .build()
            },
            #[cfg(feature = "cuda")]
            {
                use ort::execution_providers::CUDAExecutionProvider;
                CUDAExecutionProvider::default().build()
            },
            CPUExecutionProvider::default().build(),
        ])
        .context(OrtInitSnafu { stage: "provider" })?
        .with_optimization_level(GraphOptimizationLevel::Level1)
        .context(OrtInitSnafu {
            stage: "optimization",
        })?
        .with_intra_threads(intra_threads)
        .context(OrtInitSnafu {
            stage: "intra-threads",
        })?;

    Ok(session_builder)
}
