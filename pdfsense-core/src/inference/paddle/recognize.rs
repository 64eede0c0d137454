use std::path::Path;

use glam::Vec2;
use image::{DynamicImage, imageops::FilterType};
use ndarray::prelude::*;
use ort::{
    session::{Session, builder::SessionBuilder},
    value::TensorRef,
};
use snafu::{OptionExt, ResultExt};

use crate::{
    analysis::bbox::Bbox,
    consts::PADDLE_REC_INPUT_HEIGHT,
    error::*,
    inference::model::{Model, OnnxSession, read_weights},
};

pub type PaddleRecInput = Array4<f32>;
pub type PaddleRecOutput = Array2<f32>;

/// Configuration for the CTC text recognition model.
#[derive(Debug, Clone)]
pub struct PaddleRecConfig {
    /// Line crops are resized to this height, width follows the aspect ratio
    pub required_height: usize,
    /// Upper bound on the resized width
    pub max_width: usize,
}

impl Default for PaddleRecConfig {
    fn default() -> Self {
        Self {
            required_height: PADDLE_REC_INPUT_HEIGHT,
            max_width: 3200,
        }
    }
}

pub struct PaddleRec {
    weights: Vec<u8>,
    config: PaddleRecConfig,
}

impl PaddleRec {
    pub fn from_file(path: impl AsRef<Path>, config: PaddleRecConfig) -> Result<Self, PdfsenseError> {
        Ok(Self {
            weights: read_weights(path)?,
            config,
        })
    }
}

impl Model for PaddleRec {
    type Input = PaddleRecInput;
    type Output = PaddleRecOutput;
    type Config = PaddleRecConfig;

    const INPUT_NAME: &'static str = "x";
    const OUTPUT_NAME: &'static str = "fetch_name_0";
    const MODEL_NAME: &'static str = "PP-OCRv5_mobile_rec";

    fn load(&self) -> &[u8] {
        &self.weights
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

pub struct PaddleRecSession<M: Model> {
    session: Session,
    model: M,
    character_dict: Vec<String>,
}

impl PaddleRecSession<PaddleRec> {
    pub fn new(session: SessionBuilder, model: PaddleRec) -> Result<Self, PdfsenseError> {
        let session = session
            .commit_from_memory(model.load())
            .context(OrtInitSnafu { stage: "commit" })?;

        // dictionary ships in the model metadata, one character per line
        let chars = session
            .metadata()
            .ok()
            .and_then(|m| m.custom("character").ok().flatten())
            .unwrap_or_default();

        Ok(Self {
            session,
            model,
            character_dict: character_dict(&chars),
        })
    }

    pub fn character_dict(&self) -> &[String] {
        &self.character_dict
    }

    /// Recognize the text inside `bbox` of a page image
    pub fn recognize_text_region(
        &mut self,
        image: &DynamicImage,
        bbox: &Bbox,
    ) -> Result<String, PdfsenseError> {
        let cropped = crop_image_region(image, bbox);
        self.run(&cropped, ())
    }
}

impl OnnxSession<PaddleRec> for PaddleRecSession<PaddleRec> {
    type Output = String;
    type Extra = ();

    fn preprocess(&self, image: &DynamicImage) -> Result<PaddleRecInput, PdfsenseError> {
        let config = self.model.config();
        let img_src = image.to_rgb8();

        let scale = config.required_height as f32 / img_src.height().max(1) as f32;
        let dst_width = ((img_src.width() as f32 * scale) as u32).clamp(1, config.max_width as u32);

        let src_resize = image::imageops::resize(
            &img_src,
            dst_width,
            config.required_height as u32,
            FilterType::Triangle,
        );

        let mut input_tensor = Array4::zeros([
            1,
            3,
            src_resize.height() as usize,
            src_resize.width() as usize,
        ]);
        for (x, y, pixel) in src_resize.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for (channel, value) in pixel.0.iter().enumerate() {
                input_tensor[[0, channel, y, x]] = (*value as f32 / 255.0 - 0.5) / 0.5;
            }
        }

        Ok(input_tensor)
    }

    fn postprocess(
        &self,
        output: PaddleRecOutput,
        _extra: Self::Extra,
    ) -> Result<Self::Output, PdfsenseError> {
        Ok(ctc_decode(output.view(), &self.character_dict))
    }

    fn infer(
        &mut self,
        input: PaddleRecInput,
        input_name: &str,
        output_name: &str,
    ) -> Result<PaddleRecOutput, PdfsenseError> {
        let output = self
            .session
            .run(ort::inputs![
                input_name => TensorRef::from_array_view(&input).context(TensorSnafu { stage: "recognize-input" })?
            ])
            .context(InferenceSnafu {})?;

        let tensor = output
            .get(output_name)
            .context(NotFoundOutputSnafu { output_name })?
            .try_extract_array::<f32>()
            .context(TensorSnafu {
                stage: "recognize-extract",
            })?;

        // [batch = 1, sequence, vocab]
        let shape = tensor.shape();
        if shape.len() != 3 {
            return Err(PdfsenseError::Capability {
                capability: "ocr".to_string(),
                message: format!("unexpected recognition output shape {:?}", shape),
            });
        }
        let (steps, vocab) = (shape[1], shape[2]);
        let logits = tensor
            .to_shape((steps, vocab))
            .context(ShapeSnafu { stage: "recognize" })?
            .to_owned();

        Ok(logits)
    }
}

/// Index 0 is the CTC blank, the last entry the space character.
pub fn character_dict(chars: &str) -> Vec<String> {
    let mut dict = Vec::with_capacity(chars.lines().count() + 2);
    dict.push("#".to_string());
    dict.extend(chars.lines().map(str::to_string));
    dict.push(" ".to_string());
    dict
}

/// Greedy CTC decoding of a `[sequence, vocab]` score matrix.
pub fn ctc_decode(scores: ArrayView2<f32>, dict: &[String]) -> String {
    let mut text = String::new();
    let mut prev = None;

    for timestep in scores.axis_iter(Axis(0)) {
        let best = timestep
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        if best != 0 && Some(best) != prev {
            if let Some(ch) = dict.get(best) {
                text.push_str(ch);
            }
        }
        prev = Some(best);
    }

    text
}

/// Crop to `bbox` clamped to the image, never smaller than one pixel.
pub fn crop_image_region(image: &DynamicImage, bbox: &Bbox) -> DynamicImage {
    let clamped = bbox.clamp(
        Vec2::ZERO,
        Vec2::new(image.width() as f32, image.height() as f32),
    );

    let x = (clamped.min.x as u32).min(image.width().saturating_sub(1));
    let y = (clamped.min.y as u32).min(image.height().saturating_sub(1));
    let width = (clamped.width().max(1.0) as u32).min(image.width().saturating_sub(x));
    let height = (clamped.height().max(1.0) as u32).min(image.height().saturating_sub(y));

    if width == 0 || height == 0 {
        return DynamicImage::new_rgb8(1, 1);
    }
    image.crop_imm(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(indices: &[usize], vocab: usize) -> Array2<f32> {
        let mut scores = Array2::<f32>::zeros((indices.len(), vocab));
        for (step, idx) in indices.iter().enumerate() {
            scores[[step, *idx]] = 1.0;
        }
        scores
    }

    #[test]
    fn test_character_dict_layout() {
        let dict = character_dict("a\nb\nc");
        assert_eq!(dict, vec!["#", "a", "b", "c", " "]);
    }

    #[test]
    fn test_ctc_collapses_repeats_and_blanks() {
        let dict = character_dict("c\na\nb\nl\ne");
        // c c _ a b b _ l e _ _ e
        let scores = one_hot(&[1, 1, 0, 2, 3, 3, 0, 4, 5, 0, 0, 5], dict.len());
        assert_eq!(ctc_decode(scores.view(), &dict), "cablee");
    }

    #[test]
    fn test_ctc_space_and_out_of_range() {
        let dict = character_dict("5\nm");
        let space = dict.len() - 1;
        let scores = one_hot(&[1, space, 2], dict.len() + 2);
        assert_eq!(ctc_decode(scores.view(), &dict), "5 m");

        let scores = one_hot(&[dict.len() + 1], dict.len() + 2);
        assert_eq!(ctc_decode(scores.view(), &dict), "");
    }

    #[test]
    fn test_crop_is_clamped() {
        let image = DynamicImage::new_rgb8(100, 50);

        let crop = crop_image_region(
            &image,
            &Bbox::new(Vec2::new(90.0, 40.0), Vec2::new(150.0, 80.0)),
        );
        assert_eq!((crop.width(), crop.height()), (10, 10));

        let crop = crop_image_region(
            &image,
            &Bbox::new(Vec2::new(200.0, 200.0), Vec2::new(210.0, 210.0)),
        );
        assert_eq!((crop.width(), crop.height()), (1, 1));
    }
}
