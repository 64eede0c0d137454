use lingua::{LanguageDetector as LinguaDetector, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use tracing::*;

use crate::{capability::LanguageIdentifier, error::PdfsenseError};

static DETECTOR: Lazy<LinguaDetector> = Lazy::new(|| {
    info!("Building language detector");
    LanguageDetectorBuilder::from_all_languages().build()
});

/// Statistical language identification backed by `lingua`.
///
/// The underlying detector is built once per process and shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinguaIdentifier;

impl LinguaIdentifier {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageIdentifier for LinguaIdentifier {
    fn identify(&self, text: &str) -> Result<String, PdfsenseError> {
        let language =
            DETECTOR
                .detect_language_of(text)
                .ok_or_else(|| PdfsenseError::Capability {
                    capability: "language".to_string(),
                    message: "No features in text.".to_string(),
                })?;

        debug!("Detected language {:?}", language);
        Ok(language.iso_code_639_1().to_string())
    }
}
