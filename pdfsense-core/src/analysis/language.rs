use std::sync::Arc;

use crate::{capability::LanguageIdentifier, error::PdfsenseError};

/// Language of the normalized document text.
///
/// Empty text is rejected up front; anything the identifier cannot decide
/// surfaces as its error.
#[derive(Clone)]
pub struct LanguageDetector {
    identifier: Arc<dyn LanguageIdentifier>,
}

impl LanguageDetector {
    pub fn new(identifier: Arc<dyn LanguageIdentifier>) -> Self {
        Self { identifier }
    }

    pub fn detect(&self, text: &str) -> Result<String, PdfsenseError> {
        if text.trim().is_empty() {
            return Err(PdfsenseError::Capability {
                capability: "language".to_string(),
                message: "No features in text.".to_string(),
            });
        }

        self.identifier.identify(text)
    }
}
