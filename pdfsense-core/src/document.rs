use bytes::Bytes;
use uuid::Uuid;

use crate::{config::AnalyzerConfig, error::PdfsenseError};

/// An uploaded document. Immutable once received; dropped when the request ends.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Accept the document for processing or reject it before any extraction runs.
    pub fn validate(&self, config: &AnalyzerConfig) -> Result<(), PdfsenseError> {
        if !self.filename.ends_with(&config.required_extension) {
            return Err(PdfsenseError::InvalidExtension {
                filename: self.filename.clone(),
                expected: config.required_extension.clone(),
            });
        }

        if let Some(limit) = config.max_document_bytes {
            if self.len() > limit {
                return Err(PdfsenseError::DocumentTooLarge {
                    filename: self.filename.clone(),
                    size: self.len(),
                    limit,
                });
            }
        }

        Ok(())
    }
}
