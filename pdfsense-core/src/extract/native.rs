use std::sync::Arc;

use tracing::*;

use crate::{capability::PdfStructureParser, error::PdfsenseError};

/// Embedded text of a document, pages concatenated in page order.
///
/// Pages without text contribute nothing, not even a separator, so a document
/// with no native text at all comes back as an empty string.
#[derive(Clone)]
pub struct NativeTextExtractor {
    parser: Arc<dyn PdfStructureParser>,
}

impl NativeTextExtractor {
    pub fn new(parser: Arc<dyn PdfStructureParser>) -> Self {
        Self { parser }
    }

    pub fn extract(&self, document: &[u8]) -> Result<String, PdfsenseError> {
        let pages = self.parser.page_texts(document)?;
        let total_pages = pages.len();

        let text = pages
            .into_iter()
            .filter(|page| !page.is_empty())
            .collect::<String>();

        info!(
            "Native extraction read {} characters from {} pages",
            text.chars().count(),
            total_pages
        );
        Ok(text)
    }
}
