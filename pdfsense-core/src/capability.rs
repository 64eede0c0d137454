//! Interfaces to the external engines the pipeline depends on.
//!
//! The pipeline never talks to a concrete PDF library, OCR model or NLP model
//! directly; it holds `Arc<dyn ...>` handles to these traits. Implementations
//! are blocking and are driven from the blocking thread pool. They must be
//! safe to share read-only across concurrent requests.

use std::{ops::Range, path::Path};

use image::DynamicImage;

use crate::{
    error::PdfsenseError,
    model::{TableGrid, TaggedSpan},
};

/// Pages a capability should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Range(Range<u16>),
}

impl PageSelection {
    pub fn contains(&self, page: u16) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
        }
    }
}

/// Structural PDF parser: bytes to the embedded text of every page, in page order.
///
/// Fails with a parse error when the document structure is malformed.
pub trait PdfStructureParser: Send + Sync {
    fn page_texts(&self, document: &[u8]) -> Result<Vec<String>, PdfsenseError>;
}

/// Renders every page of a document to an image.
pub trait PdfRasterizer: Send + Sync {
    fn rasterize(&self, document: &[u8], dpi: u16) -> Result<Vec<DynamicImage>, PdfsenseError>;
}

/// Optical character recognition over one page image.
///
/// Blank pages may legitimately produce an empty string; any other page ends
/// with a line break.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, PdfsenseError>;
}

/// Named entity tagger producing `(text, label)` spans in discovery order.
pub trait EntityTagger: Send + Sync {
    fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>, PdfsenseError>;
}

/// Identifies the language of a text as an ISO-like code such as `en`.
///
/// Empty or undecidable input is an error, never a guess.
pub trait LanguageIdentifier: Send + Sync {
    fn identify(&self, text: &str) -> Result<String, PdfsenseError>;
}

/// Detects tables in a document addressed by file path.
pub trait TableDetector: Send + Sync {
    fn detect(&self, path: &Path, pages: &PageSelection) -> Result<Vec<TableGrid>, PdfsenseError>;
}
