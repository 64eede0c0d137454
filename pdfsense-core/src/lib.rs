pub mod analysis;
pub mod capability;
pub mod config;
pub mod consts;
pub mod document;
pub mod error;
pub mod extract;
pub mod inference;
pub mod model;
pub mod nlp;
pub mod pdf;
pub mod pipeline;

// Re-export commonly used types
pub use capability::{
    EntityTagger, LanguageIdentifier, OcrEngine, PageSelection, PdfRasterizer, PdfStructureParser,
    TableDetector,
};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use document::Document;
pub use error::{ErrorKind, PdfsenseError};
pub use model::{EntityMap, KeywordSet, OrderedMap, SectionMap, TableGrid, TaggedSpan};
pub use pipeline::{
    AnalysisJournal, AnalysisOrchestrator, AnalysisReport, AnalysisResponse, Capabilities,
    FileJournal, JournalEntry, MemoryJournal,
};
