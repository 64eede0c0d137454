pub mod pdfium;
pub mod table;

pub use pdfium::PdfiumBackend;
pub use table::{GridDetector, GridDetectorConfig, TextSpan};
