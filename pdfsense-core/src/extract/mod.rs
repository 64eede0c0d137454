pub mod native;
pub mod ocr;
pub mod table;

pub use native::NativeTextExtractor;
pub use ocr::OcrFallbackExtractor;
pub use table::TableExtractor;
