pub mod bbox;
pub mod entities;
pub mod keywords;
pub mod language;
pub mod normalize;
pub mod sections;

pub use entities::EntityExtractor;
pub use keywords::detect_keywords;
pub use language::LanguageDetector;
pub use normalize::normalize_text;
pub use sections::segment_sections;
