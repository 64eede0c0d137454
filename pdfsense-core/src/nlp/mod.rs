pub mod labels;
pub mod language_id;
pub mod tagger;

pub use labels::EntityLabel;
pub use language_id::LinguaIdentifier;
pub use tagger::RuleTagger;
