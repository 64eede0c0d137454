pub mod journal;
pub mod orchestrator;
pub mod report;
pub mod response;
pub mod stage;

pub use journal::{AnalysisJournal, FileJournal, JournalEntry, MemoryJournal};
pub use orchestrator::{AnalysisOrchestrator, Capabilities};
pub use report::{AnalysisReport, ExtractionResult, ReportStatus};
pub use response::{AnalysisResponse, ErrorBody};
pub use stage::{Stage, StageTracker};
