use std::fmt;

use tracing::*;

/// Where a request is in the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    TextExtracted { used_ocr: bool },
    Normalized,
    Analyzed,
    Assembled,
    Completed,
    Failed,
}

impl Stage {
    pub const fn name(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::TextExtracted { used_ocr: false } => "text-extracted(native)",
            Stage::TextExtracted { used_ocr: true } => "text-extracted(ocr)",
            Stage::Normalized => "normalized",
            Stage::Analyzed => "analyzed",
            Stage::Assembled => "assembled",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }

    const fn ordinal(&self) -> u8 {
        match self {
            Stage::Received => 0,
            Stage::Validated => 1,
            Stage::TextExtracted { .. } => 2,
            Stage::Normalized => 3,
            Stage::Analyzed => 4,
            Stage::Assembled => 5,
            Stage::Completed => 6,
            Stage::Failed => u8::MAX,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }

    /// Stages advance one step at a time; `Failed` is reachable from any
    /// non-terminal stage.
    pub const fn can_advance_to(&self, next: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Stage::Failed => true,
            _ => next.ordinal() == self.ordinal() + 1,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records the stage of a single request and traces each transition.
#[derive(Debug)]
pub struct StageTracker {
    current: Stage,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: Stage::Received,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        info!("Stage {} -> {}", self.current, next);
        self.current = next;
    }

    /// Move to `Failed`, returning the stage the failure interrupted.
    pub fn fail(&mut self) -> Stage {
        let interrupted = self.current;
        self.advance(Stage::Failed);
        interrupted
    }
}
