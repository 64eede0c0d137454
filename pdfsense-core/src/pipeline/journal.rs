use std::{
    fmt,
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Local};
use snafu::ResultExt;

use crate::error::{IoWriteSnafu, PdfsenseError};

/// One line of the processing journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Processed {
        timestamp: DateTime<Local>,
        filename: String,
        used_ocr: bool,
    },
    Failed {
        timestamp: DateTime<Local>,
        message: String,
    },
}

impl JournalEntry {
    pub fn processed(filename: impl Into<String>, used_ocr: bool) -> Self {
        JournalEntry::Processed {
            timestamp: Local::now(),
            filename: filename.into(),
            used_ocr,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        JournalEntry::Failed {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalEntry::Processed {
                timestamp,
                filename,
                used_ocr,
            } => write!(f, "{} | {} | OCR:{}", timestamp, filename, used_ocr),
            JournalEntry::Failed { timestamp, message } => {
                write!(f, "{} | ERROR | {}", timestamp, message)
            }
        }
    }
}

/// Append-only record of processed documents and failures, shared by every
/// request in the process. Appends from concurrent requests never interleave
/// within a line.
pub trait AnalysisJournal: Send + Sync {
    fn append(&self, entry: &JournalEntry) -> Result<(), PdfsenseError>;
}

/// Journal backed by a text file opened in append mode.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfsenseError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(IoWriteSnafu {
                path: path.display().to_string(),
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalysisJournal for FileJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), PdfsenseError> {
        let line = format!("{entry}\n");
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .context(IoWriteSnafu {
                path: self.path.display().to_string(),
            })
    }
}

/// In-process journal, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalysisJournal for MemoryJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), PdfsenseError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_entry_format() {
        let entry = JournalEntry::processed("tender.pdf", true);
        let line = entry.to_string();
        assert!(line.ends_with(" | tender.pdf | OCR:true"), "{line}");

        let line = JournalEntry::failed("boom").to_string();
        assert!(line.ends_with(" | ERROR | boom"), "{line}");
    }

    #[test]
    fn test_file_journal_appends_lines() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("processing.log");

        let journal = FileJournal::open(&path)?;
        journal.append(&JournalEntry::processed("a.pdf", false))?;
        drop(journal);

        // reopening keeps earlier lines
        let journal = FileJournal::open(&path)?;
        journal.append(&JournalEntry::failed("Invalid file type"))?;

        let content = std::fs::read_to_string(journal.path())?;
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("| a.pdf | OCR:false"));
        assert!(lines[1].ends_with("| ERROR | Invalid file type"));
        Ok(())
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let journal = Arc::new(FileJournal::open(dir.path().join("journal.log"))?);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let journal = Arc::clone(&journal);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let name = format!("doc-{worker}-{i}.pdf");
                        journal.append(&JournalEntry::processed(name, i % 2 == 0))?;
                    }
                    Ok::<_, PdfsenseError>(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().map_err(|_| "writer panicked")??;
        }

        let content = std::fs::read_to_string(journal.path())?;
        assert_eq!(content.lines().count(), 200);
        assert!(content.lines().all(|line| line.contains("| doc-") && line.contains("| OCR:")));
        Ok(())
    }

    #[test]
    fn test_memory_journal_keeps_order() -> Result<(), PdfsenseError> {
        let journal = MemoryJournal::new();
        journal.append(&JournalEntry::processed("a.pdf", false))?;
        journal.append(&JournalEntry::failed("b"))?;

        let entries = journal.entries();
        assert!(matches!(entries[0], JournalEntry::Processed { .. }));
        assert!(matches!(entries[1], JournalEntry::Failed { .. }));
        Ok(())
    }
}
