use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use snafu::ResultExt;
use tracing::*;

use crate::{
    analysis::{EntityExtractor, LanguageDetector, detect_keywords, normalize_text, segment_sections},
    capability::{
        EntityTagger, LanguageIdentifier, OcrEngine, PdfRasterizer, PdfStructureParser,
        TableDetector,
    },
    config::AnalyzerConfig,
    document::Document,
    error::{CapabilityTimeoutSnafu, JoinSnafu, PdfsenseError},
    extract::{NativeTextExtractor, OcrFallbackExtractor, TableExtractor},
    pipeline::{
        journal::{AnalysisJournal, JournalEntry},
        report::{AnalysisReport, ExtractionResult, ReportStatus},
        response::AnalysisResponse,
        stage::{Stage, StageTracker},
    },
};

/// The external engines one orchestrator drives.
#[derive(Clone)]
pub struct Capabilities {
    pub parser: Arc<dyn PdfStructureParser>,
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub ocr: Arc<dyn OcrEngine>,
    pub tagger: Arc<dyn EntityTagger>,
    pub language: Arc<dyn LanguageIdentifier>,
    pub tables: Arc<dyn TableDetector>,
}

/// Runs one document through validation, extraction, analysis and assembly.
///
/// An orchestrator holds no per-request state and is shared by concurrent
/// requests; the only shared mutable state is the journal.
pub struct AnalysisOrchestrator {
    config: AnalyzerConfig,
    native: NativeTextExtractor,
    ocr: OcrFallbackExtractor,
    entities: EntityExtractor,
    language: LanguageDetector,
    tables: TableExtractor,
    journal: Arc<dyn AnalysisJournal>,
}

impl AnalysisOrchestrator {
    pub fn new(
        config: AnalyzerConfig,
        capabilities: Capabilities,
        journal: Arc<dyn AnalysisJournal>,
    ) -> Result<Self, PdfsenseError> {
        config.validate()?;

        Ok(Self {
            native: NativeTextExtractor::new(capabilities.parser),
            ocr: OcrFallbackExtractor::new(
                capabilities.rasterizer,
                capabilities.ocr,
                config.raster_dpi,
            ),
            entities: EntityExtractor::new(capabilities.tagger, config.entity_char_limit),
            language: LanguageDetector::new(capabilities.language),
            tables: TableExtractor::new(capabilities.tables, config.scratch_dir.clone()),
            journal,
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an upload and render the outcome as a status code plus JSON body.
    pub async fn handle(&self, filename: &str, bytes: impl Into<Bytes>) -> AnalysisResponse {
        let document = Document::new(filename, bytes);
        match self.analyze(document).await {
            Ok(report) => AnalysisResponse::success(&report),
            Err(e) => AnalysisResponse::failure(&e),
        }
    }

    /// Analyze a document, journaling the outcome either way.
    #[tracing::instrument(skip_all, fields(id = %document.id, filename = %document.filename))]
    pub async fn analyze(&self, document: Document) -> Result<AnalysisReport, PdfsenseError> {
        let start = Instant::now();
        let filename = document.filename.clone();
        let mut tracker = StageTracker::new();

        let outcome = match tokio::time::timeout(
            self.config.request_timeout,
            self.run_stages(document, &mut tracker),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(PdfsenseError::RequestTimeout {
                timeout: self.config.request_timeout,
            }),
        };

        match &outcome {
            Ok(report) => {
                tracker.advance(Stage::Completed);
                info!(
                    "Analyzed `{}` (ocr: {}) in {:?}",
                    filename,
                    report.used_ocr,
                    start.elapsed()
                );
                self.record(&JournalEntry::processed(&filename, report.used_ocr));
            }
            Err(e) => {
                let stage = tracker.fail();
                error!("Analysis of `{}` failed at stage {}: {}", filename, stage, e);
                self.record(&JournalEntry::failed(format!("{} [stage: {}]", e, stage)));
            }
        }

        outcome
    }

    async fn run_stages(
        &self,
        document: Document,
        tracker: &mut StageTracker,
    ) -> Result<AnalysisReport, PdfsenseError> {
        document.validate(&self.config)?;
        tracker.advance(Stage::Validated);

        let extraction = self.extract_text(&document).await?;
        tracker.advance(Stage::TextExtracted {
            used_ocr: extraction.used_ocr,
        });

        let text = normalize_text(&extraction.raw_text);
        tracker.advance(Stage::Normalized);

        let text: Arc<str> = Arc::from(text);
        let language = {
            let detector = self.language.clone();
            let text = Arc::clone(&text);
            self.blocking("language", move || detector.detect(&text))
        };
        let entities = {
            let extractor = self.entities.clone();
            let text = Arc::clone(&text);
            self.blocking("entities", move || extractor.extract(&text))
        };
        let tables = {
            let extractor = self.tables.clone();
            let bytes = document.bytes.clone();
            self.blocking("tables", move || extractor.extract(&bytes))
        };
        let lexical = async {
            let sections = if self.config.segment_raw_text {
                segment_sections(&extraction.raw_text)
            } else {
                segment_sections(&text)
            };
            Ok::<_, PdfsenseError>((detect_keywords(&text), sections))
        };

        let (language, entities, tables, (keywords, sections)) =
            futures::try_join!(language, entities, tables, lexical)?;
        tracker.advance(Stage::Analyzed);

        let report = AnalysisReport {
            status: ReportStatus::Success,
            filename: document.filename,
            used_ocr: extraction.used_ocr,
            language,
            keywords,
            entities,
            sections,
            tables,
            text: text.to_string(),
        };
        tracker.advance(Stage::Assembled);

        Ok(report)
    }

    /// Native extraction first; OCR only when it yields no non-whitespace text.
    async fn extract_text(&self, document: &Document) -> Result<ExtractionResult, PdfsenseError> {
        let native = self.native.clone();
        let bytes = document.bytes.clone();
        let raw_text = self
            .blocking("native-text", move || native.extract(&bytes))
            .await?;

        if !raw_text.trim().is_empty() {
            return Ok(ExtractionResult {
                raw_text,
                used_ocr: false,
            });
        }

        info!("No embedded text, falling back to OCR");
        let ocr = self.ocr.clone();
        let bytes = document.bytes.clone();
        let raw_text = self.blocking("ocr", move || ocr.extract(&bytes)).await?;

        Ok(ExtractionResult {
            raw_text,
            used_ocr: true,
        })
    }

    /// Run a blocking capability call on the blocking pool under the
    /// per-capability deadline.
    async fn blocking<T, F>(&self, capability: &'static str, task: F) -> Result<T, PdfsenseError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, PdfsenseError> + Send + 'static,
    {
        let start = Instant::now();
        let timeout = self.config.capability_timeout;

        let result = match tokio::time::timeout(timeout, tokio::task::spawn_blocking(task)).await {
            Ok(joined) => joined.context(JoinSnafu { capability })?,
            Err(_) => CapabilityTimeoutSnafu {
                capability,
                timeout,
            }
            .fail(),
        };

        match &result {
            Ok(_) => debug!("Capability `{}` finished in {:?}", capability, start.elapsed()),
            Err(e) => warn!("Capability `{}` failed after {:?}: {}", capability, start.elapsed(), e),
        }
        result
    }

    fn record(&self, entry: &JournalEntry) {
        if let Err(e) = self.journal.append(entry) {
            warn!("Journal append error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use image::DynamicImage;

    use super::*;
    use crate::{
        capability::PageSelection,
        model::{TableGrid, TaggedSpan},
        pipeline::journal::MemoryJournal,
    };

    #[derive(Default)]
    struct Fixture {
        pages: Vec<String>,
        ocr_calls: AtomicUsize,
        parse_calls: AtomicUsize,
        language_delay: Option<Duration>,
        table_delay: Option<Duration>,
        table_paths: Mutex<Vec<PathBuf>>,
    }

    impl Fixture {
        fn table_paths(&self) -> Vec<PathBuf> {
            self.table_paths
                .lock()
                .map(|paths| paths.clone())
                .unwrap_or_default()
        }
    }

    impl PdfStructureParser for Fixture {
        fn page_texts(&self, _document: &[u8]) -> Result<Vec<String>, PdfsenseError> {
            self.parse_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.clone())
        }
    }

    impl PdfRasterizer for Fixture {
        fn rasterize(&self, _document: &[u8], _dpi: u16) -> Result<Vec<DynamicImage>, PdfsenseError> {
            Ok(self.pages.iter().map(|_| DynamicImage::new_luma8(4, 4)).collect())
        }
    }

    impl OcrEngine for Fixture {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, PdfsenseError> {
            self.ocr_calls.fetch_add(1, Ordering::SeqCst);
            Ok("Scanned cable ".to_string())
        }
    }

    impl EntityTagger for Fixture {
        fn tag(&self, _text: &str) -> Result<Vec<TaggedSpan>, PdfsenseError> {
            Ok(Vec::new())
        }
    }

    impl LanguageIdentifier for Fixture {
        fn identify(&self, _text: &str) -> Result<String, PdfsenseError> {
            if let Some(delay) = self.language_delay {
                std::thread::sleep(delay);
            }
            Ok("en".to_string())
        }
    }

    impl TableDetector for Fixture {
        fn detect(&self, path: &Path, _pages: &PageSelection) -> Result<Vec<TableGrid>, PdfsenseError> {
            if let Ok(mut paths) = self.table_paths.lock() {
                paths.push(path.to_path_buf());
            }
            if let Some(delay) = self.table_delay {
                std::thread::sleep(delay);
            }
            Ok(Vec::new())
        }
    }

    fn orchestrator(
        fixture: Arc<Fixture>,
        config: AnalyzerConfig,
    ) -> Result<(AnalysisOrchestrator, Arc<MemoryJournal>), PdfsenseError> {
        let journal = Arc::new(MemoryJournal::new());
        let capabilities = Capabilities {
            parser: fixture.clone(),
            rasterizer: fixture.clone(),
            ocr: fixture.clone(),
            tagger: fixture.clone(),
            language: fixture.clone(),
            tables: fixture,
        };
        let orchestrator = AnalysisOrchestrator::new(config, capabilities, journal.clone())?;
        Ok((orchestrator, journal))
    }

    #[tokio::test]
    async fn test_native_text_skips_ocr() -> Result<(), PdfsenseError> {
        let fixture = Arc::new(Fixture {
            pages: vec!["Cable length 5m\n".to_string()],
            ..Fixture::default()
        });
        let (orchestrator, journal) = orchestrator(fixture.clone(), AnalyzerConfig::default())?;

        let report = orchestrator
            .analyze(Document::new("tender.pdf", vec![0u8; 8]))
            .await?;

        assert!(!report.used_ocr);
        assert_eq!(report.text, "Cable length 5m");
        assert_eq!(report.keywords, vec!["cable", "length"]);
        assert_eq!(fixture.ocr_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            journal.entries().as_slice(),
            [JournalEntry::Processed { used_ocr: false, .. }]
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_whitespace_only_text_falls_back_to_ocr() -> Result<(), PdfsenseError> {
        let fixture = Arc::new(Fixture {
            pages: vec![" \n".to_string(), "\t".to_string(), String::new()],
            ..Fixture::default()
        });
        let (orchestrator, _journal) = orchestrator(fixture.clone(), AnalyzerConfig::default())?;

        let report = orchestrator
            .analyze(Document::new("scan.pdf", vec![0u8; 8]))
            .await?;

        assert!(report.used_ocr);
        assert_eq!(fixture.ocr_calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.text, "Scanned cable Scanned cable Scanned cable");
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_upload_never_reaches_capabilities() -> Result<(), PdfsenseError> {
        let fixture = Arc::new(Fixture::default());
        let (orchestrator, journal) = orchestrator(fixture.clone(), AnalyzerConfig::default())?;

        let response = orchestrator.handle("report.docx", vec![0u8; 8]).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(fixture.parse_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            journal.entries().as_slice(),
            [JournalEntry::Failed { .. }]
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_capability_times_out() -> Result<(), PdfsenseError> {
        let fixture = Arc::new(Fixture {
            pages: vec!["Voltage 220V".to_string()],
            language_delay: Some(Duration::from_millis(500)),
            ..Fixture::default()
        });
        let config = AnalyzerConfig {
            capability_timeout: Duration::from_millis(50),
            ..AnalyzerConfig::default()
        };
        let (orchestrator, _journal) = orchestrator(fixture, config)?;

        let err = orchestrator
            .analyze(Document::new("tender.pdf", vec![0u8; 8]))
            .await
            .unwrap_err();

        assert!(matches!(err, PdfsenseError::CapabilityTimeout { .. }));
        assert_eq!(err.status_code(), 500);
        Ok(())
    }

    #[tokio::test]
    async fn test_timed_out_table_artifact_removed_when_detector_returns()
    -> Result<(), Box<dyn std::error::Error>> {
        let scratch = tempfile::tempdir()?;
        let fixture = Arc::new(Fixture {
            pages: vec!["Cable schedule".to_string()],
            table_delay: Some(Duration::from_millis(500)),
            ..Fixture::default()
        });
        let config = AnalyzerConfig {
            capability_timeout: Duration::from_millis(50),
            scratch_dir: Some(scratch.path().to_path_buf()),
            ..AnalyzerConfig::default()
        };
        let (orchestrator, _journal) = orchestrator(fixture.clone(), config)?;

        let err = orchestrator
            .analyze(Document::new("tender.pdf", vec![0u8; 8]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PdfsenseError::CapabilityTimeout { ref capability, .. } if capability == "tables"
        ));

        // the detached detector still holds the artifact
        let paths = fixture.table_paths();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].exists());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while paths[0].exists() && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!paths[0].exists());
        assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
        Ok(())
    }
}
