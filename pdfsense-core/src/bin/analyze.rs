use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use image::DynamicImage;
use pdfsense_core::{
    AnalysisOrchestrator, AnalyzerConfig, Capabilities, FileJournal, OcrEngine, PdfsenseError,
    inference::PaddleOcr,
    nlp::{LinguaIdentifier, RuleTagger},
    pdf::{GridDetectorConfig, PdfiumBackend},
};
use tracing::*;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "analyze")]
#[command(about = "Analyze a PDF document and print the JSON report")]
struct Args {
    #[arg(help = "Input PDF file path")]
    input: PathBuf,

    #[arg(long, default_value = "processing.log", help = "Append-only processing journal")]
    journal: PathBuf,

    #[arg(long, help = "Directory holding the pdfium library, overrides PDFIUM_DYNAMIC_LIB_PATH")]
    pdfium_lib: Option<String>,

    #[arg(long, requires = "rec_model", help = "PaddleOCR detection model (.onnx)")]
    det_model: Option<PathBuf>,

    #[arg(long, requires = "det_model", help = "PaddleOCR recognition model (.onnx)")]
    rec_model: Option<PathBuf>,

    #[arg(long, default_value_t = 2, help = "Fewest aligned rows that form a table")]
    min_table_rows: usize,

    #[arg(long, default_value_t = 6, help = "More aligned columns than this is not a table")]
    max_table_columns: usize,

    #[arg(long, help = "Segment sections on the extracted lines instead of the cleaned text")]
    raw_sections: bool,

    #[arg(long, help = "Emit logs as JSON")]
    json_logs: bool,
}

/// Stands in for OCR when no models are configured; documents with embedded
/// text never reach it.
struct OcrUnavailable;

impl OcrEngine for OcrUnavailable {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, PdfsenseError> {
        Err(PdfsenseError::Capability {
            capability: "ocr".to_string(),
            message: "no OCR models configured".to_string(),
        })
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn ocr_engine(args: &Args) -> anyhow::Result<Arc<dyn OcrEngine>> {
    let engine: Arc<dyn OcrEngine> = match (&args.det_model, &args.rec_model) {
        (Some(det), Some(rec)) => Arc::new(PaddleOcr::from_paths(det, rec)?),
        _ => match PaddleOcr::from_env() {
            Ok(ocr) => Arc::new(ocr),
            Err(PdfsenseError::EnvNotFound { name, .. }) => {
                warn!("OCR disabled, `{}` is not set", name);
                Arc::new(OcrUnavailable)
            }
            Err(e) => return Err(e.into()),
        },
    };
    Ok(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let mut config = AnalyzerConfig::from_env()?;
    if args.raw_sections {
        config.segment_raw_text = true;
    }
    info!("Analyzer config: {:?}", config);

    let pdfium = match args.pdfium_lib.as_deref() {
        Some(path) => PdfiumBackend::bind(path)?,
        None => PdfiumBackend::from_env()?,
    };
    let pdfium = Arc::new(pdfium.with_grid_config(GridDetectorConfig {
        min_rows: args.min_table_rows,
        max_columns: args.max_table_columns,
        ..GridDetectorConfig::default()
    })?);

    let capabilities = Capabilities {
        parser: pdfium.clone(),
        rasterizer: pdfium.clone(),
        ocr: ocr_engine(&args)?,
        tagger: RuleTagger::shared()?,
        language: Arc::new(LinguaIdentifier::new()),
        tables: pdfium,
    };
    let journal = Arc::new(FileJournal::open(&args.journal)?);
    let orchestrator = AnalysisOrchestrator::new(config, capabilities, journal)?;

    let filename = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("`{}` has no file name", args.input.display()))?;
    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("read `{}`", args.input.display()))?;

    let response = orchestrator.handle(&filename, bytes).await;
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if !response.is_success() {
        anyhow::bail!("analysis failed with status {}", response.status_code);
    }
    Ok(())
}
