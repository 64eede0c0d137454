use std::time::Duration;

/// Domain vocabulary scanned by the keyword detector.
///
/// Order matters: detected keywords are reported in this declaration order,
/// regardless of where they occur in the document.
pub const KEYWORD_VOCABULARY: [&str; 9] = [
    "cable",
    "wire",
    "voltage",
    "standard",
    "certification",
    "test",
    "quantity",
    "length",
    "specification",
];

/// Markers that turn a line into a section heading.
///
/// A line becomes a heading when its lowercase form contains any of these as a
/// plain substring ("testing" also matches inside "retesting").
pub const SECTION_HEADING_MARKERS: [&str; 6] = [
    "scope",
    "requirement",
    "specification",
    "delivery",
    "price",
    "testing",
];

/// Title of the bucket that collects text before the first heading.
pub const DEFAULT_SECTION_TITLE: &str = "General";

/// Extension an uploaded document must carry.
pub const REQUIRED_EXTENSION: &str = ".pdf";

/// Upper bound on accepted document size (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Resolution used when rasterizing pages for OCR.
pub const DEFAULT_RASTER_DPI: u16 = 200;

/// PDF user space unit: 72 points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Number of characters handed to the entity tagger.
///
/// Tagging cost grows with input length; only the head of the document is tagged.
pub const DEFAULT_ENTITY_CHAR_LIMIT: usize = 4000;

/// Deadline for a single external capability call.
pub const DEFAULT_CAPABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for one full analysis request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Prefix of the transient file handed to the table detector.
pub const TABLE_ARTIFACT_PREFIX: &str = "pdfsense-table-";

pub const PDFIUM_LIB_PATH_ENV_NAME: &str = "PDFIUM_DYNAMIC_LIB_PATH";
pub const OCR_DET_MODEL_ENV_NAME: &str = "PDFSENSE_OCR_DET_MODEL";
pub const OCR_REC_MODEL_ENV_NAME: &str = "PDFSENSE_OCR_REC_MODEL";

pub const MAX_DOCUMENT_BYTES_ENV_NAME: &str = "PDFSENSE_MAX_DOCUMENT_BYTES";
pub const RASTER_DPI_ENV_NAME: &str = "PDFSENSE_RASTER_DPI";
pub const ENTITY_CHAR_LIMIT_ENV_NAME: &str = "PDFSENSE_ENTITY_CHAR_LIMIT";
pub const CAPABILITY_TIMEOUT_ENV_NAME: &str = "PDFSENSE_CAPABILITY_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_ENV_NAME: &str = "PDFSENSE_REQUEST_TIMEOUT_SECS";
pub const SCRATCH_DIR_ENV_NAME: &str = "PDFSENSE_SCRATCH_DIR";
pub const SEGMENT_RAW_TEXT_ENV_NAME: &str = "PDFSENSE_SEGMENT_RAW_TEXT";

/// Input side length for the PaddleOCR detection model.
///
/// The DB detector downsamples by 32, so the side must be a multiple of 32.
pub const PADDLE_DET_INPUT_SIZE: usize = 960;

/// Input height for the PaddleOCR recognition model.
pub const PADDLE_REC_INPUT_HEIGHT: usize = 48;

/// Vertical tolerance (pixels) when ordering detected text lines into rows.
pub const OCR_LINE_Y_TOLERANCE: f32 = 8.0;
