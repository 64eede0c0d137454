use std::{
    cmp::Ordering,
    path::Path,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use image::DynamicImage;
use snafu::ResultExt;
use tracing::*;

use crate::{
    capability::OcrEngine,
    consts::*,
    error::*,
    inference::{
        model::session_builder,
        paddle::{
            PaddleDet, PaddleDetConfig, PaddleDetSession, PaddleRec, PaddleRecConfig,
            PaddleRecSession, TextDetection,
        },
    },
};

const INTRA_THREADS: usize = 4;

/// PaddleOCR page recognition: text line detection followed by per-line
/// recognition.
///
/// Sessions need exclusive access while running, so each sits behind a
/// mutex and concurrent pages queue on them.
pub struct PaddleOcr {
    detector: Mutex<PaddleDetSession<PaddleDet>>,
    recognizer: Mutex<PaddleRecSession<PaddleRec>>,
    line_tolerance: f32,
}

impl PaddleOcr {
    pub fn from_paths(det_model: impl AsRef<Path>, rec_model: impl AsRef<Path>) -> Result<Self, PdfsenseError> {
        let start = Instant::now();
        let det = PaddleDet::from_file(det_model, PaddleDetConfig::default())?;
        let rec = PaddleRec::from_file(rec_model, PaddleRecConfig::default())?;

        let detector = PaddleDetSession::new(session_builder(INTRA_THREADS)?, det)?;
        let recognizer = PaddleRecSession::new(session_builder(INTRA_THREADS)?, rec)?;
        info!(
            "Loaded OCR models ({} characters) in {:?}",
            recognizer.character_dict().len(),
            start.elapsed()
        );

        Ok(Self {
            detector: Mutex::new(detector),
            recognizer: Mutex::new(recognizer),
            line_tolerance: OCR_LINE_Y_TOLERANCE,
        })
    }

    /// Model paths from `PDFSENSE_OCR_DET_MODEL` and `PDFSENSE_OCR_REC_MODEL`.
    pub fn from_env() -> Result<Self, PdfsenseError> {
        let det = std::env::var(OCR_DET_MODEL_ENV_NAME).context(EnvNotFoundSnafu {
            name: OCR_DET_MODEL_ENV_NAME,
        })?;
        let rec = std::env::var(OCR_REC_MODEL_ENV_NAME).context(EnvNotFoundSnafu {
            name: OCR_REC_MODEL_ENV_NAME,
        })?;
        Self::from_paths(det, rec)
    }
}

impl OcrEngine for PaddleOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, PdfsenseError> {
        let detections = self
            .detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detect_text_lines(image)?;
        debug!("Detected {} text lines", detections.len());

        let mut recognizer = self
            .recognizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut lines = Vec::new();
        for row in reading_order(detections, self.line_tolerance) {
            let mut parts = Vec::with_capacity(row.len());
            for detection in &row {
                let text = recognizer.recognize_text_region(image, &detection.bbox)?;
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            if !parts.is_empty() {
                lines.push(parts.join(" "));
            }
        }

        Ok(page_text(&lines))
    }
}

/// Recognized lines of one page, each ending in a line break so consecutive
/// pages never run together.
pub fn page_text(lines: &[String]) -> String {
    lines.iter().fold(String::new(), |mut text, line| {
        text.push_str(line);
        text.push('\n');
        text
    })
}

/// Group detections into rows top to bottom, each row left to right.
///
/// A detection joins the current row when its vertical center is within
/// `tolerance` pixels of the row's first detection.
pub fn reading_order(mut detections: Vec<TextDetection>, tolerance: f32) -> Vec<Vec<TextDetection>> {
    detections.sort_by(|a, b| {
        a.bbox
            .center()
            .y
            .partial_cmp(&b.bbox.center().y)
            .unwrap_or(Ordering::Equal)
    });

    let mut rows: Vec<Vec<TextDetection>> = Vec::new();
    for detection in detections {
        match rows.last_mut() {
            Some(row)
                if row.first().is_some_and(|first| {
                    (detection.bbox.center().y - first.bbox.center().y).abs() <= tolerance
                }) =>
            {
                row.push(detection)
            }
            _ => rows.push(vec![detection]),
        }
    }

    for row in rows.iter_mut() {
        row.sort_by(|a, b| a.bbox.min.x.partial_cmp(&b.bbox.min.x).unwrap_or(Ordering::Equal));
    }
    rows
}
