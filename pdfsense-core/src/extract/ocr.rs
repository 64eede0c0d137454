use std::{sync::Arc, time::Instant};

use tracing::*;

use crate::{
    capability::{OcrEngine, PdfRasterizer},
    error::PdfsenseError,
};

/// Recovers text from page images when a document carries no embedded text.
///
/// Every page is rasterized at `dpi` and recognized exactly once; page results
/// are concatenated in page order with no separator, so engines end each page
/// with a line break. This is the most expensive stage and is only run on the
/// fallback path.
#[derive(Clone)]
pub struct OcrFallbackExtractor {
    rasterizer: Arc<dyn PdfRasterizer>,
    engine: Arc<dyn OcrEngine>,
    dpi: u16,
}

impl OcrFallbackExtractor {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, engine: Arc<dyn OcrEngine>, dpi: u16) -> Self {
        Self {
            rasterizer,
            engine,
            dpi,
        }
    }

    pub fn extract(&self, document: &[u8]) -> Result<String, PdfsenseError> {
        let render_start = Instant::now();
        let images = self.rasterizer.rasterize(document, self.dpi)?;
        info!(
            "Rasterized {} pages at {} dpi in {:?}",
            images.len(),
            self.dpi,
            render_start.elapsed()
        );

        let mut text = String::new();
        for (page_no, image) in images.iter().enumerate() {
            let start = Instant::now();
            let page_text = self.engine.recognize(image)?;
            debug!(
                "OCR page {} produced {} characters in {:?}",
                page_no,
                page_text.chars().count(),
                start.elapsed()
            );
            text.push_str(&page_text);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::DynamicImage;

    use super::*;

    struct BlankPages {
        pages: usize,
        seen_dpi: AtomicUsize,
    }

    impl PdfRasterizer for BlankPages {
        fn rasterize(&self, _document: &[u8], dpi: u16) -> Result<Vec<DynamicImage>, PdfsenseError> {
            self.seen_dpi.store(dpi as usize, Ordering::SeqCst);
            Ok((0..self.pages)
                .map(|idx| DynamicImage::new_rgb8(10 + idx as u32, 10))
                .collect())
        }
    }

    #[derive(Default)]
    struct WidthReader {
        calls: AtomicUsize,
    }

    impl OcrEngine for WidthReader {
        fn recognize(&self, image: &DynamicImage) -> Result<String, PdfsenseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("w{}", image.width()))
        }
    }

    struct FailingEngine;

    impl OcrEngine for FailingEngine {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, PdfsenseError> {
            Err(PdfsenseError::Capability {
                capability: "ocr".to_string(),
                message: "tesseract exited".to_string(),
            })
        }
    }

    #[test]
    fn test_one_recognition_per_page_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let rasterizer = Arc::new(BlankPages {
            pages: 3,
            seen_dpi: AtomicUsize::new(0),
        });
        let engine = Arc::new(WidthReader::default());
        let extractor = OcrFallbackExtractor::new(rasterizer.clone(), engine.clone(), 200);

        assert_eq!(extractor.extract(b"%PDF")?, "w10w11w12");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
        assert_eq!(rasterizer.seen_dpi.load(Ordering::SeqCst), 200);
        Ok(())
    }

    #[test]
    fn test_engine_failure_propagates() {
        let rasterizer = Arc::new(BlankPages {
            pages: 1,
            seen_dpi: AtomicUsize::new(0),
        });
        let extractor = OcrFallbackExtractor::new(rasterizer, Arc::new(FailingEngine), 200);
        assert!(extractor.extract(b"%PDF").is_err());
    }
}
