use std::{path::Path, time::Instant};

use image::DynamicImage;
use pdfium_render::prelude::{PdfDocument, PdfPage, PdfRenderConfig, Pdfium};
use snafu::ResultExt;
use tracing::*;

use crate::{
    capability::{PageSelection, PdfRasterizer, PdfStructureParser, TableDetector},
    consts::*,
    error::*,
    model::TableGrid,
    pdf::table::{GridDetector, GridDetectorConfig, TextSpan},
};

/// Pdfium-backed structural parsing, rasterization and table detection.
///
/// The library is bound once; documents are loaded per call so a single
/// backend is shared by every request.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    grid: GridDetector,
}

impl PdfiumBackend {
    /// Bind the pdfium library from the directory named by `PDFIUM_DYNAMIC_LIB_PATH`.
    pub fn from_env() -> Result<Self, PdfsenseError> {
        let lib_path = std::env::var(PDFIUM_LIB_PATH_ENV_NAME).context(EnvNotFoundSnafu {
            name: PDFIUM_LIB_PATH_ENV_NAME,
        })?;
        Self::bind(&lib_path)
    }

    pub fn bind(lib_path: &str) -> Result<Self, PdfsenseError> {
        info!("Binding pdfium from {}", lib_path);
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
            lib_path,
        ))
        .context(PdfiumSnafu {
            stage: "load-dyn-lib",
        })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            grid: GridDetector::default(),
        })
    }

    /// Replace the table grid heuristics, rejecting degenerate settings.
    pub fn with_grid_config(mut self, config: GridDetectorConfig) -> Result<Self, PdfsenseError> {
        self.grid = GridDetector::new(config)?;
        Ok(self)
    }

    fn load<'a>(&'a self, document: &'a [u8]) -> Result<PdfDocument<'a>, PdfsenseError> {
        self.pdfium
            .load_pdf_from_byte_slice(document, None)
            .context(MalformedPdfSnafu)
    }

    fn page_spans(page: &PdfPage) -> Result<Vec<TextSpan>, PdfsenseError> {
        let text = page.text().context(PdfiumSnafu { stage: "text" })?;
        let spans = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                let (left, right) = (bounds.left.value, bounds.right.value);
                let (bottom, top) = (bounds.bottom.value, bounds.top.value);
                TextSpan::new(segment.text(), left, bottom, right - left, top - bottom)
            })
            .collect();

        Ok(spans)
    }
}

impl PdfStructureParser for PdfiumBackend {
    #[tracing::instrument(skip_all)]
    fn page_texts(&self, document: &[u8]) -> Result<Vec<String>, PdfsenseError> {
        let pdf = self.load(document)?;

        pdf.pages()
            .iter()
            .map(|page| {
                page.text()
                    .map(|text| text.all())
                    .context(PdfiumSnafu { stage: "text" })
            })
            .collect()
    }
}

impl PdfRasterizer for PdfiumBackend {
    #[tracing::instrument(skip_all, fields(dpi = dpi))]
    fn rasterize(&self, document: &[u8], dpi: u16) -> Result<Vec<DynamicImage>, PdfsenseError> {
        let pdf = self.load(document)?;
        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

        pdf.pages()
            .iter()
            .enumerate()
            .map(|(page_no, page)| {
                let start = Instant::now();
                let image = page
                    .render_with_config(&render_config)
                    .context(PdfiumSnafu { stage: "render" })
                    .map(|bitmap| bitmap.as_image())?;
                debug!(
                    "Rendered page {} to {}x{} in {:?}",
                    page_no,
                    image.width(),
                    image.height(),
                    start.elapsed()
                );
                Ok(image)
            })
            .collect()
    }
}

impl TableDetector for PdfiumBackend {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn detect(&self, path: &Path, pages: &PageSelection) -> Result<Vec<TableGrid>, PdfsenseError> {
        let pdf = self
            .pdfium
            .load_pdf_from_file(path, None)
            .context(MalformedPdfSnafu)?;

        let mut tables = Vec::new();
        for (page_no, page) in pdf.pages().iter().enumerate() {
            if !pages.contains(page_no as u16) {
                continue;
            }
            let spans = Self::page_spans(&page)?;
            let found = self.grid.detect(&spans);
            debug!("Page {} has {} tables", page_no, found.len());
            tables.extend(found);
        }

        Ok(tables)
    }
}
