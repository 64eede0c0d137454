use std::{io::Write, path::PathBuf, sync::Arc};

use snafu::ResultExt;
use tempfile::NamedTempFile;
use tracing::*;
use uuid::Uuid;

use crate::{
    capability::{PageSelection, TableDetector},
    consts::TABLE_ARTIFACT_PREFIX,
    error::{ArtifactSnafu, PdfsenseError},
    model::TableGrid,
};

/// Runs table detection against the raw document bytes.
///
/// The detector needs a file path, so the bytes are written to a uniquely
/// named transient file that lives only for the duration of one call. The file
/// is removed on success, on detection failure and while unwinding from a
/// panic.
///
/// A caller that stops waiting (a deadline firing around `spawn_blocking`)
/// does not stop the detector. The file then stays on disk until the detector
/// returns, and is removed at that point.
#[derive(Clone)]
pub struct TableExtractor {
    detector: Arc<dyn TableDetector>,
    scratch_dir: Option<PathBuf>,
}

impl TableExtractor {
    pub fn new(detector: Arc<dyn TableDetector>, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            detector,
            scratch_dir,
        }
    }

    pub fn extract(&self, document: &[u8]) -> Result<Vec<TableGrid>, PdfsenseError> {
        let artifact = self.persist(document)?;
        debug!("Table artifact at {}", artifact.path().display());

        let detected = self.detector.detect(artifact.path(), &PageSelection::All);
        let released = artifact.close().context(ArtifactSnafu { stage: "cleanup" });

        let tables = detected?;
        released?;

        info!("Detected {} tables", tables.len());
        Ok(tables)
    }

    fn persist(&self, document: &[u8]) -> Result<NamedTempFile, PdfsenseError> {
        let prefix = format!("{TABLE_ARTIFACT_PREFIX}{}-", Uuid::new_v4());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".pdf");

        let mut artifact = match self.scratch_dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context(ArtifactSnafu { stage: "create" })?;

        artifact
            .write_all(document)
            .and_then(|_| artifact.flush())
            .context(ArtifactSnafu { stage: "write" })?;

        Ok(artifact)
    }
}
