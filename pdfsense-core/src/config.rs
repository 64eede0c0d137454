use std::{path::PathBuf, str::FromStr, time::Duration};

use derive_builder::Builder;
use tracing::*;

use crate::{consts::*, error::PdfsenseError};

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct AnalyzerConfig {
    /// Extension an upload must end with, matched case-sensitively
    #[builder(setter(into))]
    pub required_extension: String,
    /// Largest accepted document in bytes, `None` disables the check
    pub max_document_bytes: Option<usize>,
    /// Resolution of the page images handed to OCR
    pub raster_dpi: u16,
    /// Characters of normalized text handed to the entity tagger
    pub entity_char_limit: usize,
    /// Deadline applied to each external capability call
    pub capability_timeout: Duration,
    /// Deadline applied to the whole request
    pub request_timeout: Duration,
    /// Segment sections on the extracted lines instead of the normalized text
    pub segment_raw_text: bool,
    /// Directory holding transient artifacts, `None` means the OS temp dir
    #[builder(setter(into, strip_option))]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            required_extension: REQUIRED_EXTENSION.to_string(),
            max_document_bytes: Some(DEFAULT_MAX_DOCUMENT_BYTES),
            raster_dpi: DEFAULT_RASTER_DPI,
            entity_char_limit: DEFAULT_ENTITY_CHAR_LIMIT,
            capability_timeout: DEFAULT_CAPABILITY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            segment_raw_text: false,
            scratch_dir: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }

    /// Defaults overlaid with any `PDFSENSE_*` variables present in the environment.
    pub fn from_env() -> Result<Self, PdfsenseError> {
        let mut config = Self::default();

        if let Some(limit) = env_value::<usize>(MAX_DOCUMENT_BYTES_ENV_NAME)? {
            config.max_document_bytes = (limit > 0).then_some(limit);
        }
        if let Some(dpi) = env_value(RASTER_DPI_ENV_NAME)? {
            config.raster_dpi = dpi;
        }
        if let Some(limit) = env_value(ENTITY_CHAR_LIMIT_ENV_NAME)? {
            config.entity_char_limit = limit;
        }
        if let Some(secs) = env_value(CAPABILITY_TIMEOUT_ENV_NAME)? {
            config.capability_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_value(REQUEST_TIMEOUT_ENV_NAME)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = env_value(SEGMENT_RAW_TEXT_ENV_NAME)? {
            config.segment_raw_text = raw;
        }
        if let Ok(dir) = std::env::var(SCRATCH_DIR_ENV_NAME) {
            config.scratch_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PdfsenseError> {
        let message = if self.required_extension.is_empty() {
            "required extension is empty"
        } else if self.raster_dpi == 0 {
            "raster dpi must be positive"
        } else if self.entity_char_limit == 0 {
            "entity char limit must be positive"
        } else if self.capability_timeout.is_zero() || self.request_timeout.is_zero() {
            "timeouts must be non-zero"
        } else {
            return Ok(());
        };

        Err(PdfsenseError::InvalidConfig {
            message: message.to_string(),
        })
    }
}

fn env_value<T: FromStr>(name: &str) -> Result<Option<T>, PdfsenseError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };

    debug!("Overriding config from `{}`", name);
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| PdfsenseError::InvalidEnv {
            name: name.to_string(),
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_config_default() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.required_extension, ".pdf");
        assert_eq!(config.raster_dpi, 200);
        assert_eq!(config.entity_char_limit, 4000);
        assert_eq!(config.max_document_bytes, Some(10 * 1024 * 1024));
        assert!(!config.segment_raw_text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_keeps_defaults_for_unset_fields() -> Result<(), Box<dyn std::error::Error>> {
        let config = AnalyzerConfig::builder()
            .entity_char_limit(128usize)
            .scratch_dir("/tmp/pdfsense")
            .build()?;

        assert_eq!(config.entity_char_limit, 128);
        assert_eq!(config.raster_dpi, DEFAULT_RASTER_DPI);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/tmp/pdfsense")));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = AnalyzerConfig {
            entity_char_limit: 0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PdfsenseError::InvalidConfig { .. })
        ));

        let config = AnalyzerConfig {
            capability_timeout: Duration::ZERO,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
