use std::time::Duration;

use snafu::prelude::*;

/// Failure categories surfaced to callers.
///
/// Every [`PdfsenseError`] belongs to exactly one kind. None of them is
/// retried: each capability call is attempted once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upload itself is unacceptable (wrong type, too large).
    Validation,
    /// The document is not a well-formed PDF.
    Parse,
    /// An external engine (OCR, NLP, language id, table detection) failed or timed out.
    Capability,
    /// A transient artifact or a local resource could not be acquired or released.
    Resource,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PdfsenseError {
    #[snafu(display("Invalid file type: `{}` does not end with `{}`", filename, expected))]
    InvalidExtension { filename: String, expected: String },
    #[snafu(display("Document `{}` is {} bytes, limit is {}", filename, size, limit))]
    DocumentTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },
    #[snafu(display("Malformed pdf: {}", source))]
    MalformedPdf {
        source: pdfium_render::prelude::PdfiumError,
    },
    #[snafu(display("Pdfium `{}` error {}", stage, source))]
    Pdfium {
        source: pdfium_render::prelude::PdfiumError,
        stage: String,
    },
    #[snafu(display("Ort Session init stage `{}` error: {}", stage, source))]
    OrtInit {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Build Tensor for `{}` error: {}", stage, source))]
    Tensor {
        source: ort::error::Error,
        stage: String,
    },
    #[snafu(display("Onnx Inference error: {}", source))]
    Inference { source: ort::error::Error },
    #[snafu(display("Onnx Output can not found {}", output_name))]
    NotFoundOutput { output_name: String },
    #[snafu(display("Ndarray Shape error at stage `{}`: {}", stage, source))]
    Shape {
        source: ndarray::ShapeError,
        stage: String,
    },
    #[snafu(display("Compile pattern for `{}` error: {}", stage, source))]
    Pattern {
        source: regex::Error,
        stage: String,
    },
    #[snafu(display("Capability `{}` failed: {}", capability, message))]
    Capability {
        capability: String,
        message: String,
    },
    #[snafu(display("Capability `{}` exceeded its {:?} deadline", capability, timeout))]
    CapabilityTimeout {
        capability: String,
        timeout: Duration,
    },
    #[snafu(display("Capability `{}` task aborted: {}", capability, source))]
    Join {
        source: tokio::task::JoinError,
        capability: String,
    },
    #[snafu(display("Analysis exceeded its {:?} request deadline", timeout))]
    RequestTimeout { timeout: Duration },
    #[snafu(display("Transient artifact `{}` error: {}", stage, source))]
    Artifact {
        source: std::io::Error,
        stage: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Environment `{}` Not Found, error {}", name, source))]
    EnvNotFound {
        source: std::env::VarError,
        name: String,
    },
    #[snafu(display("Environment `{}` has invalid value `{}`", name, value))]
    InvalidEnv { name: String, value: String },
    #[snafu(display("Invalid analyzer config: {}", message))]
    InvalidConfig { message: String },
}

impl PdfsenseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfsenseError::InvalidExtension { .. } | PdfsenseError::DocumentTooLarge { .. } => {
                ErrorKind::Validation
            }
            PdfsenseError::MalformedPdf { .. } => ErrorKind::Parse,
            PdfsenseError::Pdfium { .. }
            | PdfsenseError::OrtInit { .. }
            | PdfsenseError::Tensor { .. }
            | PdfsenseError::Inference { .. }
            | PdfsenseError::NotFoundOutput { .. }
            | PdfsenseError::Shape { .. }
            | PdfsenseError::Pattern { .. }
            | PdfsenseError::Capability { .. }
            | PdfsenseError::CapabilityTimeout { .. }
            | PdfsenseError::Join { .. }
            | PdfsenseError::RequestTimeout { .. } => ErrorKind::Capability,
            PdfsenseError::Artifact { .. }
            | PdfsenseError::IoRead { .. }
            | PdfsenseError::IoWrite { .. }
            | PdfsenseError::EnvNotFound { .. }
            | PdfsenseError::InvalidEnv { .. }
            | PdfsenseError::InvalidConfig { .. } => ErrorKind::Resource,
        }
    }

    /// HTTP-style status the error maps to: user input defects are `400`,
    /// everything else is `500`.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = PdfsenseError::InvalidExtension {
            filename: "report.docx".to_string(),
            expected: ".pdf".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("report.docx"));
    }

    #[test]
    fn test_capability_and_resource_map_to_server_error() {
        let capability = PdfsenseError::Capability {
            capability: "ocr".to_string(),
            message: "engine crashed".to_string(),
        };
        assert_eq!(capability.kind(), ErrorKind::Capability);
        assert_eq!(capability.status_code(), 500);

        let resource = PdfsenseError::Artifact {
            source: std::io::Error::other("disk full"),
            stage: "create".to_string(),
        };
        assert_eq!(resource.kind(), ErrorKind::Resource);
        assert_eq!(resource.status_code(), 500);

        let timeout = PdfsenseError::CapabilityTimeout {
            capability: "tables".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(timeout.kind(), ErrorKind::Capability);
    }
}
