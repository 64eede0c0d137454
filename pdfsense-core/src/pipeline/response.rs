use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::*;

use crate::{error::PdfsenseError, pipeline::report::AnalysisReport};

/// Body returned for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Transport-neutral response: an HTTP-like status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub status_code: u16,
    pub body: Value,
}

impl AnalysisResponse {
    pub fn success(report: &AnalysisReport) -> Self {
        match serde_json::to_value(report) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => {
                error!("Serialize report error: {}", e);
                Self::error_body(500, e.to_string())
            }
        }
    }

    pub fn failure(err: &PdfsenseError) -> Self {
        Self::error_body(err.status_code(), err.to_string())
    }

    fn error_body(status_code: u16, error: String) -> Self {
        Self {
            status_code,
            body: serde_json::json!({ "error": error }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body() -> Result<(), Box<dyn std::error::Error>> {
        let err = PdfsenseError::InvalidExtension {
            filename: "report.docx".to_string(),
            expected: ".pdf".to_string(),
        };
        let response = AnalysisResponse::failure(&err);

        assert_eq!(response.status_code, 400);
        assert!(!response.is_success());
        let body: ErrorBody = serde_json::from_value(response.body)?;
        assert!(body.error.starts_with("Invalid file type"));
        Ok(())
    }

    #[test]
    fn test_capability_failure_is_server_error() {
        let err = PdfsenseError::Capability {
            capability: "ocr".to_string(),
            message: "engine crashed".to_string(),
        };
        assert_eq!(AnalysisResponse::failure(&err).status_code, 500);
    }
}
