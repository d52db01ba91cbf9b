pub mod report_service;

pub use report_service::ReportService;

use thiserror::Error;

/// Failure talking to the prediction backend
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response; `body` is the server's text
    #[error("{}", status_text(.body))]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cannot resolve '{0}' without an API base URL")]
    InvalidUrl(String),
}

fn status_text(body: &str) -> &str {
    if body.trim().is_empty() {
        "Request failed"
    } else {
        body
    }
}

impl ServiceError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Single line shown to the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_uses_body_or_fallback() {
        assert_eq!(ServiceError::status(422, "bad csv").to_string(), "bad csv");
        assert_eq!(ServiceError::status(500, "  ").to_string(), "Request failed");
    }
}
