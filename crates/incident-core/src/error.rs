//! Error types for the incident client

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fallback message when a create request fails without any detail
pub const CREATE_FALLBACK_MESSAGE: &str = "Error creating incident.";

/// Fallback message when a list request fails without any detail
pub const LIST_FALLBACK_MESSAGE: &str = "Could not load incidents.";

#[derive(Debug, Error)]
pub enum IncidentError {
    // Server responses
    /// Non-2xx answer to a create request. `message` is the response body,
    /// or a status line when the body was empty.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Failed: {status}")]
    ListUnavailable { status: u16 },

    // Transport errors
    #[error("{0}")]
    Transport(String),

    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    // Submission errors
    #[error("Cannot encode submission: {field} is missing")]
    Incomplete { field: String },

    #[error("Unknown incident type: {0}")]
    UnknownIncidentType(String),

    #[error("Cannot read image {path}: {reason}")]
    ImageUnreadable { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl IncidentError {
    /// Build the error for a rejected create request.
    ///
    /// The body is surfaced verbatim; an empty body falls back to the status.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("Request failed with status {}", status)
        } else {
            body
        };
        IncidentError::Rejected { status, message }
    }

    /// Message shown to the user, falling back to `fallback` when the error
    /// carries no text of its own.
    pub fn user_message(&self, fallback: &str) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            fallback.to_string()
        } else {
            text
        }
    }
}

impl From<serde_json::Error> for IncidentError {
    fn from(err: serde_json::Error) -> Self {
        IncidentError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IncidentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_uses_body_verbatim() {
        let err = IncidentError::rejected(500, "server error");
        assert_eq!(err.to_string(), "server error");
    }

    #[test]
    fn test_rejected_with_empty_body_reports_status() {
        let err = IncidentError::rejected(500, "");
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_user_message_fallback() {
        let err = IncidentError::Transport(String::new());
        assert_eq!(err.user_message(CREATE_FALLBACK_MESSAGE), "Error creating incident.");

        let err = IncidentError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(CREATE_FALLBACK_MESSAGE), "connection refused");
    }

    #[test]
    fn test_timeout_message() {
        let err = IncidentError::Timeout { after: Duration::from_secs(30) };
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_list_unavailable_message() {
        let err = IncidentError::ListUnavailable { status: 503 };
        assert_eq!(err.user_message(LIST_FALLBACK_MESSAGE), "Failed: 503");
    }
}
