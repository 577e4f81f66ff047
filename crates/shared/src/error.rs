use serde::{Deserialize, Serialize};
use thiserror::Error;

const GENERIC_UPSTREAM_MESSAGE: &str = "unexpected response from server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidConfiguration,
    Unauthenticated,
    Upstream,
    MalformedResponse,
}

/// Error body returned by the backend on non-2xx responses.
///
/// Both fields are optional; the backend is not consistent about which one
/// it fills in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(message.into()),
        }
    }

    /// `error` wins over `message`; blank strings count as absent.
    pub fn best_message(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("not signed in: no bearer token available")]
    Unauthenticated,
    #[error("upstream failure{}: {message}", status_suffix(.status))]
    UpstreamFailure {
        status: Option<u16>,
        message: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl DashboardError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::UpstreamFailure { .. } => ErrorCode::Upstream,
            Self::MalformedResponse(_) => ErrorCode::MalformedResponse,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// Short text suitable for an inline error line.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfiguration(message) => message.clone(),
            Self::Unauthenticated => "Please sign in again to continue.".to_string(),
            Self::UpstreamFailure { message, .. } => message.clone(),
            Self::MalformedResponse(_) => GENERIC_UPSTREAM_MESSAGE.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (status {status})"))
        .unwrap_or_default()
}

/// Pick the most useful message out of a non-2xx response body.
pub fn upstream_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiError>(body) {
        if let Some(message) = parsed.best_message() {
            return message.to_string();
        }
    }

    let raw = body.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    format!("request failed with status {status}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_message() {
        let body = r#"{"error": "validation failed", "message": "ignored"}"#;
        assert_eq!(upstream_message(422, body), "validation failed");
    }

    #[test]
    fn blank_error_falls_through_to_message() {
        let body = r#"{"error": "  ", "message": "deal not found"}"#;
        assert_eq!(upstream_message(404, body), "deal not found");
    }

    #[test]
    fn raw_text_then_status_fallback() {
        assert_eq!(upstream_message(502, "  bad gateway \n"), "bad gateway");
        assert_eq!(upstream_message(503, ""), "request failed with status 503");
    }

    #[test]
    fn display_includes_status_when_known() {
        assert_eq!(
            DashboardError::upstream(Some(500), "boom").to_string(),
            "upstream failure (status 500): boom"
        );
        assert_eq!(
            DashboardError::upstream(None, "connection refused").to_string(),
            "upstream failure: connection refused"
        );
        assert_eq!(DashboardError::Unauthenticated.code(), ErrorCode::Unauthenticated);
    }
}
