//! Client error types

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    AuthExpired,
    InvalidResponse,
    Configuration,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received
    #[error("Request failed: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("Server error {status}: {message}")]
    Http { status: u16, message: String },

    /// Refresh was unavailable or failed; the caller has to log in again
    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    /// A 2xx body that is not the expected JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::AuthExpired(_) => ErrorKind::AuthExpired,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        let message = if message.trim().is_empty() {
            status.to_string()
        } else {
            message.trim().to_string()
        };
        Self::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::Configuration(error.to_string())
        } else if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}

/// Failure of the token refresh exchange.
///
/// Cloneable so every caller attached to one in-flight refresh gets the
/// same outcome.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token stored")]
    NoRefreshToken,
    #[error("refresh rejected with status {0}")]
    Rejected(u16),
    #[error("refresh request failed: {0}")]
    Network(String),
    #[error("refresh timed out")]
    Timeout,
    #[error("refresh response unreadable: {0}")]
    InvalidResponse(String),
    #[error("session ended while refreshing")]
    Superseded,
    #[error("refresh task failed: {0}")]
    Aborted(String),
}

impl From<RefreshError> for ApiError {
    fn from(error: RefreshError) -> Self {
        Self::AuthExpired(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_status() {
        let error = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "  no such url \n".into());
        assert_eq!(error.kind(), ErrorKind::Http);
        assert_eq!(error.status(), Some(404));
        assert_eq!(error.to_string(), "Server error 404: no such url");
    }

    #[test]
    fn empty_message_falls_back_to_reason() {
        let error = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, String::new());
        assert_eq!(error.to_string(), "Server error 502: 502 Bad Gateway");
    }

    #[test]
    fn refresh_failures_become_auth_expired() {
        let error = ApiError::from(RefreshError::Rejected(500));
        assert_eq!(error.kind(), ErrorKind::AuthExpired);
        assert_eq!(error.status(), None);

        let error = ApiError::from(RefreshError::Superseded);
        assert_eq!(error.kind(), ErrorKind::AuthExpired);
    }
}
