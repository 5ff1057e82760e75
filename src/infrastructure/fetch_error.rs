//! Error types for the card and image data sources
//!
//! Every strategy reports failures through [`FetchError`]; the orchestrators
//! log them and fall through to the next source.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP request failed: {message}")]
    Transport { message: String, url: String },

    #[error("Request timed out after {seconds}s: {url}")]
    Timeout { seconds: u64, url: String },

    #[error("HTTP error {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    #[error("Source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Browser session failed: {message}")]
    Browser { message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl FetchError {
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
            url: url.to_string(),
        }
    }

    /// Map a reqwest error onto the taxonomy, keeping timeouts apart.
    pub fn from_reqwest(url: &str, err: &reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                seconds: timeout_seconds,
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::from_status(url, status.as_u16())
        } else {
            Self::transport(url, err)
        }
    }

    pub fn from_status(url: &str, status: u16) -> Self {
        if status == 404 {
            Self::NotFound {
                url: url.to_string(),
            }
        } else {
            Self::HttpStatus {
                status,
                url: url.to_string(),
            }
        }
    }

    pub fn parse(what: &str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.to_string(),
            message: err.to_string(),
        }
    }

    pub fn invalid_structure(reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser {
            message: err.to_string(),
        }
    }

    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether a retry of the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::NotFound { .. }
            | Self::Parse { .. }
            | Self::InvalidStructure { .. }
            | Self::Unavailable { .. }
            | Self::Browser { .. }
            | Self::Io { .. } => false,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(FetchError::from_status("u", 404), FetchError::NotFound { .. }));
        assert!(matches!(
            FetchError::from_status("u", 503),
            FetchError::HttpStatus { status: 503, .. }
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::from_status("u", 429).is_retryable());
        assert!(FetchError::from_status("u", 502).is_retryable());
        assert!(!FetchError::from_status("u", 403).is_retryable());
        assert!(!FetchError::from_status("u", 404).is_retryable());
        assert!(FetchError::transport("u", "connection reset").is_retryable());
        assert!(!FetchError::invalid_structure("missing images").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = FetchError::HttpStatus {
            status: 500,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 500: https://example.com");
    }
}
