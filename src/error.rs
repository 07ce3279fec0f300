use thiserror::Error;

/// Failures raised by the catalog gateway.
///
/// The discovery engine and the detail loader never let these escape; they
/// store the `Display` form in their `error` field instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The transport itself failed (DNS, TLS, connection reset, timeout).
    #[error("Network error while fetching {path}: {message}")]
    Network { path: String, message: String },

    /// The catalog answered with a non-2xx status.
    #[error("Failed to fetch {path} ({status})")]
    FetchFailed { path: String, status: u16 },

    /// The body was not JSON, or not the shape the endpoint promises.
    #[error("Malformed response from {path}: {message}")]
    Parse { path: String, message: String },

    /// Base URL and path did not combine into a valid URL.
    #[error("Invalid request URL for {path}: {message}")]
    InvalidUrl { path: String, message: String },
}

impl ApiError {
    pub fn path(&self) -> &str {
        match self {
            ApiError::Network { path, .. }
            | ApiError::FetchFailed { path, .. }
            | ApiError::Parse { path, .. }
            | ApiError::InvalidUrl { path, .. } => path,
        }
    }

    pub(crate) fn parse(path: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Parse { path: path.to_string(), message: err.to_string() }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Message stored in an `error` field: the error's text, or `fallback` when that is empty.
pub(crate) fn message_or(err: &ApiError, fallback: &str) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        fallback.to_string()
    } else {
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_message_names_path_and_status() {
        let err = ApiError::FetchFailed { path: "/discover/movie".into(), status: 401 };
        assert_eq!(err.to_string(), "Failed to fetch /discover/movie (401)");
        assert_eq!(err.path(), "/discover/movie");
    }

    #[test]
    fn message_or_keeps_non_empty_text() {
        let err = ApiError::Network { path: "/x".into(), message: "reset".into() };
        assert!(message_or(&err, "Unknown error").contains("reset"));
    }
}
