//! Typed error hierarchy for the restyle client.
//!
//! Three top-level enums cover the three subsystems:
//! - `ApiError` — HTTP transport, status, and decode failures
//! - `PipelineError` — which step of the edit pipeline aborted
//! - `StreamError` — status-stream discovery and connection failures

use thiserror::Error;

/// Errors from a single HTTP call to the design API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// The request path this error originated from, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ApiError::Transport { path, .. }
            | ApiError::Status { path, .. }
            | ApiError::Decode { path, .. } => Some(path),
            ApiError::ReadFile { .. } => None,
        }
    }
}

/// Errors from the edit pipeline. Each variant names the step that aborted
/// the run; the knowledge step is best-effort and never surfaces here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("scene analysis failed: {0}")]
    Analyze(#[source] ApiError),

    #[error("edit planning failed: {0}")]
    Plan(#[source] ApiError),

    #[error("image edit failed: {0}")]
    Inpaint(#[source] ApiError),
}

/// Errors from the status-stream subsystem.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("endpoint discovery failed: {0}")]
    Discovery(#[source] ApiError),

    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("status stream protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_status_carries_path_and_body() {
        let err = ApiError::Status {
            path: "/api/v1/plan-edits".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.path(), Some("/api/v1/plan-edits"));
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn read_file_error_has_no_request_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ApiError::ReadFile {
            path: std::path::PathBuf::from("/tmp/room.jpg"),
            source: io_err,
        };
        assert_eq!(err.path(), None);
        assert!(err.to_string().contains("room.jpg"));
    }

    #[test]
    fn pipeline_error_names_failed_step() {
        let inner = ApiError::Status {
            path: "/api/v1/plan-edits".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        let err = PipelineError::Plan(inner);
        assert!(err.to_string().starts_with("edit planning failed"));
        assert!(matches!(err, PipelineError::Plan(_)));
    }

    #[test]
    fn stream_error_discovery_wraps_the_api_failure() {
        let inner = ApiError::Status {
            path: "/api/v1/system/ws-url".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        };
        let err = StreamError::Discovery(inner);
        assert!(err.to_string().starts_with("endpoint discovery failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stream_error_connect_is_matchable() {
        let err = StreamError::Connect {
            url: "ws://localhost:8000/ws/client-1".to_string(),
            message: "refused".to_string(),
        };
        assert!(matches!(err, StreamError::Connect { .. }));
        assert!(err.to_string().contains("client-1"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        let api_err = ApiError::Status {
            path: "/x".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_std_error(&api_err);
        let stream_err = StreamError::Protocol("bad frame".to_string());
        assert_std_error(&stream_err);
    }
}
