//! Common error type used throughout mediasort.
//!
//! Every crate in the workspace funnels its failures into [`Error`], which
//! carries enough context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Common error type for mediasort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "batch", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Access to the resource is not allowed (e.g. path outside the root).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with itself or with stored state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A byte range could not be satisfied against the resource length.
    #[error("Range not satisfiable: {reason}")]
    RangeNotSatisfiable {
        /// Why the range was rejected.
        reason: String,
    },

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An external tool (ffmpeg) could not be started or failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Forbidden(_) => 403,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::RangeNotSatisfiable { .. } => 416,
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::Tool { .. } => 502,
            Error::Configuration(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Validation(_) => "validation_error",
            Error::Conflict(_) => "conflict",
            Error::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Tool { .. } => "tool_error",
            Error::Configuration(_) => "configuration_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Forbidden error.
    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a new RangeNotSatisfiable error.
    pub fn range<S: Into<String>>(reason: S) -> Self {
        Self::RangeNotSatisfiable {
            reason: reason.into(),
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new Configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("batch", "abc-123");
        assert_eq!(err.to_string(), "batch not found: abc-123");

        let err = Error::forbidden("outside root");
        assert_eq!(err.to_string(), "Forbidden: outside root");

        let err = Error::range("start after end");
        assert_eq!(err.to_string(), "Range not satisfiable: start after end");

        let err = Error::tool("ffmpeg", "spawn failed");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: spawn failed");

        let err = Error::configuration("library.input_path is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: library.input_path is required"
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::not_found("batch", "x").http_status(), 404);
        assert_eq!(Error::forbidden("x").http_status(), 403);
        assert_eq!(Error::validation("x").http_status(), 400);
        assert_eq!(Error::Conflict("x".into()).http_status(), 409);
        assert_eq!(Error::range("x").http_status(), 416);
        assert_eq!(Error::database("x").http_status(), 500);
        assert_eq!(Error::tool("ffmpeg", "x").http_status(), 502);
        assert_eq!(Error::internal("x").http_status(), 500);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.code(), "io_error");
    }
}
