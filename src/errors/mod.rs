//! # Error Handling
//!
//! Error types for the Campanile backend using `thiserror`.
//!
//! The taxonomy mirrors what callers can observe over HTTP: validation
//! failures, missing rows, storage failures, and the best-effort external
//! config mirror. `ExternalSync` is special: settings writes log it and keep
//! going instead of failing the request.

use std::fmt;

/// Custom result type for Campanile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Campanile backend
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Resource not found errors
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Resource conflict errors (e.g., already exists)
    #[error("Resource conflict: {message}")]
    Conflict { message: String, resource_type: String },

    /// Failure writing to the external config mirror. Non-fatal by contract:
    /// callers log this and keep the database write.
    #[error("External config sync failed: {message}")]
    ExternalSync { message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error tied to a specific field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new not-found error
    pub fn not_found<R: Into<String>, I: fmt::Display>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.to_string() }
    }

    /// Create a new conflict error
    pub fn conflict<M: Into<String>, R: Into<String>>(message: M, resource_type: R) -> Self {
        Self::Conflict { message: message.into(), resource_type: resource_type.into() }
    }

    /// Create a new external-sync error
    pub fn external_sync<S: Into<String>>(message: S) -> Self {
        Self::ExternalSync { message: message.into() }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Wrap a sqlx error with query context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 422,
            Error::NotFound { .. } => 404,
            Error::Conflict { .. } => 409,
            Error::Config { .. }
            | Error::Database { .. }
            | Error::Io { .. }
            | Error::Serialization { .. }
            | Error::ExternalSync { .. }
            | Error::Internal { .. } => 500,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization { source, context: "JSON serialization failed".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("Country", 5);
        assert_eq!(err.to_string(), "Resource not found: Country with ID '5'");

        let err = Error::validation("name is required");
        assert_eq!(err.to_string(), "Validation error: name is required");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("test").status_code(), 422);
        assert_eq!(Error::not_found("Country", "test").status_code(), 404);
        assert_eq!(Error::conflict("test", "Country").status_code(), 409);
        assert_eq!(Error::internal("test").status_code(), 500);
        assert_eq!(Error::external_sync("test").status_code(), 500);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_error.into();
        assert!(matches!(err, Error::Io { .. }));

        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_error.into();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn test_validation_field() {
        let err = Error::validation_field("must be two letters", "iso2");
        match err {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("iso2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
