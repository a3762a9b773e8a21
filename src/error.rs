//! Error types for ocx-schema
//!
//! This module defines all error types used throughout the library.
//! Resolution misses (an unknown prefix, a tag absent from the index) are not
//! errors: lookups return `None` for those. The variants below cover the
//! structural failures that stop a document or an element from being processed.

use std::fmt;
use thiserror::Error;

/// Result type alias using the ocx-schema Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ocx-schema operations
#[derive(Error, Debug)]
pub enum Error {
    /// Schema document parsing error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Resource loading error (document not found, unreadable, not allowed)
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (malformed qualified name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// A supertype chain or attribute group nesting loops back on itself
    #[error("cycle detected: {0}")]
    Cycle(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Remote fetch error
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Schema document parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema file, `uri:line` when the line is known
    pub location: Option<String>,
    /// Schema source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("Expected xs:schema root element, got foo")
            .with_location("OCX_Schema.xsd:42")
            .with_source("<foo/>");

        let msg = format!("{}", err);
        assert!(msg.contains("Expected xs:schema root element"));
        assert!(msg.contains("Location: OCX_Schema.xsd:42"));
        assert!(msg.contains("Source:"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ParseError::new("test").into();
        assert!(matches!(err, Error::Parse(_)));

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::Cycle("{urn:a}A -> {urn:a}B -> {urn:a}A".to_string());
        assert_eq!(
            err.to_string(),
            "cycle detected: {urn:a}A -> {urn:a}B -> {urn:a}A"
        );
    }
}
