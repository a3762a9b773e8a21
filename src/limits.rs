//! Limits and constraints for schema processing
//!
//! This module defines limits that keep a single session from exhausting
//! resources on oversized documents or pathological schemas.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Resource limits for one schema session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum size of one schema document in bytes
    pub max_document_size: usize,

    /// Maximum number of documents reached through imports and includes
    pub max_documents: usize,

    /// Maximum length of a supertype chain
    pub max_ancestor_depth: usize,

    /// Maximum nesting depth of attribute group references
    pub max_group_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_size: 100 * 1024 * 1024, // 100 MB
            max_documents: 1000,
            max_ancestor_depth: 256,
            max_group_depth: 64,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_document_size: 10 * 1024 * 1024, // 10 MB
            max_documents: 50,
            max_ancestor_depth: 32,
            max_group_depth: 8,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_document_size: 1024 * 1024 * 1024, // 1 GB
            max_documents: 100_000,
            max_ancestor_depth: 4096,
            max_group_depth: 1024,
        }
    }

    /// Check if a document size is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::LimitExceeded(format!(
                "Document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of ingested documents is within limits
    pub fn check_documents(&self, count: usize) -> Result<()> {
        if count > self.max_documents {
            Err(Error::LimitExceeded(format!(
                "Document count {} exceeds maximum {}",
                count, self.max_documents
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a supertype chain length is within limits
    pub fn check_ancestor_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_ancestor_depth {
            Err(Error::LimitExceeded(format!(
                "Supertype chain length {} exceeds maximum {}",
                depth, self.max_ancestor_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an attribute group nesting depth is within limits
    pub fn check_group_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_group_depth {
            Err(Error::LimitExceeded(format!(
                "Attribute group nesting depth {} exceeds maximum {}",
                depth, self.max_group_depth
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_document_size(1024).is_ok());
        assert!(limits.check_document_size(200 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.check_documents(50).is_ok());
        assert!(limits.check_documents(51).is_err());
        assert!(limits.check_ancestor_depth(33).is_err());
    }

    #[test]
    fn test_limit_error_kind() {
        let err = Limits::strict().check_group_depth(9).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
        assert!(err.to_string().contains("nesting depth 9"));
    }
}
