//! Resource location resolution
//!
//! This module handles resolution of schema locations (URLs and file paths),
//! including `schemaLocation` references relative to the referencing document.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Resource location - a URL or a file path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, ...)
    Url(Url),
}

impl Location {
    /// Create a location from a string (auto-detect type).
    ///
    /// `file://` URLs become paths.
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            if url.scheme() == "file" {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::Resource(format!("Invalid file URL: {}", s)))?;
                return Ok(Location::Path(path));
            }
            // A single letter scheme is a Windows drive, not a URL
            if url.scheme().len() > 1 {
                return Ok(Location::Url(url));
            }
        }
        if s.is_empty() {
            return Err(Error::Resource("Empty schema location".to_string()));
        }
        Ok(Location::Path(PathBuf::from(s)))
    }

    /// Resolve a `schemaLocation` reference against this location
    pub fn join(&self, reference: &str) -> Result<Location> {
        if let Ok(Location::Url(url)) = Location::parse(reference) {
            return Ok(Location::Url(url));
        }
        match self {
            Location::Url(base) => Ok(Location::Url(base.join(reference)?)),
            Location::Path(base) => {
                let reference = match Location::parse(reference)? {
                    Location::Path(p) => p,
                    Location::Url(u) => return Ok(Location::Url(u)),
                };
                if reference.is_absolute() {
                    return Ok(Location::Path(reference));
                }
                let parent = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(Location::Path(parent.join(reference)))
            }
        }
    }

    /// The last path segment, used as the cache file name
    pub fn file_name(&self) -> Option<String> {
        match self {
            Location::Path(p) => p.file_name().map(|n| n.to_string_lossy().to_string()),
            Location::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string()),
        }
    }

    /// Key used to detect a document that was already ingested.
    ///
    /// Paths are canonicalized when they exist so that different relative
    /// spellings of one file compare equal.
    pub fn key(&self) -> String {
        match self {
            Location::Path(p) => p
                .canonicalize()
                .unwrap_or_else(|_| p.clone())
                .to_string_lossy()
                .to_string(),
            Location::Url(u) => u.to_string(),
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Location::parse(s)
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Path(path)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::Path(path.to_path_buf())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::parse("https://3docx.org/fileadmin/ocx_schema/V286/OCX_Schema.xsd").unwrap();
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
        assert_eq!(loc.file_name().as_deref(), Some("OCX_Schema.xsd"));
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::parse("/tmp/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());

        let loc = Location::parse("schema_versions/OCX_Schema.xsd").unwrap();
        assert!(loc.is_file());
    }

    #[test]
    fn test_file_url_becomes_path() {
        let loc = Location::parse("file:///tmp/OCX_Schema.xsd").unwrap();
        assert_eq!(loc, Location::Path(PathBuf::from("/tmp/OCX_Schema.xsd")));
    }

    #[test]
    fn test_join_relative_url() {
        let base = Location::parse("https://3docx.org/fileadmin/ocx_schema/V286/OCX_Schema.xsd").unwrap();
        let joined = base.join("unitsmlSchema_lite-0.9.18.xsd").unwrap();
        assert_eq!(
            joined.as_str(),
            "https://3docx.org/fileadmin/ocx_schema/V286/unitsmlSchema_lite-0.9.18.xsd"
        );
    }

    #[test]
    fn test_join_relative_path() {
        let base = Location::Path(PathBuf::from("/schemas/ocx/OCX_Schema.xsd"));
        let joined = base.join("common/units.xsd").unwrap();
        assert_eq!(joined, Location::Path(PathBuf::from("/schemas/ocx/common/units.xsd")));

        let joined = base.join("https://example.com/other.xsd").unwrap();
        assert!(joined.is_remote());
    }

    #[test]
    fn test_empty_location() {
        assert!(Location::parse("").is_err());
    }
}
