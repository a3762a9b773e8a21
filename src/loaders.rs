//! Resource loading utilities
//!
//! This module handles fetching schema documents from the local filesystem
//! or the network. Remote documents can be persisted to a cache folder under
//! their original file name.

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use crate::schema::parsing::schema_references;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of raw schema document bytes.
///
/// Fetching is synchronous; a missing document is an `Err`.
pub trait Fetch {
    /// Fetch the raw bytes of the document at `location`
    fn fetch(&self, location: &Location) -> Result<Vec<u8>>;
}

/// Resource loader for schema documents
#[derive(Debug)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Whether to allow remote resources
    allow_remote: bool,
    /// Folder where downloaded documents are written
    cache_folder: Option<PathBuf>,
    /// Downloaded documents keyed by URI
    fetched: RefCell<HashMap<String, Vec<u8>>>,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: true,
            cache_folder: None,
            fetched: RefCell::new(HashMap::new()),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether to allow remote resources
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Persist downloaded documents to `folder`
    pub fn with_cache_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_folder = Some(folder.into());
        self
    }

    /// The cache folder, if any
    pub fn cache_folder(&self) -> Option<&Path> {
        self.cache_folder.as_deref()
    }

    /// URIs downloaded so far
    pub fn downloaded(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.fetched.borrow().keys().cloned().collect();
        uris.sort();
        uris
    }

    /// Fetch `root` and every schema it imports or includes, transitively.
    ///
    /// Remote documents land in the cache folder when one is set. Returns
    /// the URIs of the downloaded documents.
    pub fn download_all(&self, root: &Location) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(location) = queue.pop_front() {
            if !seen.insert(location.key()) {
                continue;
            }
            self.limits.check_documents(seen.len())?;

            let content = self.fetch(&location)?;
            let document = Document::parse(&content, location.as_str())?;
            for reference in schema_references(document.root()) {
                match location.join(&reference.location) {
                    Ok(next) => queue.push_back(next),
                    Err(e) => tracing::warn!(
                        "Skipping schemaLocation \"{}\" in {}: {}",
                        reference.location,
                        location,
                        e
                    ),
                }
            }
        }

        Ok(self.downloaded())
    }

    fn load_file(&self, path: &Path) -> Result<Vec<u8>> {
        let content = fs::read(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;

        self.limits.check_document_size(content.len())?;

        Ok(content)
    }

    fn load_remote(&self, location: &Location) -> Result<Vec<u8>> {
        if !self.allow_remote {
            return Err(Error::Resource(format!(
                "Remote resources are not allowed: {}",
                location
            )));
        }

        let uri = location.as_str();
        if let Some(content) = self.fetched.borrow().get(&uri) {
            tracing::debug!("Using previously downloaded {}", uri);
            return Ok(content.clone());
        }

        let content = self.download(location)?;
        self.limits.check_document_size(content.len())?;
        self.persist(location, &content)?;
        self.fetched.borrow_mut().insert(uri, content.clone());
        Ok(content)
    }

    #[cfg(feature = "remote")]
    fn download(&self, location: &Location) -> Result<Vec<u8>> {
        let uri = location.as_str();
        let response = reqwest::blocking::get(uri.as_str())?.error_for_status()?;
        let bytes = response.bytes()?;
        tracing::debug!("Downloaded {} ({} bytes)", uri, bytes.len());
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "remote"))]
    fn download(&self, location: &Location) -> Result<Vec<u8>> {
        Err(Error::Resource(format!(
            "Remote loading requires the `remote` feature: {}",
            location
        )))
    }

    fn persist(&self, location: &Location, content: &[u8]) -> Result<()> {
        let Some(folder) = &self.cache_folder else {
            return Ok(());
        };
        let name = location.file_name().ok_or_else(|| {
            Error::Resource(format!("Cannot derive a file name from {}", location))
        })?;
        fs::create_dir_all(folder)?;
        let file = folder.join(name);
        fs::write(&file, content)?;
        tracing::debug!(
            "Saved remote schema \"{}\" to \"{}\"",
            location,
            file.display()
        );
        Ok(())
    }
}

impl Fetch for Loader {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        match location {
            Location::Path(path) => self.load_file(path),
            Location::Url(_) => self.load_remote(location),
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
