//! Schema document ingestion
//!
//! A document is ingested by registering its namespace declarations,
//! reading its version and change annotations, registering every named
//! construct in the raw element index and recording substitution group
//! membership. Imported and included documents are then ingested from a
//! worklist; a location is only ingested once.

use std::collections::{HashSet, VecDeque};

use super::index::{ConstructKind, NodeHandle, SchemaIndex};
use super::model::SchemaChange;
use super::xsd_attrs;
use super::xsd_elements;
use crate::config::Config;
use crate::documents::{Document, NodeId, NodeRef};
use crate::error::{Error, ParseError, Result};
use crate::loaders::Fetch;
use crate::locations::Location;
use crate::names::split_qname;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use serde::Serialize;

/// An `xs:import` or `xs:include` of another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReference {
    /// The `schemaLocation` value
    pub location: String,
    /// The imported namespace (`xs:import` only)
    pub namespace: Option<String>,
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Where the document was read from
    pub uri: String,
    /// Index of the document in the schema index
    pub document: usize,
    /// Value of the `targetNamespace` attribute
    pub target_namespace: String,
    /// Fixed value of the `schemaVersion` attribute
    pub version: Option<String>,
    /// `SchemaChange` annotations of the document
    pub changes: Vec<SchemaChange>,
    /// `xs:import` and `xs:include` references
    pub references: Vec<SchemaReference>,
    /// Number of constructs added to the index
    pub registered: usize,
}

/// A referenced document that could not be ingested
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    /// Location of the document
    pub location: String,
    /// Why the document was skipped
    pub error: String,
}

/// Result of ingesting a document closure
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Ingested documents in ingestion order
    pub documents: Vec<DocumentInfo>,
    /// Referenced documents that failed
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// True if every referenced document was ingested
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Imports and includes declared by a schema root
pub fn schema_references(root: NodeRef<'_>) -> Vec<SchemaReference> {
    root.children()
        .filter(|c| matches!(c.local_name(), xsd_elements::IMPORT | xsd_elements::INCLUDE))
        .filter_map(|c| match c.attribute(xsd_attrs::SCHEMA_LOCATION) {
            Some(location) => Some(SchemaReference {
                location: location.to_string(),
                namespace: c.attribute(xsd_attrs::NAMESPACE).map(|s| s.to_string()),
            }),
            None => {
                tracing::debug!("{} at {} has no schemaLocation", c.local_name(), c.location());
                None
            }
        })
        .collect()
}

/// Fixed value of the `schemaVersion` attribute declaration
pub fn schema_version(root: NodeRef<'_>) -> Option<String> {
    root.descendants_named(xsd_elements::ATTRIBUTE)
        .find(|a| a.attribute(xsd_attrs::NAME) == Some("schemaVersion"))
        .and_then(|a| a.attribute(xsd_attrs::FIXED))
        .map(|v| v.to_string())
}

/// `SchemaChange` annotations in document order
pub fn schema_changes(root: NodeRef<'_>) -> Vec<SchemaChange> {
    root.descendants_named(xsd_elements::SCHEMA_CHANGE)
        .map(|change| SchemaChange {
            version: change.attribute(xsd_attrs::VERSION).map(|s| s.to_string()),
            author: change.attribute(xsd_attrs::AUTHOR).map(|s| s.to_string()),
            date: change.attribute(xsd_attrs::DATE).map(|s| s.to_string()),
            description: change
                .descendant_named(xsd_elements::DESCRIPTION)
                .map(|d| d.text())
                .unwrap_or_default(),
        })
        .collect()
}

fn has_enumeration(node: NodeRef<'_>) -> bool {
    node.descendant_named(xsd_elements::ENUMERATION).is_some()
}

struct Registration {
    kind: ConstructKind,
    name: String,
    node: NodeId,
    substitution_group: Option<String>,
    /// Direct child of `xs:schema`
    top_level: bool,
}

/// Named declarations of one kind, nested ones included
fn named_declarations(root: NodeRef<'_>, kind: &'static str) -> Vec<Registration> {
    root.descendants_named(kind)
        .filter_map(|node| {
            let name = node.attribute(xsd_attrs::NAME)?;
            let kind = match ConstructKind::parse(kind)? {
                ConstructKind::AttributeGroup if has_enumeration(node) => ConstructKind::Enumeration,
                other => other,
            };
            Some(Registration {
                kind,
                name: name.to_string(),
                node: node.id(),
                substitution_group: node
                    .attribute(xsd_attrs::SUBSTITUTION_GROUP)
                    .map(|s| s.to_string()),
                top_level: node.parent() == Some(root),
            })
        })
        .collect()
}

/// Global attribute declarations referenced from the same document
fn referenced_attributes(root: NodeRef<'_>) -> Vec<Registration> {
    let mut names: Vec<&str> = Vec::new();
    for reference in root
        .descendants_named(xsd_elements::ATTRIBUTE)
        .filter_map(|a| a.attribute(xsd_attrs::REF))
    {
        let (_, local) = split_qname(reference);
        if !names.contains(&local) {
            names.push(local);
        }
    }

    names
        .into_iter()
        .filter_map(|name| {
            let node = root
                .children_named(xsd_elements::ATTRIBUTE)
                .find(|a| a.attribute(xsd_attrs::NAME) == Some(name));
            if node.is_none() {
                tracing::debug!("Referenced attribute {} is not declared in {}", name, root.document().uri());
            }
            let node = node?;
            let kind = if has_enumeration(node) {
                ConstructKind::Enumeration
            } else {
                ConstructKind::Attribute
            };
            Some(Registration {
                kind,
                name: name.to_string(),
                node: node.id(),
                substitution_group: None,
                top_level: true,
            })
        })
        .collect()
}

/// Ingest one parsed document into the index.
///
/// The document's target namespace must be bound to a prefix once its own
/// declarations are merged into the registry; otherwise the document is
/// rejected with [`Error::Namespace`] before anything is registered.
pub fn ingest_document(index: &mut SchemaIndex, document: Document, config: &Config) -> Result<DocumentInfo> {
    let root = document.root();
    if root.local_name() != xsd_elements::SCHEMA || root.namespace() != Some(XSD_NAMESPACE) {
        return Err(Error::Parse(
            ParseError::new(format!("Expected xs:schema root element, got {}", root.qname()))
                .with_location(root.location()),
        ));
    }

    let added = index.registry_mut().register(
        root.namespace_declarations()
            .map(|(p, u)| (p.to_string(), u.to_string())),
    );
    tracing::debug!("Added {} new namespaces for schema \"{}\"", added, document.uri());

    let target_namespace = root
        .attribute(xsd_attrs::TARGET_NAMESPACE)
        .ok_or_else(|| {
            Error::Namespace(format!("The schema {} has no targetNamespace", document.uri()))
        })?
        .to_string();
    if !index.registry().contains_namespace(&target_namespace) {
        return Err(Error::Namespace(format!(
            "The target namespace \"{}\" of {} is not registered in the namespace listing",
            target_namespace,
            document.uri()
        )));
    }

    let uri = document.uri().to_string();
    let version = schema_version(root);
    let changes = schema_changes(root);
    let references = schema_references(root);

    let mut registrations = Vec::new();
    for kind in &config.process_types {
        match kind.as_str() {
            xsd_elements::ATTRIBUTE => registrations.extend(referenced_attributes(root)),
            xsd_elements::ELEMENT => registrations.extend(named_declarations(root, xsd_elements::ELEMENT)),
            xsd_elements::COMPLEX_TYPE => {
                registrations.extend(named_declarations(root, xsd_elements::COMPLEX_TYPE))
            }
            xsd_elements::SIMPLE_TYPE => {
                registrations.extend(named_declarations(root, xsd_elements::SIMPLE_TYPE))
            }
            xsd_elements::ATTRIBUTE_GROUP => {
                registrations.extend(named_declarations(root, xsd_elements::ATTRIBUTE_GROUP))
            }
            other => tracing::warn!("Skipping unknown schema construct kind {}", other),
        }
    }

    let document_index = index.add_document(document, target_namespace.clone());
    let mut registered = 0;
    for registration in registrations {
        let tag = QName::namespaced(target_namespace.as_str(), registration.name);
        let handle = NodeHandle {
            document: document_index,
            node: registration.node,
        };
        let added = if registration.top_level {
            index.insert(registration.kind, tag.clone(), handle)
        } else {
            index.insert_nested(registration.kind, tag.clone(), handle)
        };
        if !added {
            continue;
        }
        registered += 1;
        if let Some(head) = registration.substitution_group {
            index.substitution_groups_mut().add_member(head, tag);
        }
    }

    Ok(DocumentInfo {
        uri,
        document: document_index,
        target_namespace,
        version,
        changes,
        references,
        registered,
    })
}

struct PendingDocument {
    location: Location,
    content: Option<Vec<u8>>,
    /// Namespace named by the `xs:import` that referenced the document
    expected_namespace: Option<String>,
}

/// Ingests document closures into an index
pub struct Ingestor<'a> {
    fetcher: &'a dyn Fetch,
    config: &'a Config,
    visited: HashSet<String>,
    report: IngestReport,
}

impl<'a> Ingestor<'a> {
    /// Create an ingestor reading documents through `fetcher`
    pub fn new(fetcher: &'a dyn Fetch, config: &'a Config) -> Self {
        Self {
            fetcher,
            config,
            visited: HashSet::new(),
            report: IngestReport::default(),
        }
    }

    /// Fetch and ingest a root document and everything it references
    pub fn ingest(&mut self, index: &mut SchemaIndex, root: Location) -> Result<()> {
        self.run(index, root, None)
    }

    /// Ingest an in-memory root document and everything it references
    pub fn ingest_bytes(&mut self, index: &mut SchemaIndex, root: Location, content: Vec<u8>) -> Result<()> {
        self.run(index, root, Some(content))
    }

    /// The documents ingested and the failures seen so far
    pub fn into_report(self) -> IngestReport {
        self.report
    }

    fn load(&self, index: &mut SchemaIndex, pending: &mut PendingDocument) -> Result<DocumentInfo> {
        self.config.limits.check_documents(self.visited.len())?;
        let content = match pending.content.take() {
            Some(content) => content,
            None => self.fetcher.fetch(&pending.location)?,
        };
        let document = Document::parse(&content, pending.location.as_str())?;
        ingest_document(index, document, self.config)
    }

    /// Worklist traversal of the reference graph. A failure of the root
    /// document is returned; failures of referenced documents are logged
    /// and recorded in the report.
    fn run(&mut self, index: &mut SchemaIndex, root: Location, content: Option<Vec<u8>>) -> Result<()> {
        let mut pending: VecDeque<PendingDocument> = VecDeque::new();
        pending.push_back(PendingDocument {
            location: root,
            content,
            expected_namespace: None,
        });
        let mut is_root = true;

        while let Some(mut work) = pending.pop_front() {
            if !self.visited.insert(work.location.key()) {
                tracing::debug!("Skipping {}: already ingested", work.location);
                is_root = false;
                continue;
            }

            match self.load(index, &mut work) {
                Ok(info) => {
                    tracing::info!(
                        "Ingested \"{}\" with target namespace {} ({} constructs)",
                        info.uri,
                        info.target_namespace,
                        info.registered
                    );
                    if let Some(expected) = &work.expected_namespace {
                        if *expected != info.target_namespace {
                            tracing::error!(
                                "Mismatched namespace \"{}\" in xsd with url: \"{}\"",
                                expected,
                                info.uri
                            );
                        }
                    }
                    for reference in &info.references {
                        match work.location.join(&reference.location) {
                            Ok(location) => pending.push_back(PendingDocument {
                                location,
                                content: None,
                                expected_namespace: reference.namespace.clone(),
                            }),
                            Err(e) => self.record_failure(reference.location.clone(), e),
                        }
                    }
                    self.report.documents.push(info);
                }
                Err(e) if is_root => return Err(e),
                Err(e) => self.record_failure(work.location.as_str(), e),
            }
            is_root = false;
        }
        Ok(())
    }

    /// Log and record a document that could not be ingested
    pub fn record_failure(&mut self, location: String, error: Error) {
        tracing::error!("Failed to ingest schema \"{}\": {}", location, error);
        self.report.failures.push(IngestFailure {
            location,
            error: error.to_string(),
        });
    }
}
