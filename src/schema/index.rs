//! Raw element index
//!
//! The index maps the unique tag of every registered schema construct to the
//! node that declares it, across the whole merged document set. It also owns
//! the parsed documents, the namespace registry and the substitution groups,
//! which are all built during the same ingestion pass.

use crate::documents::{Document, NodeId, NodeRef};
use crate::namespaces::{NamespaceRegistry, QName};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Handle to a node of one of the ingested documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeHandle {
    /// Index of the document in ingestion order
    pub document: usize,
    /// Node within the document
    pub node: NodeId,
}

/// Schema construct kinds held by the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructKind {
    /// `xs:element`
    Element,
    /// `xs:complexType`
    ComplexType,
    /// `xs:simpleType`
    SimpleType,
    /// `xs:attributeGroup`
    AttributeGroup,
    /// Global `xs:attribute`
    Attribute,
    /// Attribute or attribute group carrying `xs:enumeration` values
    Enumeration,
}

impl ConstructKind {
    /// Every kind, in summary column order
    pub const ALL: [ConstructKind; 6] = [
        ConstructKind::Element,
        ConstructKind::ComplexType,
        ConstructKind::SimpleType,
        ConstructKind::AttributeGroup,
        ConstructKind::Attribute,
        ConstructKind::Enumeration,
    ];

    /// The kind name as used in configuration and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructKind::Element => "element",
            ConstructKind::ComplexType => "complexType",
            ConstructKind::SimpleType => "simpleType",
            ConstructKind::AttributeGroup => "attributeGroup",
            ConstructKind::Attribute => "attribute",
            ConstructKind::Enumeration => "enumeration",
        }
    }

    /// Parse a kind name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitution group head name to member tags, in registration order.
///
/// The head is keyed by the raw `substitutionGroup` value (`prefix:name`).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SubstitutionGroups {
    groups: IndexMap<String, Vec<QName>>,
}

impl SubstitutionGroups {
    /// Create an empty group table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member to a group, creating the group if needed
    pub fn add_member(&mut self, head: impl Into<String>, member: QName) {
        let members = self.groups.entry(head.into()).or_default();
        if !members.contains(&member) {
            members.push(member);
        }
    }

    /// Members of a group; empty if the name is not a group head
    pub fn members(&self, head: &str) -> &[QName] {
        self.groups.get(head).map(|m| m.as_slice()).unwrap_or(&[])
    }

    /// True if the name is a registered group head
    pub fn is_head(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Iterate over `(head, members)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[QName])> {
        self.groups.iter().map(|(h, m)| (h.as_str(), m.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if no group is registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: NodeHandle,
    kind: ConstructKind,
    /// Declared as a direct child of `xs:schema`
    top_level: bool,
}

/// The merged symbol table of all ingested documents
#[derive(Debug, Default)]
pub struct SchemaIndex {
    documents: Vec<Document>,
    /// Target namespace of each document
    targets: Vec<String>,
    registry: NamespaceRegistry,
    nodes: IndexMap<QName, Entry>,
    substitution_groups: SubstitutionGroups,
}

impl SchemaIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a parsed document; returns its index
    pub fn add_document(&mut self, document: Document, target_namespace: impl Into<String>) -> usize {
        self.documents.push(document);
        self.targets.push(target_namespace.into());
        self.documents.len() - 1
    }

    /// All documents in ingestion order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Target namespace of a document
    pub fn target_namespace(&self, document: usize) -> Option<&str> {
        self.targets.get(document).map(|s| s.as_str())
    }

    /// Resolve a handle to its node
    pub fn node(&self, handle: NodeHandle) -> Option<NodeRef<'_>> {
        self.documents.get(handle.document)?.node(handle.node)
    }

    /// Handle of a node belonging to one of the documents
    pub fn handle_of(&self, node: NodeRef<'_>) -> Option<NodeHandle> {
        self.documents
            .iter()
            .position(|doc| std::ptr::eq(doc, node.document()))
            .map(|document| NodeHandle {
                document,
                node: node.id(),
            })
    }

    /// The merged namespace registry
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Mutable access to the namespace registry
    pub fn registry_mut(&mut self) -> &mut NamespaceRegistry {
        &mut self.registry
    }

    /// Register a top-level construct under its unique tag.
    ///
    /// The first top-level registration of a tag wins; a later one is logged
    /// and dropped. A top-level declaration replaces a nested declaration
    /// registered earlier under the same tag. Returns true if the tag was
    /// added or replaced.
    pub fn insert(&mut self, kind: ConstructKind, tag: QName, handle: NodeHandle) -> bool {
        self.register(kind, tag, handle, true)
    }

    /// Register a named declaration nested inside another construct.
    ///
    /// A nested declaration never displaces an existing entry.
    pub fn insert_nested(&mut self, kind: ConstructKind, tag: QName, handle: NodeHandle) -> bool {
        self.register(kind, tag, handle, false)
    }

    fn register(&mut self, kind: ConstructKind, tag: QName, handle: NodeHandle, top_level: bool) -> bool {
        if let Some(existing) = self.nodes.get(&tag).copied() {
            if top_level && !existing.top_level {
                tracing::debug!(
                    "Global {} in {} replaces the nested declaration in {}",
                    tag,
                    self.location(handle),
                    self.location(existing.handle)
                );
                self.nodes.insert(tag, Entry { handle, kind, top_level });
                return true;
            }
            tracing::warn!(
                "Duplicate tag {} in {}; keeping the {} declared in {}",
                tag,
                self.location(handle),
                existing.kind,
                self.location(existing.handle)
            );
            return false;
        }
        self.nodes.insert(tag, Entry { handle, kind, top_level });
        true
    }

    fn location(&self, handle: NodeHandle) -> String {
        self.node(handle)
            .map(|n| n.location())
            .unwrap_or_else(|| format!("document {}", handle.document))
    }

    /// The node registered under a tag
    pub fn get(&self, tag: &QName) -> Option<NodeRef<'_>> {
        self.handle(tag).and_then(|h| self.node(h))
    }

    /// The handle registered under a tag
    pub fn handle(&self, tag: &QName) -> Option<NodeHandle> {
        self.nodes.get(tag).map(|e| e.handle)
    }

    /// The construct kind registered under a tag
    pub fn kind(&self, tag: &QName) -> Option<ConstructKind> {
        self.nodes.get(tag).map(|e| e.kind)
    }

    /// True if the tag is registered
    pub fn contains(&self, tag: &QName) -> bool {
        self.nodes.contains_key(tag)
    }

    /// Sorted tags of one construct kind
    pub fn tags(&self, kind: ConstructKind) -> Vec<&QName> {
        let mut tags: Vec<&QName> = self
            .nodes
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(tag, _)| tag)
            .collect();
        tags.sort();
        tags
    }

    /// Iterate over all registrations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&QName, NodeHandle, ConstructKind)> {
        self.nodes.iter().map(|(tag, e)| (tag, e.handle, e.kind))
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The substitution group table
    pub fn substitution_groups(&self) -> &SubstitutionGroups {
        &self.substitution_groups
    }

    /// Mutable access to the substitution group table
    pub fn substitution_groups_mut(&mut self) -> &mut SubstitutionGroups {
        &mut self.substitution_groups
    }
}
