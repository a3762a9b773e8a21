//! Resolved schema model
//!
//! Records produced by the resolver. They are plain data: built once during
//! the resolution pass and only read afterwards.

use super::index::NodeHandle;
use super::occurs::Cardinality;
use crate::namespaces::QName;
use indexmap::IndexMap;
use serde::Serialize;

/// Enumeration values of an attribute or simple type.
///
/// `values` and `descriptions` are positionally paired in document order;
/// a value may repeat with a different description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumerator {
    /// Name of the declaring construct
    pub name: String,
    /// Namespace prefix
    pub prefix: String,
    /// Unique tag of the declaring construct
    pub tag: QName,
    /// Enumeration values
    pub values: Vec<String>,
    /// Documentation of each value
    pub descriptions: Vec<String>,
}

impl Enumerator {
    /// Create an enumerator without values
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, tag: QName) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            tag,
            values: Vec::new(),
            descriptions: Vec::new(),
        }
    }

    /// Append a value and its description
    pub fn push(&mut self, value: impl Into<String>, description: impl Into<String>) {
        self.values.push(value.into());
        self.descriptions.push(description.into());
    }

    /// `(value, description)` pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .zip(self.descriptions.iter())
            .map(|(v, d)| (v.as_str(), d.as_str()))
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A resolved `xs:attribute` use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRecord {
    /// Attribute name
    pub name: String,
    /// Namespace prefix
    pub prefix: String,
    /// Type reference
    #[serde(rename = "type")]
    pub type_of: Option<String>,
    /// `required` or `optional`
    #[serde(rename = "use")]
    pub use_: String,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// Documentation text
    pub description: String,
    /// Tag of the referenced global attribute
    pub reference: Option<QName>,
    /// Enumeration values of the attribute
    pub enumerator: Option<Enumerator>,
}

impl AttributeRecord {
    /// True if the attribute use is required
    pub fn is_required(&self) -> bool {
        matches!(self.use_.as_str(), "required" | "req")
    }
}

/// A resolved child `xs:element` use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRecord {
    /// Element name
    pub name: String,
    /// Namespace prefix
    pub prefix: String,
    /// Type reference
    #[serde(rename = "type")]
    pub type_of: Option<String>,
    /// `req.` or `opt.`
    #[serde(rename = "use")]
    pub use_: String,
    /// Occurrence bounds at the use site
    pub cardinality: Cardinality,
    /// True if the use site is inside an `xs:choice`
    pub is_choice: bool,
    /// True if the child refers to a global element
    pub is_global: bool,
    /// Tag of the referenced global element
    pub reference: Option<QName>,
    /// Documentation text
    pub description: String,
}

impl ChildRecord {
    /// The use string for a cardinality
    pub fn use_for(cardinality: Cardinality) -> &'static str {
        if cardinality.is_mandatory() {
            "req."
        } else {
            "opt."
        }
    }

    /// `prefix:name`
    pub fn prefixed_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.prefix, self.name)
        }
    }
}

/// Name, type, use, cardinality and description of a global element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ElementProperties {
    /// Prefixed name
    pub name: String,
    /// Prefixed type name
    #[serde(rename = "Type")]
    pub type_of: String,
    /// `req` or `opt`
    #[serde(rename = "Use")]
    pub use_: String,
    /// Rendered as `[lower, upper]`
    pub cardinality: String,
    /// Documentation text
    pub description: String,
}

/// A resolved global `xs:element`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalElement {
    /// Unique tag
    pub tag: QName,
    /// Element name
    pub name: String,
    /// Namespace prefix; empty if the namespace has no registered prefix
    pub prefix: String,
    /// Type reference
    #[serde(rename = "type")]
    pub type_of: Option<String>,
    /// Occurrence bounds of the declaration
    pub cardinality: Cardinality,
    /// True if the declaration sits in an `xs:choice`
    pub is_choice: bool,
    /// `abstract="true"`
    pub is_abstract: bool,
    /// Raw `substitutionGroup` value
    pub substitution_group: Option<String>,
    /// Documentation text
    pub description: String,
    /// Line of the declaration
    pub source_line: usize,
    /// Declaring node
    pub node: NodeHandle,
    /// Supertypes, nearest first
    pub parents: IndexMap<QName, NodeHandle>,
    /// Own and inherited attributes
    pub attributes: Vec<AttributeRecord>,
    /// Own and inherited children, substitution groups expanded
    pub children: Vec<ChildRecord>,
    /// `xs:assert` tests found along the supertype chain
    pub assertions: Vec<String>,
}

impl GlobalElement {
    /// Create an element with no parents, attributes or children
    pub fn new(tag: QName, prefix: impl Into<String>, node: NodeHandle) -> Self {
        Self {
            name: tag.local_name.clone(),
            tag,
            prefix: prefix.into(),
            type_of: None,
            cardinality: Cardinality::once(),
            is_choice: false,
            is_abstract: false,
            substitution_group: None,
            description: String::new(),
            source_line: 0,
            node,
            parents: IndexMap::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            assertions: Vec::new(),
        }
    }

    /// Namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.tag.namespace.as_deref()
    }

    /// `prefix:name`
    pub fn prefixed_name(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.prefix, self.name)
        }
    }

    /// Append an attribute record
    pub fn add_attribute(&mut self, attribute: AttributeRecord) {
        self.attributes.push(attribute);
    }

    /// Append a child record
    pub fn add_child(&mut self, child: ChildRecord) {
        self.children.push(child);
    }

    /// Record an `xs:assert` test
    pub fn add_assertion(&mut self, test: impl Into<String>) {
        self.assertions.push(test.into());
    }

    /// Record a supertype; returns false if it is already recorded
    pub fn put_parent(&mut self, tag: QName, node: NodeHandle) -> bool {
        if self.parents.contains_key(&tag) {
            return false;
        }
        self.parents.insert(tag, node);
        true
    }

    /// Local names of the supertypes, nearest first
    pub fn parent_names(&self) -> Vec<&str> {
        self.parents.keys().map(|t| t.local_name.as_str()).collect()
    }

    /// True if the element declares a substitution group
    pub fn is_substitution_group_member(&self) -> bool {
        self.substitution_group.is_some()
    }

    /// `req` or `opt`
    pub fn use_(&self) -> &'static str {
        if self.cardinality.is_mandatory() {
            "req"
        } else {
            "opt"
        }
    }

    /// First attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&ChildRecord> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Summary properties
    pub fn properties(&self) -> ElementProperties {
        ElementProperties {
            name: self.prefixed_name(),
            type_of: self.type_of.clone().unwrap_or_default(),
            use_: self.use_().to_string(),
            cardinality: self.cardinality.to_string(),
            description: self.description.clone(),
        }
    }
}

/// One `SchemaChange` annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaChange {
    /// Schema version the change was made in
    pub version: Option<String>,
    /// Author of the change
    pub author: Option<String>,
    /// Date of the change as written
    pub date: Option<String>,
    /// Text of the change annotation
    pub description: String,
}

/// An indexed schema construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaType {
    /// Namespace prefix
    pub prefix: String,
    /// Local name
    pub name: String,
    /// Unique tag
    pub tag: QName,
    /// Line of the declaration in its source document
    pub source_line: usize,
}

/// A global simple type or global attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaAttribute {
    /// Local name
    pub name: String,
    /// Namespace prefix
    pub prefix: String,
    /// Base type of a simple type, or the type of an attribute
    #[serde(rename = "type")]
    pub type_of: Option<String>,
    /// Enumeration values joined with `, `, or the pattern facet
    pub restriction: String,
    /// Documentation text
    pub description: String,
}
