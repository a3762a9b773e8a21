//! XML namespace handling
//!
//! This module provides the unique tag type used as the primary key of every
//! schema lookup table, and the session-wide registry of namespace prefixes
//! merged from all parsed documents.

use crate::names::split_qname;
use crate::XML_NAMESPACE;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name - combination of namespace and local name.
///
/// Serialized as the unique tag `{namespace}local`, which identifies a global
/// schema construct across the whole merged document set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Parse a unique tag of the form `{namespace}local` (or a bare local name)
    pub fn from_tag(tag: &str) -> Self {
        if let Some(rest) = tag.strip_prefix('{') {
            if let Some((ns, local)) = rest.split_once('}') {
                return Self::namespaced(ns, local);
            }
        }
        Self::local(tag)
    }

    /// The namespace URI, or the empty string for no namespace
    pub fn namespace_str(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Registry of namespace prefixes merged across every parsed document.
///
/// One URI per prefix. The first binding of a prefix wins; a later document
/// rebinding it is logged and dropped. The reserved `xml` prefix is always
/// present. A default namespace declaration (`xmlns="..."`) is registered
/// under the empty prefix.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    prefixes: IndexMap<Prefix, NamespaceUri>,
}

impl NamespaceRegistry {
    /// Create a registry holding only the `xml` prefix
    pub fn new() -> Self {
        let mut prefixes = IndexMap::new();
        prefixes.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Self { prefixes }
    }

    /// Merge prefix declarations into the registry.
    ///
    /// Returns the number of newly added prefixes. Existing prefixes are never
    /// overwritten.
    pub fn register<I, P, U>(&mut self, declarations: I) -> usize
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let before = self.prefixes.len();
        for (prefix, uri) in declarations {
            let (prefix, uri) = (prefix.into(), uri.into());
            match self.prefixes.get(&prefix) {
                Some(existing) if *existing == uri => {}
                Some(existing) => {
                    tracing::warn!(
                        "The namespace prefix \"{}\" already exists with namespace {}. Dropping new namespace {}",
                        prefix,
                        existing,
                        uri
                    );
                }
                None => {
                    self.prefixes.insert(prefix, uri);
                }
            }
        }
        self.prefixes.len() - before
    }

    /// The namespace bound to a prefix
    pub fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Reverse lookup of the prefix bound to a namespace.
    ///
    /// A named prefix is preferred over the default (empty) prefix when a
    /// namespace is declared both ways. `None` when the namespace is unknown.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        let mut default = None;
        for (prefix, uri) in &self.prefixes {
            if uri == namespace {
                if !prefix.is_empty() {
                    return Some(prefix);
                }
                default = Some(prefix.as_str());
            }
        }
        if default.is_none() {
            tracing::debug!("The namespace {} is not in the namespace registry", namespace);
        }
        default
    }

    /// True if some prefix is bound to the namespace
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.prefixes.values().any(|uri| uri == namespace)
    }

    /// Resolve `prefix:local` (or an unprefixed name, via the default
    /// namespace) to a unique tag
    pub fn resolve(&self, prefixed_name: &str) -> Option<QName> {
        let (prefix, local) = split_qname(prefixed_name);
        match self.namespace_for(prefix.unwrap_or("")) {
            Some(ns) => Some(QName::namespaced(ns, local)),
            None => {
                tracing::debug!("The type {} has an unknown namespace prefix", prefixed_name);
                None
            }
        }
    }

    /// Iterate over `(prefix, namespace)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Number of registered prefixes
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// True if only the reserved prefixes are present
    pub fn is_empty(&self) -> bool {
        self.prefixes.len() <= 1
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OCX: &str = "https://3docx.org/fileadmin//ocx_schema//V286//OCX_Schema.xsd";

    #[test]
    fn test_qname_to_string() {
        let qname = QName::namespaced(OCX, "Vessel");
        assert_eq!(qname.to_string(), format!("{{{}}}Vessel", OCX));

        let qname_local = QName::local("Vessel");
        assert_eq!(qname_local.to_string(), "Vessel");
    }

    #[test]
    fn test_qname_from_tag() {
        let qname = QName::from_tag("{http://www.w3.org/2001/XMLSchema}string");
        assert_eq!(qname.namespace_str(), "http://www.w3.org/2001/XMLSchema");
        assert_eq!(qname.local_name, "string");

        assert_eq!(QName::from_tag("Vessel"), QName::local("Vessel"));
    }

    #[test]
    fn test_registry_seeds_xml() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.namespace_for("xml"), Some(XML_NAMESPACE));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_counts_new_prefixes() {
        let mut registry = NamespaceRegistry::new();
        let added = registry.register([("ocx", OCX), ("xs", crate::XSD_NAMESPACE)]);
        assert_eq!(added, 2);

        let added = registry.register([("ocx", OCX), ("unitsml", "urn:oasis:names:tc:unitsml:schema:xsd:UnitsMLSchema_lite-0.9.18")]);
        assert_eq!(added, 1);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_register_never_overwrites() {
        let mut registry = NamespaceRegistry::new();
        registry.register([("ocx", OCX)]);
        let added = registry.register([("ocx", "urn:other")]);
        assert_eq!(added, 0);
        assert_eq!(registry.namespace_for("ocx"), Some(OCX));
    }

    #[test]
    fn test_prefix_for() {
        let mut registry = NamespaceRegistry::new();
        registry.register([("", OCX), ("ocx", OCX)]);
        assert_eq!(registry.prefix_for(OCX), Some("ocx"));
        assert_eq!(registry.prefix_for("urn:unknown"), None);

        let mut registry = NamespaceRegistry::new();
        registry.register([("", OCX)]);
        assert_eq!(registry.prefix_for(OCX), Some(""));
    }

    #[test]
    fn test_resolve_prefixed_name() {
        let mut registry = NamespaceRegistry::new();
        registry.register([("xs", crate::XSD_NAMESPACE)]);

        let qname = registry.resolve("xs:string").unwrap();
        assert_eq!(qname.namespace.as_deref(), Some(crate::XSD_NAMESPACE));
        assert_eq!(qname.local_name, "string");

        assert!(registry.resolve("ocx:Vessel").is_none());
        assert!(registry.resolve("Vessel").is_none());
    }

    proptest! {
        #[test]
        fn prop_first_binding_wins(
            first in proptest::collection::vec(("[a-z]{1,4}", "urn:[a-z]{1,6}"), 0..8),
            second in proptest::collection::vec(("[a-z]{1,4}", "urn:[a-z]{1,6}"), 0..8),
        ) {
            let mut registry = NamespaceRegistry::new();
            registry.register(first.clone());
            let snapshot: Vec<(String, String)> = registry
                .iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect();

            let added = registry.register(second);
            prop_assert_eq!(registry.len(), snapshot.len() + added);
            for (prefix, uri) in &snapshot {
                prop_assert_eq!(registry.namespace_for(prefix), Some(uri.as_str()));
            }
        }
    }
}
