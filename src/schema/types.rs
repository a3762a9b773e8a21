//! Type reference resolution

use super::index::{NodeHandle, SchemaIndex};
use super::xsd_attrs;
use super::xsd_elements;
use crate::documents::NodeRef;
use crate::namespaces::QName;
use indexmap::IndexMap;

/// Base of the `xs:extension` or `xs:restriction` directly inside `node`
fn derivation_base(node: NodeRef<'_>) -> Option<&str> {
    node.children()
        .filter(|c| matches!(c.local_name(), xsd_elements::EXTENSION | xsd_elements::RESTRICTION))
        .find_map(|c| c.attribute(xsd_attrs::BASE))
}

/// Derivation base of the `xs:complexContent` or `xs:simpleContent` child
fn content_derivation_base(node: NodeRef<'_>) -> Option<&str> {
    node.children()
        .filter(|c| {
            matches!(
                c.local_name(),
                xsd_elements::COMPLEX_CONTENT | xsd_elements::SIMPLE_CONTENT
            )
        })
        .find_map(derivation_base)
}

/// Content derivation base of a type, either directly below the node or
/// below its inline `xs:complexType`
fn content_base(node: NodeRef<'_>) -> Option<&str> {
    content_derivation_base(node).or_else(|| {
        node.child_named(xsd_elements::COMPLEX_TYPE)
            .and_then(content_derivation_base)
    })
}

/// The type reference of a declaration.
///
/// The first match wins: the `type`, `base` or `ref` attribute, the base of
/// a complex (or simple) content derivation, the base of an inline
/// `xs:simpleType` derivation, the item type of a nested `xs:list` (as
/// `List of type X`), or the base of a nested `xs:restriction` (as
/// `Restriction of type X`). `None` means untyped.
pub fn type_of(node: NodeRef<'_>) -> Option<String> {
    for attr in [xsd_attrs::TYPE, xsd_attrs::BASE, xsd_attrs::REF] {
        if let Some(value) = node.attribute(attr) {
            return Some(value.to_string());
        }
    }
    if let Some(base) = content_base(node) {
        return Some(base.to_string());
    }
    if let Some(base) = node
        .child_named(xsd_elements::SIMPLE_TYPE)
        .and_then(derivation_base)
    {
        return Some(base.to_string());
    }
    if let Some(item) = node
        .descendants_named(xsd_elements::LIST)
        .find_map(|l| l.attribute(xsd_attrs::ITEM_TYPE))
    {
        return Some(format!("List of type {}", item));
    }
    node.descendants_named(xsd_elements::RESTRICTION)
        .find_map(|r| r.attribute(xsd_attrs::BASE))
        .map(|base| format!("Restriction of type {}", base))
}

/// Resolves type references against the raw element index
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    index: &'a SchemaIndex,
    builtins: &'a IndexMap<String, String>,
}

impl<'a> TypeResolver<'a> {
    /// Create a type resolver; `builtins` maps built-in type tags to reference URLs
    pub fn new(index: &'a SchemaIndex, builtins: &'a IndexMap<String, String>) -> Self {
        Self { index, builtins }
    }

    /// The index this resolver reads
    pub fn index(&self) -> &'a SchemaIndex {
        self.index
    }

    /// True if the tag is a builtin datatype
    pub fn is_builtin(&self, tag: &QName) -> bool {
        self.builtins.contains_key(&tag.to_string())
    }

    /// Look up the node defining a `prefix:name` type reference.
    ///
    /// `None` for an unknown prefix, a builtin datatype and a tag missing
    /// from the index. Misses are logged at debug level only.
    pub fn element_for_type(&self, reference: &str) -> Option<(QName, NodeHandle)> {
        let tag = self.index.registry().resolve(reference)?;
        if let Some(url) = self.builtins.get(&tag.to_string()) {
            tracing::debug!("The tag {} is a built-in type {}", tag, url);
            return None;
        }
        match self.index.handle(&tag) {
            Some(handle) => Some((tag, handle)),
            None => {
                tracing::debug!("The tag {} is not in the look-up table", tag);
                None
            }
        }
    }

    /// The node defining the type of `node`
    pub fn supertype(&self, node: NodeRef<'_>) -> Option<(QName, NodeHandle)> {
        type_of(node).and_then(|reference| self.element_for_type(&reference))
    }

    /// Resolve a handle to a node
    pub fn node(&self, handle: NodeHandle) -> Option<NodeRef<'a>> {
        self.index.node(handle)
    }
}
