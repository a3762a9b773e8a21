//! Supertype chain walking

use super::model::GlobalElement;
use super::types::TypeResolver;
use super::xsd_attrs;
use super::xsd_elements;
use crate::documents::NodeRef;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::QName;
use std::collections::HashSet;

/// The test of the first `xs:assert` below a type
pub fn find_assertion(node: NodeRef<'_>) -> Option<&str> {
    node.descendant_named(xsd_elements::ASSERT)
        .and_then(|a| a.attribute(xsd_attrs::TEST))
}

/// Fill the parents and assertions of a global element.
///
/// Starting from the element's own declaration, the type of the current node
/// is resolved to its defining node, which is recorded as the next parent
/// (nearest first) before the walk continues from it. The walk ends when a
/// type cannot be resolved or a type refers to itself. Reaching a tag that
/// is already on the chain is an [`Error::Cycle`]; the parents recorded up
/// to that point are kept.
pub fn find_ancestors(
    resolver: &TypeResolver<'_>,
    element: &mut GlobalElement,
    limits: &Limits,
) -> Result<()> {
    let mut visited: HashSet<QName> = HashSet::new();
    visited.insert(element.tag.clone());

    let mut current = resolver.node(element.node);
    while let Some(node) = current {
        let Some((tag, handle)) = resolver.supertype(node) else {
            break;
        };
        let parent = resolver.node(handle);
        if parent == Some(node) {
            tracing::debug!("{} refers to itself; ending the supertype chain", tag);
            break;
        }
        if !visited.insert(tag.clone()) {
            return Err(Error::Cycle(format!(
                "The supertype chain of {} returns to {} at {}",
                element.tag,
                tag,
                node.location()
            )));
        }
        limits.check_ancestor_depth(element.parents.len() + 1)?;

        if let Some(test) = parent.and_then(find_assertion) {
            element.add_assertion(test);
        }
        element.put_parent(tag, handle);
        current = parent;
    }
    Ok(())
}
