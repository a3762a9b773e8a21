//! Attribute and child resolution
//!
//! Turns an indexed global element declaration into a [`GlobalElement`]:
//! the supertype chain is walked first, then the attributes and children of
//! the declaration and of every supertype are flattened into records.
//! References are replaced by the referenced declaration and substitution
//! group heads by their members.

use std::collections::HashSet;

use super::ancestors::find_ancestors;
use super::index::{NodeHandle, SchemaIndex};
use super::model::{AttributeRecord, ChildRecord, Enumerator, GlobalElement, SchemaAttribute, SchemaType};
use super::occurs::cardinality;
use super::types::{type_of, TypeResolver};
use super::xsd_attrs;
use super::xsd_elements;
use crate::config::Config;
use crate::documents::NodeRef;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names::split_qname;
use crate::namespaces::QName;

/// The `name` attribute, or the local part of `ref`
pub fn name_of(node: NodeRef<'_>) -> String {
    node.attribute(xsd_attrs::NAME)
        .or_else(|| node.attribute(xsd_attrs::REF).map(|r| split_qname(r).1))
        .unwrap_or_default()
        .to_string()
}

/// Resolves global elements against a populated index
pub struct Resolver<'a> {
    types: TypeResolver<'a>,
    limits: &'a Limits,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a populated index
    pub fn new(index: &'a SchemaIndex, config: &'a Config) -> Self {
        Self {
            types: TypeResolver::new(index, &config.builtin_types),
            limits: &config.limits,
        }
    }

    fn index(&self) -> &'a SchemaIndex {
        self.types.index()
    }

    /// Registered prefix of a namespace; empty (and logged) if there is none
    pub fn prefix_of(&self, namespace: Option<&str>) -> String {
        let Some(namespace) = namespace else {
            return String::new();
        };
        match self.index().registry().prefix_for(namespace) {
            Some(prefix) => prefix.to_string(),
            None => {
                tracing::error!("No prefix is registered for the namespace {}", namespace);
                String::new()
            }
        }
    }

    /// Target namespace of the document declaring `node`
    fn target_namespace(&self, node: NodeRef<'_>) -> Option<&'a str> {
        self.index()
            .handle_of(node)
            .and_then(|h| self.index().target_namespace(h.document))
    }

    fn document_prefix(&self, node: NodeRef<'_>) -> String {
        self.prefix_of(self.target_namespace(node))
    }

    /// Resolve a `ref` value to the referenced global declaration
    fn referenced(&self, reference: &str) -> Option<(QName, NodeRef<'a>)> {
        let (tag, handle) = self.types.element_for_type(reference)?;
        self.types.node(handle).map(|node| (tag, node))
    }

    /// Build a global element record with its declared metadata
    pub fn global_element(&self, tag: &QName, handle: NodeHandle) -> Option<GlobalElement> {
        let node = self.types.node(handle)?;
        let mut element = GlobalElement::new(tag.clone(), self.prefix_of(tag.namespace.as_deref()), handle);
        let (occurs, is_choice) = cardinality(node);
        element.type_of = type_of(node);
        element.cardinality = occurs;
        element.is_choice = is_choice;
        element.is_abstract = matches!(node.attribute(xsd_attrs::ABSTRACT).map(str::trim), Some("true" | "1"));
        element.substitution_group = node
            .attribute(xsd_attrs::SUBSTITUTION_GROUP)
            .map(|s| s.to_string());
        element.description = node.text();
        element.source_line = node.source_line();
        Some(element)
    }

    /// Walk the supertype chain, then flatten attributes and children.
    ///
    /// The element is always fully populated as far as resolution got; the
    /// first cycle or limit error met on the way is returned.
    pub fn resolve(&self, element: &mut GlobalElement) -> Result<()> {
        let walk = find_ancestors(&self.types, element, self.limits);
        let groups = self.resolve_attributes(element);
        self.resolve_children(element);
        walk.and(groups)
    }

    /// The declaration followed by its supertypes, nearest first
    fn scope(&self, element: &GlobalElement) -> Vec<NodeRef<'a>> {
        std::iter::once(element.node)
            .chain(element.parents.values().copied())
            .filter_map(|h| self.types.node(h))
            .collect()
    }

    fn resolve_attributes(&self, element: &mut GlobalElement) -> Result<()> {
        let scope = self.scope(element);
        for node in &scope {
            for attribute in node.descendants_named(xsd_elements::ATTRIBUTE) {
                element.add_attribute(self.attribute_record(attribute));
            }
        }

        let mut result = Ok(());
        for node in &scope {
            for group in node.descendants_named(xsd_elements::ATTRIBUTE_GROUP) {
                let Some(reference) = group.attribute(xsd_attrs::REF) else {
                    continue;
                };
                match self.referenced(reference) {
                    Some((_, group_node)) => {
                        let mut path = HashSet::new();
                        let flattened = self.flatten_group(group_node, &mut path, 1, &mut element.attributes);
                        if let Err(e) = flattened {
                            tracing::error!("Attribute group {} of {}: {}", reference, element.tag, e);
                            result = result.and(Err(e));
                        }
                    }
                    None => {
                        tracing::error!("Attribute group {} is not found in the global look-up table", reference);
                    }
                }
            }
        }
        result
    }

    /// Append the attributes of a group and of the groups it references
    fn flatten_group(
        &self,
        group: NodeRef<'a>,
        path: &mut HashSet<NodeHandle>,
        depth: usize,
        out: &mut Vec<AttributeRecord>,
    ) -> Result<()> {
        self.limits.check_group_depth(depth)?;
        let key = self.index().handle_of(group).unwrap_or(NodeHandle {
            document: usize::MAX,
            node: group.id(),
        });
        if !path.insert(key) {
            return Err(Error::Cycle(format!(
                "Attribute group {} at {} references itself",
                name_of(group),
                group.location()
            )));
        }

        for attribute in group.descendants_named(xsd_elements::ATTRIBUTE) {
            out.push(self.attribute_record(attribute));
        }
        for reference in group
            .descendants_named(xsd_elements::ATTRIBUTE_GROUP)
            .filter_map(|g| g.attribute(xsd_attrs::REF))
        {
            match self.referenced(reference) {
                Some((_, nested)) => self.flatten_group(nested, path, depth + 1, out)?,
                None => {
                    tracing::error!("Attribute group {} is not found in the global look-up table", reference)
                }
            }
        }
        path.remove(&key);
        Ok(())
    }

    /// One attribute record; a `ref` takes name, type and (missing)
    /// description from the referenced global attribute
    pub fn attribute_record(&self, node: NodeRef<'_>) -> AttributeRecord {
        let name = name_of(node);
        let tag = QName::new(self.target_namespace(node), name.as_str());
        let prefix = self.document_prefix(node);
        let mut record = AttributeRecord {
            enumerator: self.enumerator_of(node, &tag, &prefix),
            name,
            prefix,
            type_of: type_of(node),
            use_: node.attribute(xsd_attrs::USE).unwrap_or("optional").to_string(),
            default: node.attribute(xsd_attrs::DEFAULT).map(|s| s.to_string()),
            fixed: node.attribute(xsd_attrs::FIXED).map(|s| s.to_string()),
            description: node.text(),
            reference: None,
        };

        if let Some(reference) = node.attribute(xsd_attrs::REF) {
            match self.referenced(reference) {
                Some((tag, target)) => {
                    record.name = name_of(target);
                    record.prefix = self.prefix_of(tag.namespace.as_deref());
                    record.type_of = type_of(target);
                    if record.description.is_empty() {
                        record.description = target.text();
                    }
                    record.enumerator = self.enumerator_of(target, &tag, &record.prefix);
                    record.reference = Some(tag);
                }
                None => {
                    tracing::debug!("Unresolved attribute reference {} at {}", reference, node.location());
                    record.type_of = None;
                }
            }
        } else if record.type_of.is_none() {
            record.type_of = Some(format!(
                "{}:{}",
                self.prefix_of(node.namespace()),
                node.local_name()
            ));
        }
        record
    }

    /// Enumeration values declared inline, or by the simple type the
    /// declaration refers to
    pub fn enumerator_of(&self, node: NodeRef<'_>, tag: &QName, prefix: &str) -> Option<Enumerator> {
        if let Some(enumerator) = enumerator_from(node, tag, prefix) {
            return Some(enumerator);
        }
        let reference = node.attribute(xsd_attrs::TYPE)?;
        let (type_tag, type_node) = self.referenced(reference)?;
        let type_prefix = self.prefix_of(type_tag.namespace.as_deref());
        enumerator_from(type_node, &type_tag, &type_prefix)
    }

    fn resolve_children(&self, element: &mut GlobalElement) {
        for node in self.scope(element) {
            for child in node.descendants_named(xsd_elements::ELEMENT) {
                let mut records = Vec::new();
                self.child_records(child, &mut records);
                for record in records {
                    element.add_child(record);
                }
            }
        }
    }

    /// Records for one child use site. A reference to a substitution group
    /// head yields one record per member, each carrying the use site's
    /// cardinality and choice flag.
    pub fn child_records(&self, node: NodeRef<'_>, out: &mut Vec<ChildRecord>) {
        let (occurs, is_choice) = cardinality(node);
        let use_ = ChildRecord::use_for(occurs).to_string();
        let name = name_of(node);
        let prefix = self.document_prefix(node);
        let qualified = match node.attribute(xsd_attrs::REF) {
            Some(reference) => reference.to_string(),
            None => format!("{}:{}", prefix, name),
        };

        let members = self.index().substitution_groups().members(&qualified);
        if !members.is_empty() {
            for tag in members {
                let Some(member) = self.index().get(tag) else {
                    continue;
                };
                out.push(ChildRecord {
                    name: name_of(member),
                    prefix: self.prefix_of(tag.namespace.as_deref()),
                    type_of: type_of(member),
                    use_: use_.clone(),
                    cardinality: occurs,
                    is_choice,
                    is_global: true,
                    reference: Some(tag.clone()),
                    description: member.text(),
                });
            }
            return;
        }

        let mut record = ChildRecord {
            name,
            prefix,
            type_of: type_of(node),
            use_,
            cardinality: occurs,
            is_choice,
            is_global: false,
            reference: None,
            description: node.text(),
        };
        if let Some(reference) = node.attribute(xsd_attrs::REF) {
            record.is_global = true;
            match self.referenced(reference) {
                Some((tag, target)) => {
                    record.name = name_of(target);
                    record.prefix = self.prefix_of(tag.namespace.as_deref());
                    record.type_of = type_of(target);
                    if record.description.is_empty() {
                        record.description = target.text();
                    }
                    record.reference = Some(tag);
                }
                None => {
                    tracing::debug!("Unresolved element reference {} at {}", reference, node.location());
                    record.type_of = None;
                }
            }
        }
        out.push(record);
    }

    /// Indexed construct summary
    pub fn schema_type(&self, tag: &QName, handle: NodeHandle) -> Option<SchemaType> {
        let node = self.types.node(handle)?;
        Some(SchemaType {
            prefix: self.prefix_of(tag.namespace.as_deref()),
            name: tag.local_name.clone(),
            tag: tag.clone(),
            source_line: node.source_line(),
        })
    }

    /// Global simple type or attribute summary
    pub fn schema_attribute(&self, tag: &QName, handle: NodeHandle) -> Option<SchemaAttribute> {
        let node = self.types.node(handle)?;
        let values: Vec<&str> = node
            .descendants_named(xsd_elements::ENUMERATION)
            .filter_map(|e| e.attribute(xsd_attrs::VALUE))
            .collect();
        let restriction = if values.is_empty() {
            node.descendant_named(xsd_elements::PATTERN)
                .and_then(|p| p.attribute(xsd_attrs::VALUE))
                .unwrap_or_default()
                .to_string()
        } else {
            values.join(", ")
        };
        Some(SchemaAttribute {
            name: tag.local_name.clone(),
            prefix: self.prefix_of(tag.namespace.as_deref()),
            type_of: type_of(node),
            restriction,
            description: node.text(),
        })
    }

    /// Enumerator of an indexed construct
    pub fn enumerator(&self, tag: &QName, handle: NodeHandle) -> Option<Enumerator> {
        let node = self.types.node(handle)?;
        enumerator_from(node, tag, &self.prefix_of(tag.namespace.as_deref()))
    }
}

/// `xs:enumeration` values below a node, paired with their documentation
fn enumerator_from(node: NodeRef<'_>, tag: &QName, prefix: &str) -> Option<Enumerator> {
    let mut enumerator = Enumerator::new(tag.local_name.as_str(), prefix, tag.clone());
    for value in node.descendants_named(xsd_elements::ENUMERATION) {
        enumerator.push(value.attribute(xsd_attrs::VALUE).unwrap_or_default(), value.text());
    }
    if enumerator.is_empty() {
        None
    } else {
        Some(enumerator)
    }
}
