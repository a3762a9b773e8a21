//! Occurrence bounds of element and attribute uses
//!
//! Bounds come from `minOccurs`/`maxOccurs` (or `use` for attributes) on the
//! declaration, overridden by the nearest enclosing `xs:sequence` or
//! `xs:choice`.

use super::xsd_attrs;
use super::xsd_elements;
use crate::documents::NodeRef;
use serde::{Serialize, Serializer};
use std::fmt;

/// Occurrence bounds (lower, upper); `None` upper means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    /// Minimum number of occurrences
    pub lower: u32,
    /// Maximum number of occurrences (None = unbounded)
    pub upper: Option<u32>,
}

impl Cardinality {
    /// Create new occurrence bounds
    pub fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self::new(1, Some(1))
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self::new(0, None)
    }

    /// True if the lower bound is non-zero
    pub fn is_mandatory(&self) -> bool {
        self.lower > 0
    }

    /// True if the upper bound is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.upper.is_none()
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}, {}]", self.lower, upper),
            None => write!(f, "[{}, \u{221e}]", self.lower),
        }
    }
}

impl Serialize for Cardinality {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a `maxOccurs` value; `unbounded` is `None`. Anything that is not
/// a positive integer is logged and read as 1.
fn parse_upper(value: &str, node: NodeRef<'_>) -> Option<u32> {
    let value = value.trim();
    if value == "unbounded" {
        return None;
    }
    match value.parse::<u32>() {
        Ok(upper) if upper > 0 => Some(upper),
        _ => {
            tracing::warn!("Invalid maxOccurs \"{}\" at {}", value, node.location());
            Some(1)
        }
    }
}

fn parse_lower(value: &str, node: NodeRef<'_>) -> Option<u32> {
    match value.trim().parse::<u32>() {
        Ok(lower) => Some(lower),
        Err(_) => {
            tracing::warn!("Invalid minOccurs \"{}\" at {}", value, node.location());
            None
        }
    }
}

/// Bounds read from the declaration itself
fn declared_occurs(node: NodeRef<'_>) -> Cardinality {
    let lower = node
        .attribute(xsd_attrs::MIN_OCCURS)
        .and_then(|v| parse_lower(v, node))
        .unwrap_or_else(|| match node.attribute(xsd_attrs::USE) {
            Some("required") | Some("req") => 1,
            Some(_) => 0,
            None => 1,
        });

    let upper = match node.attribute(xsd_attrs::MAX_OCCURS) {
        Some(v) => parse_upper(v, node),
        None => Some(1),
    };

    Cardinality::new(lower, upper)
}

/// The nearest `xs:sequence` or `xs:choice` ancestor in the document
fn nearest_group<'a>(node: NodeRef<'a>) -> Option<NodeRef<'a>> {
    node.ancestors().find(|a| {
        matches!(
            a.local_name(),
            xsd_elements::SEQUENCE | xsd_elements::CHOICE
        )
    })
}

/// Cardinality of a declaration and whether it sits in an `xs:choice`.
///
/// Only the nearest enclosing sequence or choice is consulted; its own
/// bounds, where present, replace the declared ones.
pub fn cardinality(node: NodeRef<'_>) -> (Cardinality, bool) {
    let mut occurs = declared_occurs(node);
    let Some(group) = nearest_group(node) else {
        return (occurs, false);
    };

    if let Some(lower) = group
        .attribute(xsd_attrs::MIN_OCCURS)
        .and_then(|v| parse_lower(v, group))
    {
        occurs.lower = lower;
    }
    if let Some(v) = group.attribute(xsd_attrs::MAX_OCCURS) {
        occurs.upper = parse_upper(v, group);
    }
    (occurs, group.local_name() == xsd_elements::CHOICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use proptest::prelude::*;

    fn first_element(doc: &Document) -> NodeRef<'_> {
        doc.root().descendant_named("element").unwrap()
    }

    fn parse(body: &str) -> Document {
        let xml = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">{}</xs:schema>"#,
            body
        );
        Document::from_string(&xml, "mem").unwrap()
    }

    #[test]
    fn test_default_is_once() {
        let doc = parse(r#"<xs:element name="Vessel"/>"#);
        assert_eq!(cardinality(first_element(&doc)), (Cardinality::once(), false));
    }

    #[test]
    fn test_declared_bounds() {
        let doc = parse(r#"<xs:element name="Deck" minOccurs="0" maxOccurs="unbounded"/>"#);
        assert_eq!(
            cardinality(first_element(&doc)),
            (Cardinality::zero_or_more(), false)
        );
    }

    #[test]
    fn test_use_sets_lower_bound() {
        let doc = parse(
            r#"<xs:complexType name="A_T"><xs:attribute name="a" use="required"/><xs:attribute name="b" use="optional"/><xs:attribute name="c" use="req"/></xs:complexType>"#,
        );
        let bounds: Vec<u32> = doc
            .root()
            .descendants_named("attribute")
            .map(|a| cardinality(a).0.lower)
            .collect();
        assert_eq!(bounds, vec![1, 0, 1]);
    }

    #[test]
    fn test_choice_overrides() {
        let doc = parse(
            r#"<xs:complexType name="A_T"><xs:choice minOccurs="0"><xs:element ref="ocx:B"/></xs:choice></xs:complexType>"#,
        );
        let (occurs, is_choice) = cardinality(first_element(&doc));
        assert_eq!(occurs, Cardinality::new(0, Some(1)));
        assert!(is_choice);
    }

    #[test]
    fn test_only_nearest_group_counts() {
        let doc = parse(
            r#"<xs:complexType name="A_T"><xs:choice maxOccurs="unbounded"><xs:sequence><xs:element name="B" minOccurs="0"/></xs:sequence></xs:choice></xs:complexType>"#,
        );
        let (occurs, is_choice) = cardinality(first_element(&doc));
        assert_eq!(occurs, Cardinality::new(0, Some(1)));
        assert!(!is_choice);
    }

    #[test]
    fn test_invalid_upper_bound() {
        let doc = parse(
            r#"<xs:sequence><xs:element name="A" maxOccurs=" unbounded "/><xs:element name="B" maxOccurs="0"/><xs:element name="C" maxOccurs="many"/><xs:element name="D" maxOccurs=" 3"/></xs:sequence>"#,
        );
        let uppers: Vec<Option<u32>> = doc
            .root()
            .descendants_named("element")
            .map(|e| cardinality(e).0.upper)
            .collect();
        assert_eq!(uppers, vec![None, Some(1), Some(1), Some(3)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Cardinality::once().to_string(), "[1, 1]");
        assert_eq!(Cardinality::zero_or_more().to_string(), "[0, \u{221e}]");
    }

    proptest! {
        #[test]
        fn prop_declared_bounds_roundtrip(lower in 0u32..1000, upper in proptest::option::of(1u32..1000)) {
            let max = upper.map(|u| u.to_string()).unwrap_or_else(|| "unbounded".to_string());
            let doc = parse(&format!(r#"<xs:element name="E" minOccurs="{}" maxOccurs="{}"/>"#, lower, max));
            let (occurs, is_choice) = cardinality(first_element(&doc));
            prop_assert_eq!(occurs, Cardinality::new(lower, upper));
            prop_assert!(!is_choice);
        }
    }
}
