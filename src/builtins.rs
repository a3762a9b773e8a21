//! W3C builtin datatypes used by the OCX schema.
//!
//! A tag found in this table is a resolution terminal: it is never looked up
//! in the schema index and never contributes a supertype.

use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Reference documentation for the builtin datatypes
pub const XSD_DATATYPES_URL: &str = "https://www.w3.org/TR/xmlschema-2/";

/// Local names of the builtin datatypes
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "string",
    "ID",
    "IDREF",
    "boolean",
    "decimal",
    "float",
    "integer",
    "double",
    "duration",
    "dateTime",
    "gYearMonth",
    "gYear",
    "gMonthDay",
    "hexBinary",
    "base64Binary",
    "anyURI",
    "QName",
    "token",
    "NOTATION",
    "byte",
    "normalizedString",
];

static BUILTIN_TYPES: Lazy<IndexMap<String, String>> = Lazy::new(|| {
    BUILTIN_TYPE_NAMES
        .iter()
        .map(|name| {
            (
                QName::namespaced(XSD_NAMESPACE, *name).to_string(),
                format!("{}#{}", XSD_DATATYPES_URL, name),
            )
        })
        .collect()
});

/// The builtin tag to reference URL table
pub fn builtin_types() -> &'static IndexMap<String, String> {
    &BUILTIN_TYPES
}

/// Reference URL of a builtin tag, if the tag is a builtin
pub fn builtin_url(tag: &QName) -> Option<&'static str> {
    BUILTIN_TYPES.get(&tag.to_string()).map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        assert_eq!(builtin_types().len(), 21);
    }

    #[test]
    fn test_builtin_url() {
        let tag = QName::namespaced(XSD_NAMESPACE, "string");
        assert_eq!(
            builtin_url(&tag),
            Some("https://www.w3.org/TR/xmlschema-2/#string")
        );

        let tag = QName::namespaced(XSD_NAMESPACE, "normalizedString");
        assert!(builtin_url(&tag).is_some());
    }

    #[test]
    fn test_not_builtin() {
        assert!(builtin_url(&QName::namespaced("urn:ocx", "string")).is_none());
        assert!(builtin_url(&QName::namespaced(XSD_NAMESPACE, "Vessel_T")).is_none());
    }
}
