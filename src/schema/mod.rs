//! OCX schema resolution engine
//!
//! Documents are ingested into a [`SchemaIndex`] (namespace registry, raw
//! element index and substitution groups). Every global element is then
//! resolved into a [`GlobalElement`] carrying its supertype chain, the
//! flattened attribute and child sets and its structural metadata. The
//! [`SchemaSession`] owns all of it and exposes the query and table API.

pub mod ancestors;
pub mod index;
pub mod model;
pub mod occurs;
pub mod parsing;
pub mod resolver;
pub mod session;
pub mod tables;
pub mod types;

pub use index::{ConstructKind, NodeHandle, SchemaIndex, SubstitutionGroups};
pub use model::{
    AttributeRecord, ChildRecord, ElementProperties, Enumerator, GlobalElement, SchemaAttribute,
    SchemaChange, SchemaType,
};
pub use occurs::Cardinality;
pub use session::SchemaSession;
pub use tables::Table;

/// XSD element local names
pub(crate) mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ENUMERATION: &str = "enumeration";
    pub const PATTERN: &str = "pattern";
    pub const ASSERT: &str = "assert";
    // OCX annotations
    pub const SCHEMA_CHANGE: &str = "SchemaChange";
    pub const DESCRIPTION: &str = "Description";
}

/// XSD attribute names
pub(crate) mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
    pub const TEST: &str = "test";
    // OCX SchemaChange attributes
    pub const VERSION: &str = "version";
    pub const AUTHOR: &str = "author";
    pub const DATE: &str = "date";
}
