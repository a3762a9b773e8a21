//! # ocx-schema
//!
//! A parser and resolution engine for the OCX (Open Class 3D Exchange) XML
//! Schema.
//!
//! The OCX schema and every schema it imports or includes are ingested into
//! one namespace-aware symbol table. Each global element is then resolved
//! into a model carrying its supertype chain, its complete inherited
//! attribute and child sets (substitution groups expanded) and its
//! cardinality, choice and abstractness.
//!
//! ## Features
//!
//! - Ingestion of local or remote schemas, following `xs:import` and `xs:include`
//! - Resolution of `extension`/`restriction` supertype chains with cycle detection
//! - Attribute group flattening and substitution group expansion
//! - Enumerator, simple type and global attribute catalogs
//! - Tabular reports as plain-text grids or JSON
//! - Naming convention checks
//!
//! ## Example
//!
//! ```rust,ignore
//! use ocx_schema::SchemaSession;
//!
//! let mut session = SchemaSession::default();
//! session.process_schema("schema_versions/OCX_Schema.xsd")?;
//!
//! let vessel = session.element_by_name("ocx:Vessel").unwrap();
//! for attribute in &vessel.attributes {
//!     println!("{} {}", attribute.name, attribute.use_);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and namespaces
pub mod namespaces;
pub mod names;
pub mod builtins;

// Resource loading
pub mod locations;
pub mod loaders;
pub mod documents;
pub mod config;

// Resolution engine
pub mod schema;

// Consumers of the resolved model
pub mod check;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use schema::SchemaSession;

/// Version of the ocx-schema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
