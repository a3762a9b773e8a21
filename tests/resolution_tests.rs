//! Resolution tests against a multi-document OCX schema
//!
//! The fixture under `tests/fixtures/ocx` imports a UnitsML schema and
//! includes a common schema sharing the OCX target namespace.

use ocx_schema::namespaces::QName;
use ocx_schema::schema::{Cardinality, ConstructKind};
use ocx_schema::{Error, SchemaSession};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const OCX: &str = "https://3docx.org/fileadmin//ocx_schema//V286//OCX_Schema.xsd";
const UNITSML: &str = "urn:oasis:names:tc:unitsml:schema:xsd:UnitsMLSchema_lite-0.9.18";

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("ocx");
    path.push(name);
    path
}

fn ocx_session() -> SchemaSession {
    let mut session = SchemaSession::default();
    session
        .process_schema(fixture("OCX_Schema.xsd").to_str().unwrap())
        .unwrap();
    session
}

fn ocx(name: &str) -> QName {
    QName::namespaced(OCX, name)
}

fn write_schema(dir: &Path, file: &str, body: &str) {
    let xml = format!(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:ocx="urn:ocx" targetNamespace="urn:ocx">{}</xs:schema>"#,
        body
    );
    fs::write(dir.join(file), xml).unwrap();
}

// ============================================================================
// Ingestion
// ============================================================================

#[test]
fn test_document_closure() {
    let session = ocx_session();
    let report = session.ingest_report();

    assert!(session.is_resolved());
    assert!(session.is_complete());
    assert_eq!(report.documents.len(), 3);
    assert_eq!(report.documents[0].target_namespace, OCX);
    assert_eq!(session.namespaces().prefix_for(OCX), Some("ocx"));
    assert_eq!(session.namespaces().prefix_for(UNITSML), Some("unitsml"));
}

#[test]
fn test_schema_version_and_changes() {
    let session = ocx_session();
    assert_eq!(session.schema_version(), Some("2.8.6"));
    assert_eq!(session.schema_namespace("2.8.6"), Some(OCX));

    let changes = session.schema_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].author.as_deref(), Some("ocxc"));
    assert_eq!(changes[0].description, "Added the Vessel form.");
}

#[test]
fn test_summary() {
    let session = ocx_session();
    let summary = session.summary();

    assert_eq!(summary.column("Namespace").unwrap(), vec![OCX, UNITSML]);
    assert_eq!(summary.column("Prefix").unwrap(), vec!["ocx", "unitsml"]);
    assert_eq!(summary.column("Version").unwrap(), vec!["2.8.6", ""]);
    assert_eq!(summary.column("element").unwrap(), vec!["10", "3"]);
    assert_eq!(summary.column("complexType").unwrap(), vec!["3", "1"]);
    assert_eq!(summary.column("attribute").unwrap(), vec!["2", "0"]);
}

#[test]
fn test_idempotence() {
    let first = ocx_session();
    let second = ocx_session();

    let first: Vec<_> = first.global_elements().collect();
    let second: Vec<_> = second.global_elements().collect();
    assert_eq!(first, second);
}

#[test]
fn test_duplicate_tag_first_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), "a.xsd", r#"<xs:element name="Vessel" type="xs:string"/>"#);
    write_schema(dir.path(), "b.xsd", r#"<xs:element name="Vessel" type="xs:integer"/>"#);

    let mut session = SchemaSession::default();
    session.process_folder(dir.path(), false).unwrap();

    let tag = QName::namespaced("urn:ocx", "Vessel");
    assert_eq!(session.kinds(ConstructKind::Element), vec![&tag]);
    let node = session.raw_node(&tag).unwrap();
    assert!(node.document().uri().ends_with("a.xsd"));
    assert_eq!(session.element(&tag).unwrap().type_of.as_deref(), Some("xs:string"));
}

#[test]
fn test_local_declaration_does_not_shadow_global() {
    let mut session = SchemaSession::default();
    session
        .ingest_str(
            "mem.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:ocx="urn:ocx" targetNamespace="urn:ocx">
  <xs:complexType name="Holder"><xs:sequence><xs:element name="Description" type="xs:integer"/></xs:sequence></xs:complexType>
  <xs:element name="Description" type="xs:string"/>
  <xs:element name="Holding" type="ocx:Holder"/>
  <xs:element name="Vessel"><xs:complexType><xs:sequence><xs:element ref="ocx:Description"/></xs:sequence></xs:complexType></xs:element>
</xs:schema>"#,
        )
        .unwrap();

    let description = session.element_by_name("ocx:Description").unwrap();
    assert_eq!(description.type_of.as_deref(), Some("xs:string"));

    let vessel = session.element_by_name("ocx:Vessel").unwrap();
    let child = vessel.child("Description").unwrap();
    assert_eq!(child.type_of.as_deref(), Some("xs:string"));
    assert!(child.is_global);

    let holding = session.element_by_name("ocx:Holding").unwrap();
    let local = holding.child("Description").unwrap();
    assert_eq!(local.type_of.as_deref(), Some("xs:integer"));
    assert!(!local.is_global);
}

#[test]
fn test_global_precedence_across_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "a.xsd",
        r#"<xs:include schemaLocation="b.xsd"/>
        <xs:element name="Hull" type="xs:string"/>
        <xs:element name="Panel" type="xs:string"/>
        <xs:complexType name="Deck_T"><xs:sequence><xs:element name="Deck" type="xs:integer"/></xs:sequence></xs:complexType>"#,
    );
    write_schema(
        dir.path(),
        "b.xsd",
        r#"<xs:element name="Deck" type="xs:string"/>
        <xs:element name="Panel" type="xs:integer"/>
        <xs:complexType name="Hull_T"><xs:sequence><xs:element name="Hull" type="xs:integer"/></xs:sequence></xs:complexType>"#,
    );

    let mut session = SchemaSession::default();
    session
        .process_schema(dir.path().join("a.xsd").to_str().unwrap())
        .unwrap();

    let type_of = |name: &str| {
        session
            .element_by_name(name)
            .and_then(|e| e.type_of.clone())
    };
    // A global declaration in a later document replaces a nested one
    assert_eq!(type_of("ocx:Deck").as_deref(), Some("xs:string"));
    // A nested declaration in a later document never replaces a global one
    assert_eq!(type_of("ocx:Hull").as_deref(), Some("xs:string"));
    // Between two global declarations the first one wins
    assert_eq!(type_of("ocx:Panel").as_deref(), Some("xs:string"));
    assert!(session
        .raw_node(&QName::namespaced("urn:ocx", "Deck"))
        .unwrap()
        .document()
        .uri()
        .ends_with("b.xsd"));
}

#[test]
fn test_cyclic_includes() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "a.xsd",
        r#"<xs:include schemaLocation="b.xsd"/><xs:element name="A" type="xs:string"/>"#,
    );
    write_schema(
        dir.path(),
        "b.xsd",
        r#"<xs:include schemaLocation="a.xsd"/><xs:element name="B" type="xs:string"/>"#,
    );

    let mut session = SchemaSession::default();
    session
        .process_schema(dir.path().join("a.xsd").to_str().unwrap())
        .unwrap();

    assert_eq!(session.ingest_report().documents.len(), 2);
    assert!(session.is_complete());
    assert_eq!(session.global_elements().count(), 2);
}

#[test]
fn test_missing_include_keeps_model() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "a.xsd",
        r#"<xs:include schemaLocation="missing.xsd"/><xs:element name="A" type="xs:string"/>"#,
    );

    let mut session = SchemaSession::default();
    session
        .process_schema(dir.path().join("a.xsd").to_str().unwrap())
        .unwrap();

    assert!(session.is_resolved());
    assert!(!session.is_complete());
    assert_eq!(session.ingest_report().failures.len(), 1);
    assert!(session.element_by_name("ocx:A").is_some());
}

#[test]
fn test_missing_root_fails() {
    let mut session = SchemaSession::default();
    let result = session.process_schema(fixture("NoSuchSchema.xsd").to_str().unwrap());

    assert!(matches!(result, Err(Error::Resource(_))));
    assert!(!session.is_resolved());
    assert!(session.element_by_name("ocx:Vessel").is_none());
    assert!(session.summary().is_empty());
}

// ============================================================================
// Element resolution
// ============================================================================

#[test]
fn test_vessel_inherits_guidref() {
    let session = ocx_session();
    let vessel = session.element_by_name("ocx:Vessel").unwrap();

    assert!(!vessel.is_abstract);
    assert_eq!(vessel.substitution_group.as_deref(), Some("ocx:Form"));
    assert_eq!(vessel.type_of.as_deref(), Some("ocx:Vessel_T"));
    assert_eq!(vessel.description, "The ship.");

    assert_eq!(vessel.attributes.len(), 1);
    assert_eq!(vessel.attributes[0].name, "GUIDRef");
    assert_eq!(vessel.attributes[0].use_, "required");
    assert_eq!(vessel.attributes[0].description, "A globally unique identifier.");
}

#[test]
fn test_ancestor_order() {
    let session = ocx_session();
    let vessel = session.element_by_name("ocx:Vessel").unwrap();

    assert_eq!(vessel.parent_names(), vec!["Vessel_T", "Asset_T"]);
    let tags: Vec<_> = vessel.parents.keys().cloned().collect();
    assert_eq!(tags, vec![ocx("Vessel_T"), ocx("Asset_T")]);
}

#[test]
fn test_builtin_terminal() {
    let session = ocx_session();
    let header = session.element_by_name("ocx:Header").unwrap();

    assert_eq!(header.type_of.as_deref(), Some("xs:string"));
    assert!(header.parents.is_empty());
}

#[test]
fn test_cardinality_default() {
    let session = ocx_session();
    let header = session.element_by_name("ocx:Header").unwrap();

    assert_eq!(header.cardinality, Cardinality::new(1, Some(1)));
    assert!(!header.is_choice);
    assert_eq!(header.use_(), "req");
}

#[test]
fn test_choice_children() {
    let session = ocx_session();
    let vessel = session.element_by_name("ocx:Vessel").unwrap();

    let names: Vec<_> = vessel.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hull", "Deck", "Bulkhead"]);

    let hull = vessel.child("Hull").unwrap();
    assert_eq!(hull.cardinality, Cardinality::new(0, Some(1)));
    assert!(!hull.is_choice);

    let deck = vessel.child("Deck").unwrap();
    assert_eq!(deck.cardinality.lower, 0);
    assert!(deck.is_choice);
    assert!(deck.is_global);
    assert_eq!(deck.reference, Some(ocx("Deck")));
}

#[test]
fn test_substitution_expansion() {
    let session = ocx_session();
    let root = session.element_by_name("ocx:ocxXML").unwrap();

    let names: Vec<_> = root.children.iter().map(|c| c.prefixed_name()).collect();
    assert_eq!(names, vec!["ocx:Header", "ocx:Vessel", "ocx:Panel", "unitsml:UnitsML"]);

    for member in &root.children[1..3] {
        assert_eq!(member.cardinality, Cardinality::zero_or_more());
        assert_eq!(member.use_, "opt.");
        assert!(member.is_global);
    }
    assert_eq!(root.children[1].description, "The ship.");
    assert!(root.child("Form").is_none());

    let members = session.substitution_groups().members("ocx:Form");
    assert_eq!(members, &[ocx("Vessel"), ocx("Panel")]);
}

#[test]
fn test_reference_substitution() {
    let session = ocx_session();
    let designation = session.element_by_name("ocx:ShipDesignation").unwrap();

    let ship_name = designation.attribute("ShipName").unwrap();
    assert_eq!(ship_name.type_of.as_deref(), Some("xs:string"));
    assert_eq!(ship_name.description, "The name of the ship.");
    assert_eq!(ship_name.use_, "required");
    assert_eq!(ship_name.reference, Some(ocx("ShipName")));

    let call_sign = designation.attribute("callSign").unwrap();
    assert_eq!(call_sign.use_, "optional");
    assert!(call_sign.reference.is_none());
}

#[test]
fn test_attribute_group_through_supertype() {
    let session = ocx_session();
    let panel = session.element_by_name("ocx:Panel").unwrap();

    let names: Vec<_> = panel.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["name", "description"]);
    assert_eq!(panel.parent_names(), vec!["Form_T"]);
}

#[test]
fn test_imported_element() {
    let session = ocx_session();
    let units = session.element_by_name("unitsml:UnitsML").unwrap();

    assert_eq!(units.prefix, "unitsml");
    let unit_set = units.child("UnitSet").unwrap();
    assert_eq!(unit_set.prefix, "unitsml");
    assert_eq!(unit_set.cardinality, Cardinality::new(0, Some(1)));
}

#[test]
fn test_ancestor_cycle_keeps_element() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "cycle.xsd",
        r#"<xs:element name="A" type="ocx:A_T"/>
        <xs:complexType name="A_T"><xs:complexContent><xs:extension base="ocx:B_T"/></xs:complexContent></xs:complexType>
        <xs:complexType name="B_T"><xs:complexContent><xs:extension base="ocx:A_T"><xs:attribute name="b"/></xs:extension></xs:complexContent></xs:complexType>"#,
    );

    let mut session = SchemaSession::default();
    session
        .process_schema(dir.path().join("cycle.xsd").to_str().unwrap())
        .unwrap();

    let a = session.element_by_name("ocx:A").unwrap();
    assert_eq!(a.parent_names(), vec!["A_T", "B_T"]);
    assert_eq!(a.attributes.len(), 1);
}

// ============================================================================
// Catalogs and tables
// ============================================================================

#[test]
fn test_function_type_enumerator() {
    let session = ocx_session();
    let enumerators = session.enumerators_named("functionType");
    assert_eq!(enumerators.len(), 1);

    let function_type = enumerators[0];
    assert_eq!(function_type.tag, ocx("functionType"));
    assert_eq!(function_type.prefix, "ocx");
    assert_eq!(function_type.values, vec!["this", "that", "other"]);
    assert_eq!(function_type.descriptions.len(), 3);
    assert_eq!(function_type.descriptions[0], "This function.");
    assert_eq!(session.enumerator(&ocx("functionType")), Some(function_type));
}

#[test]
fn test_simple_types_and_global_attributes() {
    let session = ocx_session();

    let simple_types = session.simple_types();
    assert_eq!(simple_types.len(), 1);
    assert_eq!(simple_types[0].name, "unitCode");
    assert_eq!(simple_types[0].restriction, "[A-Z]{2,3}");

    let names: Vec<_> = session.global_attributes().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["ShipName", "schemaVersion"]);
}

#[test]
fn test_attribute_and_child_tables() {
    let session = ocx_session();

    let attributes = session.attribute_table(&ocx("Vessel")).unwrap();
    assert_eq!(attributes.column("Attribute").unwrap(), vec!["GUIDRef"]);
    assert_eq!(attributes.column("Use").unwrap(), vec!["required"]);

    let children = session.child_table(&ocx("Vessel")).unwrap();
    assert_eq!(
        children.column("Child").unwrap(),
        vec!["ocx:Bulkhead", "ocx:Deck", "ocx:Hull"]
    );

    assert!(session.attribute_table(&ocx("Vessel_T")).is_none());
}

#[test]
fn test_json_output() {
    let session = ocx_session();
    let vessel = session.element_by_name("ocx:Vessel").unwrap();

    let json = serde_json::to_value(vessel.properties()).unwrap();
    assert_eq!(json["Name"], "ocx:Vessel");
    assert_eq!(json["Type"], "ocx:Vessel_T");
    assert_eq!(json["Use"], "req");
}
