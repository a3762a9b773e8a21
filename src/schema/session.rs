//! Schema sessions
//!
//! A [`SchemaSession`] owns everything built from one set of schema
//! documents: the index, the resolved global elements and the catalogs
//! derived from them. Sessions are independent of each other; nothing is
//! kept in process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::index::{ConstructKind, SchemaIndex, SubstitutionGroups};
use super::model::{Enumerator, GlobalElement, SchemaAttribute, SchemaChange, SchemaType};
use super::parsing::{IngestReport, Ingestor};
use super::resolver::Resolver;
use super::tables::{self, Table};
use super::xsd_elements;
use crate::config::Config;
use crate::documents::NodeRef;
use crate::error::{Error, Result};
use crate::loaders::{Fetch, Loader};
use crate::locations::Location;
use crate::namespaces::{NamespaceRegistry, QName};

/// A schema resolution session
pub struct SchemaSession {
    config: Config,
    fetcher: Box<dyn Fetch>,
    index: SchemaIndex,
    report: IngestReport,
    /// Session schema version (last declaring document wins)
    version: Option<String>,
    /// Version to the namespace that declared it
    versions: IndexMap<String, String>,
    changes: Vec<SchemaChange>,
    elements: IndexMap<QName, GlobalElement>,
    enumerators: IndexMap<QName, Enumerator>,
    simple_types: Vec<SchemaAttribute>,
    global_attributes: Vec<SchemaAttribute>,
    resolved: bool,
}

impl SchemaSession {
    /// Create a session reading documents with a [`Loader`] configured from
    /// `config`
    pub fn new(config: Config) -> Self {
        let loader = Loader::new()
            .with_limits(config.limits.clone())
            .with_cache_folder(config.schema_folder.clone());
        Self {
            config,
            fetcher: Box::new(loader),
            index: SchemaIndex::new(),
            report: IngestReport::default(),
            version: None,
            versions: IndexMap::new(),
            changes: Vec::new(),
            elements: IndexMap::new(),
            enumerators: IndexMap::new(),
            simple_types: Vec::new(),
            global_attributes: Vec::new(),
            resolved: false,
        }
    }

    /// Replace the document source
    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetch>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// The session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn reset(&mut self) {
        self.index = SchemaIndex::new();
        self.report = IngestReport::default();
        self.version = None;
        self.versions.clear();
        self.changes.clear();
        self.elements.clear();
        self.enumerators.clear();
        self.simple_types.clear();
        self.global_attributes.clear();
        self.resolved = false;
    }

    /// Ingest a schema (path or URL) and everything it references, then
    /// resolve every global element.
    ///
    /// Fails only if the root document cannot be ingested. Referenced
    /// documents that fail are logged; see [`SchemaSession::is_complete`].
    pub fn process_schema(&mut self, location: &str) -> Result<()> {
        let location = Location::parse(location)?;
        self.reset();
        let mut ingestor = Ingestor::new(self.fetcher.as_ref(), &self.config);
        let result = ingestor.ingest(&mut self.index, location);
        self.report = ingestor.into_report();
        result?;
        self.finish_ingestion();
        Ok(())
    }

    /// Ingest an in-memory root document, then resolve. References are read
    /// through the session's fetcher relative to `uri`.
    pub fn ingest_str(&mut self, uri: &str, xml: &str) -> Result<()> {
        let location = Location::parse(uri)?;
        self.reset();
        let mut ingestor = Ingestor::new(self.fetcher.as_ref(), &self.config);
        let result = ingestor.ingest_bytes(&mut self.index, location, xml.as_bytes().to_vec());
        self.report = ingestor.into_report();
        result?;
        self.finish_ingestion();
        Ok(())
    }

    /// Ingest every `*.xsd` file of a folder, sorted by path, then resolve.
    ///
    /// Files already reached through an import or include are not ingested
    /// twice. Fails if no file could be ingested.
    pub fn process_folder(&mut self, folder: impl AsRef<Path>, recursive: bool) -> Result<()> {
        let folder = folder.as_ref();
        let mut files = Vec::new();
        collect_schema_files(folder, recursive, &mut files)?;
        files.sort();
        if files.is_empty() {
            return Err(Error::Resource(format!(
                "No schema files found in '{}'",
                folder.display()
            )));
        }

        self.reset();
        let mut ingestor = Ingestor::new(self.fetcher.as_ref(), &self.config);
        let mut first_error = None;
        for file in files {
            let location = Location::Path(file);
            if let Err(e) = ingestor.ingest(&mut self.index, location.clone()) {
                let message = e.to_string();
                ingestor.record_failure(location.as_str(), e);
                first_error.get_or_insert(message);
            }
        }
        self.report = ingestor.into_report();

        if self.report.documents.is_empty() {
            return Err(Error::Resource(first_error.unwrap_or_else(|| {
                format!("No schema could be ingested from '{}'", folder.display())
            })));
        }
        self.finish_ingestion();
        Ok(())
    }

    fn finish_ingestion(&mut self) {
        for info in &self.report.documents {
            if let Some(version) = &info.version {
                self.version = Some(version.clone());
                self.versions
                    .insert(version.clone(), info.target_namespace.clone());
            }
            if !info.changes.is_empty() {
                self.changes.extend(info.changes.iter().cloned());
            }
        }
        if !self.report.is_complete() {
            tracing::warn!(
                "{} referenced schema(s) could not be ingested; the model is incomplete",
                self.report.failures.len()
            );
        }
        self.resolve();
    }

    /// Resolve every indexed global element and build the catalogs
    fn resolve(&mut self) {
        let resolver = Resolver::new(&self.index, &self.config);

        let mut elements = IndexMap::new();
        let mut enumerators: IndexMap<QName, Enumerator> = IndexMap::new();
        for tag in self.index.tags(ConstructKind::Element) {
            let Some(handle) = self.index.handle(tag) else {
                continue;
            };
            let Some(mut element) = resolver.global_element(tag, handle) else {
                continue;
            };
            tracing::debug!("Adding global element {}", element.name);
            if let Err(e) = resolver.resolve(&mut element) {
                tracing::error!("Failed to resolve {}: {}", tag, e);
            }
            for enumerator in element.attributes.iter().filter_map(|a| a.enumerator.as_ref()) {
                enumerators
                    .entry(enumerator.tag.clone())
                    .or_insert_with(|| enumerator.clone());
            }
            elements.insert(tag.clone(), element);
        }

        let mut global_attributes = Vec::new();
        for tag in self.index.tags(ConstructKind::Enumeration) {
            let Some(handle) = self.index.handle(tag) else {
                continue;
            };
            if let Some(enumerator) = resolver.enumerator(tag, handle) {
                enumerators.entry(tag.clone()).or_insert(enumerator);
            }
            let is_attribute = self
                .index
                .node(handle)
                .map_or(false, |n| n.local_name() == xsd_elements::ATTRIBUTE);
            if is_attribute {
                global_attributes.extend(resolver.schema_attribute(tag, handle));
            }
        }
        for tag in self.index.tags(ConstructKind::Attribute) {
            if let Some(handle) = self.index.handle(tag) {
                global_attributes.extend(resolver.schema_attribute(tag, handle));
            }
        }
        global_attributes.sort_by(|a, b| a.name.cmp(&b.name));

        let simple_types = self
            .index
            .tags(ConstructKind::SimpleType)
            .into_iter()
            .filter_map(|tag| {
                self.index
                    .handle(tag)
                    .and_then(|h| resolver.schema_attribute(tag, h))
            })
            .collect();
        enumerators.sort_keys();

        tracing::info!(
            "Resolved {} global elements and {} enumerators",
            elements.len(),
            enumerators.len()
        );
        self.elements = elements;
        self.enumerators = enumerators;
        self.simple_types = simple_types;
        self.global_attributes = global_attributes;
        self.resolved = true;
    }

    /// True once a root document was ingested and resolved
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// True if every referenced document was ingested
    pub fn is_complete(&self) -> bool {
        self.resolved && self.report.is_complete()
    }

    /// Documents ingested and referenced documents that failed
    pub fn ingest_report(&self) -> &IngestReport {
        &self.report
    }

    /// The raw element index
    pub fn index(&self) -> &SchemaIndex {
        &self.index
    }

    /// The schema version
    pub fn schema_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Target namespace of the document declaring `version`
    pub fn schema_namespace(&self, version: &str) -> Option<&str> {
        self.versions.get(version).map(|s| s.as_str())
    }

    /// `SchemaChange` records in document order
    pub fn schema_changes(&self) -> &[SchemaChange] {
        &self.changes
    }

    /// The merged namespace registry
    pub fn namespaces(&self) -> &NamespaceRegistry {
        self.index.registry()
    }

    /// Global element by unique tag
    pub fn element(&self, tag: &QName) -> Option<&GlobalElement> {
        self.elements.get(tag)
    }

    /// Global element by `prefix:name`
    pub fn element_by_name(&self, prefixed_name: &str) -> Option<&GlobalElement> {
        if !self.resolved {
            return None;
        }
        let tag = self.index.registry().resolve(prefixed_name)?;
        self.element(&tag)
    }

    /// First global element with the given local name
    pub fn element_with_name(&self, name: &str) -> Option<&GlobalElement> {
        self.elements.values().find(|e| e.name == name)
    }

    /// All global elements, sorted by tag
    pub fn global_elements(&self) -> impl Iterator<Item = &GlobalElement> {
        self.elements.values()
    }

    /// Declaring node of an indexed construct
    pub fn raw_node(&self, tag: &QName) -> Option<NodeRef<'_>> {
        if !self.resolved {
            return None;
        }
        self.index.get(tag)
    }

    /// Sorted tags of one construct kind
    pub fn kinds(&self, kind: ConstructKind) -> Vec<&QName> {
        if !self.resolved {
            return Vec::new();
        }
        self.index.tags(kind)
    }

    /// Summaries of the constructs of one kind
    pub fn schema_types(&self, kind: ConstructKind) -> Vec<SchemaType> {
        let resolver = Resolver::new(&self.index, &self.config);
        self.kinds(kind)
            .into_iter()
            .filter_map(|tag| {
                self.index
                    .handle(tag)
                    .and_then(|h| resolver.schema_type(tag, h))
            })
            .collect()
    }

    /// Global simple types
    pub fn simple_types(&self) -> &[SchemaAttribute] {
        &self.simple_types
    }

    /// Global attributes
    pub fn global_attributes(&self) -> &[SchemaAttribute] {
        &self.global_attributes
    }

    /// All enumerators, sorted by tag
    pub fn enumerators(&self) -> impl Iterator<Item = &Enumerator> {
        self.enumerators.values()
    }

    /// Enumerator by unique tag
    pub fn enumerator(&self, tag: &QName) -> Option<&Enumerator> {
        self.enumerators.get(tag)
    }

    /// Enumerators with the given name, in any namespace
    pub fn enumerators_named(&self, name: &str) -> Vec<&Enumerator> {
        self.enumerators.values().filter(|e| e.name == name).collect()
    }

    /// Substitution groups and their members
    pub fn substitution_groups(&self) -> &SubstitutionGroups {
        self.index.substitution_groups()
    }

    /// Per namespace: prefix, version and the number of constructs of each
    /// kind
    pub fn summary(&self) -> Table {
        let mut columns = vec!["Namespace", "Prefix", "Version"];
        columns.extend(ConstructKind::ALL.iter().map(|k| k.as_str()));
        let mut table = Table::new(columns);
        if !self.resolved {
            return table;
        }

        let mut counts: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (tag, _, kind) in self.index.iter() {
            let row = counts
                .entry(tag.namespace_str())
                .or_insert_with(|| vec![0; ConstructKind::ALL.len()]);
            if let Some(i) = ConstructKind::ALL.iter().position(|k| *k == kind) {
                row[i] += 1;
            }
        }
        for (namespace, row) in counts {
            let prefix = self.index.registry().prefix_for(namespace).unwrap_or_default();
            let version = self
                .versions
                .iter()
                .find(|(_, ns)| ns.as_str() == namespace)
                .map(|(v, _)| v.as_str())
                .unwrap_or_default();
            let mut cells = vec![namespace.to_string(), prefix.to_string(), version.to_string()];
            cells.extend(row.iter().map(|n| n.to_string()));
            table.push_row(cells);
        }
        table
    }

    /// Attribute table of a global element
    pub fn attribute_table(&self, tag: &QName) -> Option<Table> {
        self.element(tag).map(tables::attribute_table)
    }

    /// Child table of a global element
    pub fn child_table(&self, tag: &QName) -> Option<Table> {
        self.element(tag).map(tables::child_table)
    }
}

impl Default for SchemaSession {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn collect_schema_files(folder: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(folder).map_err(|e| {
        Error::Resource(format!("Failed to read folder '{}': {}", folder.display(), e))
    })?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_schema_files(&path, recursive, files)?;
            }
        } else if path.extension().map_or(false, |ext| ext == "xsd") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:ocx="urn:ocx" targetNamespace="urn:ocx">
  <xs:attribute name="schemaVersion" type="xs:string" fixed="3.0.0"/>
  <xs:element name="ocxXML"><xs:complexType><xs:attribute ref="ocx:schemaVersion" use="required"/></xs:complexType></xs:element>
  <xs:simpleType name="unitCode"><xs:restriction base="xs:string"><xs:pattern value="[A-Z]+"/></xs:restriction></xs:simpleType>
</xs:schema>"#;

    #[test]
    fn test_queries_empty_before_resolution() {
        let session = SchemaSession::default();
        assert!(!session.is_resolved());
        assert!(session.global_elements().next().is_none());
        assert!(session.kinds(ConstructKind::Element).is_empty());
        assert!(session.element_by_name("ocx:ocxXML").is_none());
        assert!(session.summary().is_empty());
    }

    #[test]
    fn test_ingest_str() {
        let mut session = SchemaSession::default();
        session.ingest_str("OCX_Schema.xsd", SCHEMA).unwrap();

        assert!(session.is_resolved());
        assert!(session.is_complete());
        assert_eq!(session.schema_version(), Some("3.0.0"));
        assert_eq!(session.schema_namespace("3.0.0"), Some("urn:ocx"));

        let root = session.element_by_name("ocx:ocxXML").unwrap();
        assert_eq!(root.attributes[0].name, "schemaVersion");
        assert_eq!(root.attributes[0].fixed, None);
        assert_eq!(session.element_with_name("ocxXML"), Some(root));

        assert_eq!(session.simple_types().len(), 1);
        assert_eq!(session.simple_types()[0].restriction, "[A-Z]+");
        assert_eq!(session.global_attributes()[0].name, "schemaVersion");
    }

    #[test]
    fn test_summary_counts() {
        let mut session = SchemaSession::default();
        session.ingest_str("OCX_Schema.xsd", SCHEMA).unwrap();
        let summary = session.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.column("Prefix").unwrap(), vec!["ocx"]);
        assert_eq!(summary.column("Version").unwrap(), vec!["3.0.0"]);
        assert_eq!(summary.column("element").unwrap(), vec!["1"]);
        assert_eq!(summary.column("simpleType").unwrap(), vec!["1"]);
        assert_eq!(summary.column("attribute").unwrap(), vec!["1"]);
    }

    #[test]
    fn test_process_folder() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.xsd"), SCHEMA).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested").join("a.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:u="urn:units" targetNamespace="urn:units"><xs:element name="Unit"/></xs:schema>"#,
        )
        .unwrap();

        let mut session = SchemaSession::default();
        session.process_folder(dir.path(), false).unwrap();
        assert_eq!(session.global_elements().count(), 1);

        session.process_folder(dir.path(), true).unwrap();
        assert_eq!(session.global_elements().count(), 2);
        assert_eq!(session.namespaces().prefix_for("urn:units"), Some("u"));
    }

    #[test]
    fn test_empty_folder() {
        let dir = TempDir::new().unwrap();
        let mut session = SchemaSession::default();
        assert!(matches!(
            session.process_folder(dir.path(), true),
            Err(Error::Resource(_))
        ));
        assert!(!session.is_resolved());
    }
}
