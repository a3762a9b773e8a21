//! Naming conformance of the resolved schema
//!
//! Element and child names must be CamelCase and attribute names
//! dromedaryCase, unless the name is one of the configured exceptions.

use crate::names::{is_camel_case, is_dromedary_case};
use crate::schema::SchemaSession;
use indexmap::IndexMap;
use serde::Serialize;

/// Failure group of element and child names
pub const CAMEL_CASE: &str = "camel_case";
/// Failure group of attribute names
pub const DROMEDARY_CASE: &str = "dromedary_case";

/// Outcome of a naming conformance check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamingReport {
    /// True if every name conforms
    pub passed: bool,
    /// Non-conforming names by convention, each listed once
    pub failures: IndexMap<String, Vec<String>>,
}

impl NamingReport {
    fn fail(&mut self, group: &str, name: &str) {
        let names = self.failures.entry(group.to_string()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        self.passed = false;
    }

    /// Failing names of one group
    pub fn failed(&self, group: &str) -> &[String] {
        self.failures.get(group).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Check every global element, child and attribute name of a session
pub fn check_schema_names(session: &SchemaSession) -> NamingReport {
    let config = session.config();
    let mut report = NamingReport {
        passed: true,
        failures: IndexMap::new(),
    };

    for element in session.global_elements() {
        let names = std::iter::once(element.name.as_str())
            .chain(element.children.iter().map(|c| c.name.as_str()));
        for name in names {
            if !is_camel_case(name) && !config.is_name_exception(name) {
                report.fail(CAMEL_CASE, name);
            }
        }
        for attribute in &element.attributes {
            let name = attribute.name.as_str();
            if !is_dromedary_case(name) && !config.is_name_exception(name) {
                report.fail(DROMEDARY_CASE, name);
            }
        }
    }
    if !report.passed {
        tracing::info!(
            "{} element and {} attribute names do not conform",
            report.failed(CAMEL_CASE).len(),
            report.failed(DROMEDARY_CASE).len()
        );
    }
    report
}
