//! Session configuration
//!
//! Configuration is read once when a session is created and is read-only
//! afterwards. Every field has a default, so a YAML file only needs to name
//! the values it changes.

use crate::builtins::builtin_types;
use crate::error::{Error, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The released OCX schema
pub const DEFAULT_SCHEMA: &str = "https://3docx.org/fileadmin/ocx_schema/V286/OCX_Schema.xsd";

/// The current working draft of the OCX schema
pub const WORKING_DRAFT: &str = "https://3docx.org/fileadmin/ocx_schema/V300b0/OCX_Schema.xsd";

/// Schema construct kinds registered in the raw element index
pub const PROCESS_SCHEMA_TYPES: &[&str] = &[
    "element",
    "attribute",
    "complexType",
    "simpleType",
    "attributeGroup",
];

const KNOWN_WORDS: &[&str] = &[
    "3D",
    "NURBS",
    "OCX",
    "XML",
    "authoring",
    "circumcircle",
    "consumables",
    "enumerated",
    "mm",
    "modulus",
    "multiplicities",
    "ordinate",
    "orthogonal",
    "scantling",
    "scantlings",
    "schema",
    "stiffeners",
];

const NAME_EXCEPTIONS: &[&str] = &[
    "AP_Pos",
    "FP_Pos",
    "GUIDRef",
    "U_NURBSproperties",
    "V_NURBSproperties",
    "application_version",
    "ocxXML",
    "originating_system",
    "time_stamp",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration of a schema session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema processed when no location is given
    pub default_schema: String,
    /// Location of the working draft schema
    pub working_draft: String,
    /// Folder where downloaded schemas are cached
    pub schema_folder: PathBuf,
    /// Scratch folder
    pub tmp_folder: PathBuf,
    /// Construct kinds to register in the index
    pub process_types: Vec<String>,
    /// Builtin type tag to reference URL
    pub builtin_types: IndexMap<String, String>,
    /// Words accepted by documentation spell-checking
    pub known_words: Vec<String>,
    /// Names exempt from the naming convention check
    pub name_exceptions: Vec<String>,
    /// Resource limits
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
            working_draft: WORKING_DRAFT.to_string(),
            schema_folder: PathBuf::from("schema_versions"),
            tmp_folder: PathBuf::from("tmp"),
            process_types: strings(PROCESS_SCHEMA_TYPES),
            builtin_types: builtin_types().clone(),
            known_words: strings(KNOWN_WORDS),
            name_exceptions: strings(NAME_EXCEPTIONS),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be defaulted away
    pub fn validate(&self) -> Result<()> {
        for kind in &self.process_types {
            if !PROCESS_SCHEMA_TYPES.contains(&kind.as_str()) {
                return Err(Error::Config(format!(
                    "Unknown schema construct kind '{}'. Use one of: {}",
                    kind,
                    PROCESS_SCHEMA_TYPES.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// True if the construct kind is registered in the index
    pub fn processes(&self, kind: &str) -> bool {
        self.process_types.iter().any(|k| k == kind)
    }

    /// True if the name is exempt from the naming convention check
    pub fn is_name_exception(&self, name: &str) -> bool {
        self.name_exceptions.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_folder, PathBuf::from("schema_versions"));
        assert_eq!(config.process_types.len(), 5);
        assert_eq!(config.builtin_types.len(), 21);
        assert!(config.is_name_exception("GUIDRef"));
        assert!(config.known_words.iter().any(|w| w == "scantling"));
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml_str("schema_folder: cache\nname_exceptions: [ocxXML]\n").unwrap();
        assert_eq!(config.schema_folder, PathBuf::from("cache"));
        assert_eq!(config.name_exceptions, vec!["ocxXML".to_string()]);
        assert_eq!(config.default_schema, DEFAULT_SCHEMA);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = Config::from_yaml_str("process_types: [element, group]\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "limits:\n  max_documents: 3").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.limits.max_documents, 3);
        assert_eq!(config.limits.max_group_depth, Limits::default().max_group_depth);
    }
}
