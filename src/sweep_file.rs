use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crumble::{Crumble, CrumbleConfig, MutationRow};

/// Document format of a sweep or input file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// A complete sweep description: configuration, table and argument values.
///
/// ```yaml
/// config:
///   signature: A
///   output: if status equals ok then pass else abstract
/// table:
///   - { path: name, mutation: blank }
/// values:
///   - { name: Ada }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepFile {
    #[serde(default)]
    pub config: CrumbleConfig,

    #[serde(default)]
    pub table: Vec<MutationRow>,

    #[serde(default)]
    pub values: Vec<Value>,
}

impl SweepFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
        Self::parse(&text, DocumentFormat::from_path(path))
            .with_context(|| format!("failed to parse sweep file {:?}", path))
    }

    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self> {
        parse_document(text, format)
    }

    /// Bind the config and table into a reusable sweep.
    pub fn to_crumble(&self) -> Crumble {
        Crumble::new(self.config.clone(), self.table.clone())
    }
}

/// Load an arbitrary YAML or JSON document as a value.
pub fn load_value(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    parse_document(&text, DocumentFormat::from_path(path))
        .with_context(|| format!("failed to parse {:?}", path))
}

fn parse_document<T: serde::de::DeserializeOwned>(text: &str, format: DocumentFormat) -> Result<T> {
    let value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).context("invalid YAML")?,
        DocumentFormat::Json => serde_json::from_str(text).context("invalid JSON")?,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.yaml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.yml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("noext")),
            DocumentFormat::Json
        );
    }

    #[test]
    fn parses_yaml_sweep() {
        let text = r#"
config:
  signature: A
  kind: string
  output: if status equals ok then pass else abstract
table:
  - path: name
    mutation: blank
  - { mutation: reverse }
values:
  - name: Ada
"#;
        let sweep = SweepFile::parse(text, DocumentFormat::Yaml).unwrap();

        assert_eq!(sweep.config.signature.as_deref(), Some("A"));
        assert_eq!(sweep.config.path, None);
        assert_eq!(
            sweep.table,
            vec![MutationRow::new("name", "blank"), MutationRow::new("", "reverse")]
        );
        assert_eq!(sweep.values, vec![json!({"name": "Ada"})]);
    }

    #[test]
    fn parses_json_sweep_with_defaults() {
        let sweep = SweepFile::parse(r#"{"config": {"signature": "A"}}"#, DocumentFormat::Json)
            .unwrap();
        assert_eq!(sweep.config, CrumbleConfig::single_argument());
        assert!(sweep.table.is_empty());
        assert!(sweep.values.is_empty());
    }

    #[test]
    fn rejects_non_string_config_values() {
        let err = SweepFile::parse("config:\n  signature: [A]\n", DocumentFormat::Yaml)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid YAML");
    }

    #[test]
    fn loads_fixture_from_disk() {
        let sweep = SweepFile::load(&PathBuf::from("tests/fixtures/status_sweep.yaml"))
            .expect("fixture should load");
        assert_eq!(sweep.table.len(), 3);
        assert_eq!(sweep.to_crumble().resolved_rows().len(), 3);

        let input = load_value(&PathBuf::from("tests/fixtures/person.json")).unwrap();
        assert_eq!(input["name"], json!("Ada"));
    }
}
