//! Build configuration.
//!
//! Mirrors the option object a task-runner step receives. Every field is
//! optional in the JSON form; missing fields take the defaults below.

use crate::catalog::{ModuleMetadata, expand_catalog};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Capability names to detect.
    pub tests: Vec<String>,
    /// Names removed from `tests` (and from crawled names) before resolution.
    pub exclude_tests: Vec<String>,
    /// Prefix the compiler adds to every class it sets.
    pub class_prefix: String,
    /// Compiler option flags, passed through untouched.
    pub options: Vec<String>,
    pub minify: bool,
    /// Built-in catalog.
    #[serde(deserialize_with = "deserialize_catalog")]
    pub metadata: Vec<ModuleMetadata>,
    /// Custom catalog; module paths are relative to the project directory.
    #[serde(deserialize_with = "deserialize_catalog")]
    pub custom_metadata: Vec<ModuleMetadata>,
    /// Directory holding custom detection modules. Non-string values are
    /// treated as absent.
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub custom_tests: Option<String>,
    /// Add capability names referenced by the input files.
    pub crawl: bool,
    /// Fail the build when a requested name has no detection module.
    pub strict: bool,
    /// Command line of the external bundle compiler.
    pub compiler: Option<String>,
    /// Where the compiled bundle is written; stdout when absent.
    pub output: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tests: Vec::new(),
            exclude_tests: Vec::new(),
            class_prefix: String::new(),
            options: Vec::new(),
            minify: false,
            metadata: Vec::new(),
            custom_metadata: Vec::new(),
            custom_tests: None,
            crawl: true,
            strict: false,
            compiler: None,
            output: None,
        }
    }
}

impl BuildConfig {
    /// Load a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

fn deserialize_catalog<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<ModuleMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    expand_catalog(value).map_err(|err| serde::de::Error::custom(format!("{err:#}")))
}

fn deserialize_lenient_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(Some(value)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = BuildConfig::from_json("{}").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert!(config.crawl);
        assert!(!config.minify);
        assert_eq!(config.class_prefix, "");
    }

    #[test]
    fn camel_case_fields_are_read() {
        let config = BuildConfig::from_json(
            r#"{
                "tests": ["touchevents"],
                "excludeTests": ["svg"],
                "classPrefix": "mz-",
                "options": ["setClasses"],
                "minify": true,
                "metadata": [{"property": "touchevents", "amdPath": "test/touchevents"}],
                "customMetadata": [{"property": "x", "modulePath": "my-tests/x"}],
                "customTests": "./my-tests"
            }"#,
        )
        .unwrap();
        assert_eq!(config.exclude_tests, vec!["svg"]);
        assert_eq!(config.class_prefix, "mz-");
        assert!(config.minify);
        assert_eq!(
            config.metadata,
            vec![ModuleMetadata::new("touchevents", "test/touchevents")]
        );
        assert_eq!(config.custom_metadata[0].module_path, "my-tests/x");
        assert_eq!(config.custom_tests.as_deref(), Some("./my-tests"));
    }

    #[test]
    fn non_string_custom_tests_is_absent() {
        let config = BuildConfig::from_json(r#"{"customTests": 42}"#).unwrap();
        assert_eq!(config.custom_tests, None);
        let config = BuildConfig::from_json(r#"{"customTests": ["a"]}"#).unwrap();
        assert_eq!(config.custom_tests, None);
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        assert!(BuildConfig::from_json(r#"{"metadata": [{"property": "svg"}]}"#).is_err());
    }
}
