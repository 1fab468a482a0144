//! Detection-module catalogs.
//!
//! A catalog is an ordered list of `ModuleMetadata` entries mapping a
//! capability name (`property`) to the module that detects it. Two catalogs
//! feed the resolver: the compiler's built-in one, whose paths are already
//! relative to the compiler's module base, and the user's custom one, whose
//! paths are relative to the project directory. Types here mirror the JSON the
//! compiler emits for its own metadata.

pub mod discover;
pub mod index;

pub use discover::discover_custom_metadata;
pub use index::CatalogIndex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One available detection module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    pub property: String,
    #[serde(alias = "amdPath")]
    pub module_path: String,
}

impl ModuleMetadata {
    pub fn new(property: impl Into<String>, module_path: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            module_path: module_path.into(),
        }
    }
}

/// A `property` field as written in metadata files: a single name or a list.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PropertyNames {
    One(String),
    Many(Vec<String>),
}

impl PropertyNames {
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            PropertyNames::One(name) => vec![name],
            PropertyNames::Many(names) => names,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    property: PropertyNames,
    #[serde(alias = "amdPath")]
    module_path: String,
}

/// Expand raw catalog JSON into one entry per declared property, keeping the
/// original entry order.
pub(crate) fn expand_catalog(value: serde_json::Value) -> Result<Vec<ModuleMetadata>> {
    let raw: Vec<RawMetadata> =
        serde_json::from_value(value).context("catalog must be an array of module metadata")?;
    Ok(raw
        .into_iter()
        .flat_map(|entry| {
            let module_path = entry.module_path;
            entry
                .property
                .into_vec()
                .into_iter()
                .map(move |property| ModuleMetadata::new(property, module_path.clone()))
        })
        .collect())
}

/// Load a catalog from a JSON file holding an array of metadata entries.
pub fn load_catalog_from_path(path: &Path) -> Result<Vec<ModuleMetadata>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading catalog {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    expand_catalog(value).with_context(|| format!("loading catalog {}", path.display()))
}
