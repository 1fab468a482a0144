//! Custom catalog discovery.
//!
//! Custom detection modules carry their metadata in a `/*! { ... } !*/`
//! comment block at the top of the file. When the configuration names a
//! custom-tests directory but supplies no custom catalog, the catalog is built
//! by reading those blocks.

use crate::anchor::normalize_module_path;
use crate::catalog::{ModuleMetadata, PropertyNames};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct MetadataBlock {
    property: PropertyNames,
}

static METADATA_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*!(.*?)!\*/").expect("metadata block pattern"));

/// Build the custom catalog from the modules under `custom_tests_dir`.
///
/// `custom_tests_dir` is relative to `project_dir`; the returned module paths
/// are relative to `project_dir` as well, sorted for determinism.
pub fn discover_custom_metadata(
    project_dir: &Path,
    custom_tests_dir: &str,
) -> Result<Vec<ModuleMetadata>> {
    let root = project_dir.join(custom_tests_dir);
    let mut entries = Vec::new();

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "js") {
            continue;
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("reading custom test {}", path.display()))?;
        let Some(properties) = parse_metadata_block(&source)
            .with_context(|| format!("parsing metadata in {}", path.display()))?
        else {
            tracing::debug!(file = %path.display(), "custom test has no metadata block");
            continue;
        };

        let relative = path
            .strip_prefix(&root)
            .unwrap_or(path)
            .with_extension("");
        let module_path = normalize_module_path(&format!(
            "{}/{}",
            custom_tests_dir,
            relative.to_string_lossy()
        ));
        for property in properties {
            entries.push(ModuleMetadata::new(property, module_path.clone()));
        }
    }

    entries.sort_by(|a, b| {
        a.module_path
            .cmp(&b.module_path)
            .then_with(|| a.property.cmp(&b.property))
    });
    tracing::debug!(count = entries.len(), dir = custom_tests_dir, "discovered custom tests");
    Ok(entries)
}

fn parse_metadata_block(source: &str) -> Result<Option<Vec<String>>> {
    let Some(captures) = METADATA_BLOCK_RE.captures(source) else {
        return Ok(None);
    };
    let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let block: MetadataBlock = serde_json::from_str(body.trim())?;
    Ok(Some(block.property.into_vec()))
}
