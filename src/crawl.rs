//! Capability references in task-runner input files.
//!
//! Scripts reference detects as `Modernizr.<name>` (or `Modernizr['<name>']`),
//! stylesheets through the classes the compiler sets on the root element:
//! `.<prefix><name>` and `.<prefix>no-<name>`. Only names some catalog knows
//! are reported.

use crate::catalog::CatalogIndex;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceKind {
    Script,
    Stylesheet,
}

impl SourceKind {
    fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => Some(SourceKind::Script),
            "css" | "scss" | "sass" | "less" | "styl" => Some(SourceKind::Stylesheet),
            _ => None,
        }
    }
}

static SCRIPT_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bModernizr\s*(?:\.\s*([A-Za-z_$][\w$]*)|\[\s*['"]([^'"]+)['"]\s*\])"#)
        .expect("script reference pattern")
});

/// Comments, `url(...)` arguments and quoted strings; none of them hold selectors.
static STYLESHEET_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)/\*.*?\*/|(?i:url)\([^)]*\)|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#)
        .expect("stylesheet noise pattern")
});

/// The prelude of a rule: the text before each `{`.
static RULE_PRELUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]*)\{").expect("rule prelude pattern"));

static CLASS_SELECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(-?[_A-Za-z][\w-]*)").expect("class selector pattern"));

/// Collect the known capability names referenced by `sources`.
///
/// Files with an unrecognized extension are skipped.
pub fn crawl_sources(
    sources: &[PathBuf],
    index: &CatalogIndex,
    class_prefix: &str,
) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    for path in sources {
        let Some(kind) = SourceKind::for_path(path) else {
            tracing::debug!(file = %path.display(), "skipping source with unknown type");
            continue;
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading source {}", path.display()))?;
        let before = found.len();
        match kind {
            SourceKind::Script => scan_script(&text, index, &mut found),
            SourceKind::Stylesheet => scan_stylesheet(&text, index, class_prefix, &mut found),
        }
        tracing::debug!(
            file = %path.display(),
            new = found.len() - before,
            "crawled source"
        );
    }
    Ok(found)
}

fn scan_script(text: &str, index: &CatalogIndex, found: &mut BTreeSet<String>) {
    for captures in SCRIPT_REFERENCE_RE.captures_iter(text) {
        let name = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str());
        if let Some(name) = name.filter(|name| index.contains(name)) {
            found.insert(name.to_string());
        }
    }
}

fn scan_stylesheet(
    text: &str,
    index: &CatalogIndex,
    class_prefix: &str,
    found: &mut BTreeSet<String>,
) {
    let cleaned = STYLESHEET_NOISE_RE.replace_all(text, " ");
    let selectors = RULE_PRELUDE_RE
        .captures_iter(&cleaned)
        .filter_map(|captures| captures.get(1));
    for prelude in selectors {
        for captures in CLASS_SELECTOR_RE.captures_iter(prelude.as_str()) {
            let Some(class) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let Some(unprefixed) = class.strip_prefix(class_prefix) else {
                continue;
            };
            let name = unprefixed.strip_prefix("no-").unwrap_or(unprefixed);
            if index.contains(name) {
                found.insert(name.to_string());
            }
        }
    }
}
