//! Feature-detect bundle resolution.
//!
//! Turns a declared set of capability names (plus exclusions and user-supplied
//! custom detection modules) into the concrete list of module references an
//! external bundle compiler expects, then delegates the actual bundling.

pub mod anchor;
pub mod bundle;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod crawl;
pub mod custom_path;
pub mod resolver;

pub use anchor::{ResolverAnchor, normalize_module_path};
pub use bundle::{BuildPlan, BuildSummary, BundleBuilder, CompiledBundle};
pub use catalog::{
    CatalogIndex, ModuleMetadata, discover_custom_metadata, load_catalog_from_path,
};
pub use compiler::{BundleCompiler, CommandCompiler, CompileRequest};
pub use config::BuildConfig;
pub use crawl::crawl_sources;
pub use custom_path::{validate_custom_tests_path, validate_custom_tests_path_in};
pub use resolver::{Resolution, ResolvedModuleList, Resolver};

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Marker file identifying an installed copy of the default compiler.
const COMPILER_SENTINEL: &str = "node_modules/modernizr/package.json";
/// Directory the default compiler resolves `feature-detects/...` references from.
const COMPILER_MODULE_BASE: &str = "node_modules/modernizr/src";
const ENV_COMPILER_BASE: &str = "DETECT_COMPILER_BASE";

fn is_compiler_install(candidate: &Path) -> bool {
    candidate.join(COMPILER_SENTINEL).is_file()
}

fn compiler_base_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.is_dir() {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_compiler_install(&dir) {
            return Some(dir.join(COMPILER_MODULE_BASE));
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the directory the bundle compiler resolves module references from.
///
/// Search order: `DETECT_COMPILER_BASE`, then an upward search from `start`
/// for an installed compiler.
pub fn find_compiler_base(start: &Path) -> Result<PathBuf> {
    if let Ok(env_base) = env::var(ENV_COMPILER_BASE) {
        if let Some(base) = compiler_base_from_hint(&env_base) {
            return Ok(base);
        }
    }

    if let Some(base) = search_upwards(start) {
        return Ok(base);
    }

    bail!(
        "Unable to locate the bundle compiler under {}. \
         Install it or set {ENV_COMPILER_BASE} to its module directory.",
        start.display()
    );
}

/// Split a comma and/or whitespace separated list of names.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Search `PATH` for an executable named `name`.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| helper_is_executable(candidate))
}

pub fn helper_is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}
