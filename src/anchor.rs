//! Resolver-relative path anchor.
//!
//! The bundle compiler resolves module references relative to its own module
//! base directory, while custom detection modules live somewhere under the
//! user's project. `ResolverAnchor` holds the relative path between the two and
//! rewrites custom module paths so the compiler can find them. It is computed
//! once per process and handed to the resolver explicitly.

use crate::find_compiler_base;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::{Component, Path};
use std::sync::OnceLock;

static PROCESS_ANCHOR: OnceLock<ResolverAnchor> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverAnchor {
    relative: String,
}

impl ResolverAnchor {
    /// Anchor from the compiler's module base directory to `project_dir`.
    ///
    /// Both paths are compared lexically; callers pass absolute paths.
    pub fn between(compiler_base: &Path, project_dir: &Path) -> Self {
        let from = lexical_components(compiler_base);
        let to = lexical_components(project_dir);
        let shared = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = vec![".."; from.len() - shared];
        segments.extend(to[shared..].iter().map(String::as_str));
        Self {
            relative: segments.join("/"),
        }
    }

    /// Anchor from an already computed relative path.
    pub fn from_relative(relative: &str) -> Self {
        let normalized = normalize_module_path(relative);
        let relative = if normalized == "." {
            String::new()
        } else {
            normalized
        };
        Self { relative }
    }

    /// The anchor for this process, computed on first use from the located
    /// compiler base and the current directory.
    pub fn process() -> Result<&'static ResolverAnchor> {
        if let Some(anchor) = PROCESS_ANCHOR.get() {
            return Ok(anchor);
        }
        let cwd = env::current_dir().context("reading current directory")?;
        let base = find_compiler_base(&cwd)?;
        let anchor = ResolverAnchor::between(&base, &cwd);
        tracing::debug!(anchor = %anchor, base = %base.display(), "computed resolver anchor");
        let _ = PROCESS_ANCHOR.set(anchor);
        PROCESS_ANCHOR
            .get()
            .context("resolver anchor was not initialized")
    }

    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Rewrite a project-relative module path so it is relative to the
    /// compiler's module base.
    pub fn rewrite(&self, module_path: &str) -> String {
        if self.relative.is_empty() {
            return normalize_module_path(module_path);
        }
        normalize_module_path(&format!("{}/{}", self.relative, module_path))
    }
}

impl fmt::Display for ResolverAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.relative)
        }
    }
}

/// Normalize a module path to forward slashes, dropping `.` and empty
/// segments and folding `..` into the preceding segment where possible.
pub fn normalize_module_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn lexical_components(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                parts.push(prefix.as_os_str().to_string_lossy().into_owned())
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }
    parts
}
