//! Build pipeline.
//!
//! Validates the custom-tests location, assembles both catalogs, crawls the
//! input files, resolves the module list and hands it to the compiler. The
//! resolved configuration is always logged before the compiler runs so a
//! failed build still shows what was asked of it.

use crate::anchor::ResolverAnchor;
use crate::catalog::{CatalogIndex, ModuleMetadata, discover_custom_metadata};
use crate::compiler::{BundleCompiler, CompileRequest};
use crate::config::BuildConfig;
use crate::crawl::crawl_sources;
use crate::custom_path::validate_custom_tests_path_in;
use crate::resolver::{Resolution, Resolver};
use anyhow::{Context, Result, bail};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Everything decided before the compiler is invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildPlan {
    pub request: CompileRequest,
    pub resolution: Resolution,
    /// The validated custom-tests directory, if one was configured and exists.
    pub custom_tests: Option<String>,
    /// Names found by crawling the input files.
    pub crawled: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledBundle {
    pub source: String,
    pub feature_detects: Vec<String>,
}

impl CompiledBundle {
    /// Write the bundle to `output`, or to stdout when no path is given.
    pub fn emit(&self, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                fs::write(path, &self.source)
                    .with_context(|| format!("writing bundle {}", path.display()))
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(self.source.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

pub struct BundleBuilder<'a, C> {
    anchor: &'a ResolverAnchor,
    compiler: C,
    project_dir: PathBuf,
}

impl<'a, C> BundleBuilder<'a, C> {
    pub fn new(anchor: &'a ResolverAnchor, compiler: C) -> Self {
        Self {
            anchor,
            compiler,
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Directory custom-tests paths and custom module paths are relative to.
    pub fn with_project_dir(mut self, project_dir: &Path) -> Self {
        self.project_dir = project_dir.to_path_buf();
        self
    }

    pub fn plan(&self, config: &BuildConfig, sources: &[PathBuf]) -> Result<BuildPlan> {
        let custom_tests =
            validate_custom_tests_path_in(&self.project_dir, config.custom_tests.as_deref());
        if let (Some(configured), None) = (&config.custom_tests, &custom_tests) {
            tracing::debug!(path = %configured, "ignoring custom tests path");
        }

        let custom: Cow<'_, [ModuleMetadata]> = match &custom_tests {
            Some(dir) if config.custom_metadata.is_empty() => {
                Cow::Owned(discover_custom_metadata(&self.project_dir, dir)?)
            }
            _ => Cow::Borrowed(config.custom_metadata.as_slice()),
        };

        let index = CatalogIndex::new([&*custom, config.metadata.as_slice()]);
        if !index.duplicates().is_empty() {
            tracing::debug!(duplicates = ?index.duplicates(), "properties declared more than once");
        }

        let crawled = if config.crawl && !sources.is_empty() {
            crawl_sources(sources, &index, &config.class_prefix)?
        } else {
            BTreeSet::new()
        };

        let requested = config.tests.iter().chain(crawled.iter());
        let resolution = Resolver::new(self.anchor).resolve_detailed(
            requested,
            &config.exclude_tests,
            &custom,
            &config.metadata,
        );

        if config.strict && !resolution.unresolved.is_empty() {
            bail!(
                "no detection module for: {}",
                resolution.unresolved.join(", ")
            );
        }

        let request = CompileRequest {
            class_prefix: config.class_prefix.clone(),
            options: config.options.clone(),
            minify: config.minify,
            feature_detects: resolution.modules.clone(),
        };

        Ok(BuildPlan {
            request,
            resolution,
            custom_tests,
            crawled,
        })
    }
}

impl<C: BundleCompiler> BundleBuilder<'_, C> {
    /// Plan, log the resolved configuration, then compile once.
    pub fn build(&self, config: &BuildConfig, sources: &[PathBuf]) -> Result<CompiledBundle> {
        let plan = self.plan(config, sources)?;
        let summary = BuildSummary::new(&plan.request);
        tracing::info!(
            features = plan.request.feature_detects.len(),
            minify = plan.request.minify,
            "{summary}"
        );

        let source = self
            .compiler
            .compile(&plan.request)
            .context("bundle compiler failed")?;

        Ok(CompiledBundle {
            source,
            feature_detects: plan.request.feature_detects,
        })
    }
}

/// Human readable description of a compile request.
pub struct BuildSummary<'a> {
    request: &'a CompileRequest,
}

impl<'a> BuildSummary<'a> {
    pub fn new(request: &'a CompileRequest) -> Self {
        Self { request }
    }
}

impl fmt::Display for BuildSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">> User build options:")?;

        if self.request.options.is_empty() {
            writeln!(f, "- options: undefined")?;
        } else {
            let mut options: Vec<&str> = self.request.options.iter().map(String::as_str).collect();
            options.sort_unstable();
            writeln!(f, "- options: [\"{}\"]", options.join("\", \""))?;
        }

        if self.request.class_prefix.is_empty() {
            writeln!(f, "- classPrefix: undefined")?;
        } else {
            writeln!(f, "- classPrefix: \"{}\"", self.request.class_prefix)?;
        }

        writeln!(f, "- minify: {}", self.request.minify)?;
        writeln!(f, "- feature-detects: [")?;
        for module in &self.request.feature_detects {
            writeln!(f, "  \"{module}\"")?;
        }
        writeln!(f, "]")?;
        write!(f, ">> Building your bundle")
    }
}
