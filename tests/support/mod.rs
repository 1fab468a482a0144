#![allow(dead_code)]

use anyhow::{Result, bail};
use detect_bundler::{BundleCompiler, CompileRequest, ModuleMetadata};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Scratch project directory with helpers for laying out custom tests and an
// installed compiler.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn mkdir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write a custom detection module carrying a metadata block.
    pub fn custom_test(&self, relative: &str, property: &str) -> Result<PathBuf> {
        self.write(
            relative,
            &format!(
                concat!(
                    "/*!\n{{\n  \"name\": \"{property}\",\n",
                    "  \"property\": \"{property}\"\n}}\n!*/\n",
                    "define(['Modernizr'], function (Modernizr) {{\n",
                    "  Modernizr.addTest('{property}', true);\n",
                    "}});\n",
                ),
                property = property
            ),
        )
    }

    /// Lay out an installed compiler and return its module base directory.
    pub fn install_compiler(&self) -> Result<PathBuf> {
        self.write("node_modules/modernizr/package.json", "{\"name\": \"modernizr\"}")?;
        self.mkdir("node_modules/modernizr/src")
    }
}

pub fn builtin_catalog() -> Vec<ModuleMetadata> {
    vec![
        ModuleMetadata::new("touchevents", "feature-detects/touchevents"),
        ModuleMetadata::new("svg", "feature-detects/svg"),
        ModuleMetadata::new("flexbox", "feature-detects/css/flexbox"),
        ModuleMetadata::new("opacity", "feature-detects/css/opacity"),
    ]
}

// Compiler stand-in that records every request it receives.
#[derive(Default)]
pub struct RecordingCompiler {
    pub requests: RefCell<Vec<CompileRequest>>,
}

impl BundleCompiler for RecordingCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        Ok(format!("/* {} detects */", request.feature_detects.len()))
    }
}

pub struct FailingCompiler;

impl BundleCompiler for FailingCompiler {
    fn compile(&self, _request: &CompileRequest) -> Result<String> {
        bail!("syntax error in feature-detects/broken")
    }
}
