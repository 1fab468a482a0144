//! Bundle compiler boundary.
//!
//! The resolved module list is handed to an external compiler that emits the
//! final bundle. `BundleCompiler` is the seam; `CommandCompiler` drives a
//! compiler installed as a separate program, writing the request as JSON on
//! its stdin and reading the bundle from its stdout.

use crate::{find_on_path, helper_is_executable};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

pub const ENV_COMPILER_COMMAND: &str = "DETECT_BUNDLE_COMPILER";

/// Everything the compiler receives for one build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompileRequest {
    #[serde(rename = "classPrefix")]
    pub class_prefix: String,
    pub options: Vec<String>,
    pub minify: bool,
    #[serde(rename = "feature-detects")]
    pub feature_detects: Vec<String>,
}

pub trait BundleCompiler {
    /// Compile one bundle. Called exactly once per build.
    fn compile(&self, request: &CompileRequest) -> Result<String>;
}

impl<T: BundleCompiler + ?Sized> BundleCompiler for &T {
    fn compile(&self, request: &CompileRequest) -> Result<String> {
        (**self).compile(request)
    }
}

impl<T: BundleCompiler + ?Sized> BundleCompiler for Box<T> {
    fn compile(&self, request: &CompileRequest) -> Result<String> {
        (**self).compile(request)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

#[derive(Clone, Debug)]
pub struct CommandCompiler {
    command: CommandSpec,
    working_dir: PathBuf,
}

impl CommandCompiler {
    pub fn new(command: CommandSpec, working_dir: &Path) -> Self {
        Self {
            command,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Build a compiler from a whitespace separated command line. The program
    /// is looked up relative to `project_dir`, then in `node_modules/.bin`,
    /// then on `PATH`.
    pub fn from_command_line(line: &str, project_dir: &Path) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(program) = parts.next() else {
            bail!("compiler command is empty");
        };
        let program = resolve_program(program, project_dir)?;
        let command = CommandSpec {
            program: program.into_os_string(),
            args: parts.map(OsString::from).collect(),
        };
        Ok(Self::new(command, project_dir))
    }

    /// Compiler named by `DETECT_BUNDLE_COMPILER`, if set.
    pub fn from_env(project_dir: &Path) -> Result<Option<Self>> {
        match env::var(ENV_COMPILER_COMMAND) {
            Ok(line) if !line.trim().is_empty() => {
                Self::from_command_line(&line, project_dir).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl BundleCompiler for CommandCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<String> {
        let program = Path::new(&self.command.program);
        let payload = serde_json::to_vec(request).context("encoding compile request")?;

        let mut child = Command::new(program)
            .args(&self.command.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute {}", program.display()))?;

        // The request is written from its own thread while stdout and stderr
        // drain, so neither side blocks on a full pipe.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&payload),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output.with_context(|| format!("waiting for {}", program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            match output.status.code() {
                Some(code) => bail!(
                    "{} exited with status {code}: {}",
                    program.display(),
                    stderr.trim()
                ),
                None => bail!("{} terminated by signal", program.display()),
            }
        }

        // A compiler that exits cleanly without reading all of its input closes
        // the pipe early; only other write failures count.
        match written {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
                return Err(err)
                    .with_context(|| format!("writing compile request to {}", program.display()));
            }
            _ => {}
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("{} produced non UTF-8 output", program.display()))
    }
}

fn resolve_program(name: &str, project_dir: &Path) -> Result<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        let resolved = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            project_dir.join(candidate)
        };
        if helper_is_executable(&resolved) {
            return Ok(resolved);
        }
        bail!("compiler '{}' is not an executable file", resolved.display());
    }

    let local = project_dir.join("node_modules").join(".bin").join(name);
    if helper_is_executable(&local) {
        return Ok(local);
    }

    if let Some(path) = find_on_path(name) {
        return Ok(path);
    }

    bail!(
        "Unable to locate compiler '{name}'. \
         Install it, pass --compiler, or set {ENV_COMPILER_COMMAND}."
    )
}
