//! Command-line front end for feature-detect bundle builds.
//!
//! `build` resolves the requested detects and runs the configured compiler,
//! `resolve` stops after resolution and prints the module list as JSON, and
//! `check-path` reports whether a custom-tests directory is usable. Flags
//! override the values read from `--config`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use detect_bundler::{
    BuildConfig, BundleBuilder, CommandCompiler, ResolverAnchor, load_catalog_from_path,
    split_list, validate_custom_tests_path,
};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser)]
#[command(name = "detect-bundle", version, about = "Build a minimal feature-detect bundle")]
struct Cli {
    /// Log resolution details.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the requested detects and compile the bundle.
    Build(BuildArgs),
    /// Resolve the requested detects and print the module list as JSON.
    Resolve(BuildArgs),
    /// Print the custom-tests path if it names an existing directory.
    CheckPath { path: String },
}

#[derive(Args)]
struct BuildArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Capability names to detect (comma or space separated).
    #[arg(long)]
    tests: Option<String>,
    /// Capability names to leave out (comma or space separated).
    #[arg(long)]
    exclude: Option<String>,
    #[arg(long)]
    class_prefix: Option<String>,
    /// Compiler option flag; repeatable.
    #[arg(long = "option")]
    options: Vec<String>,
    #[arg(long)]
    minify: bool,
    /// Built-in catalog JSON file.
    #[arg(long)]
    metadata: Option<PathBuf>,
    /// Custom catalog JSON file.
    #[arg(long)]
    custom_metadata: Option<PathBuf>,
    /// Directory of custom detection modules.
    #[arg(long)]
    custom_tests: Option<String>,
    /// Fail when a requested name has no detection module.
    #[arg(long)]
    strict: bool,
    /// Do not scan the source files for referenced detects.
    #[arg(long)]
    no_crawl: bool,
    /// Compiler command line.
    #[arg(long)]
    compiler: Option<String>,
    /// Output file for the bundle (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Source files to crawl for referenced detects.
    sources: Vec<PathBuf>,
}

impl BuildArgs {
    fn into_config(self) -> Result<(BuildConfig, Vec<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load(path)?,
            None => BuildConfig::default(),
        };

        if let Some(tests) = &self.tests {
            config.tests.extend(split_list(tests));
        }
        if let Some(exclude) = &self.exclude {
            config.exclude_tests.extend(split_list(exclude));
        }
        if let Some(prefix) = self.class_prefix {
            config.class_prefix = prefix;
        }
        config.options.extend(self.options);
        config.minify |= self.minify;
        config.strict |= self.strict;
        if self.no_crawl {
            config.crawl = false;
        }
        if let Some(path) = &self.metadata {
            config.metadata = load_catalog_from_path(path)?;
        }
        if let Some(path) = &self.custom_metadata {
            config.custom_metadata = load_catalog_from_path(path)?;
        }
        if self.custom_tests.is_some() {
            config.custom_tests = self.custom_tests;
        }
        if self.compiler.is_some() {
            config.compiler = self.compiler;
        }
        if self.output.is_some() {
            config.output = self.output;
        }

        Ok((config, self.sources))
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => build(args),
        Command::Resolve(args) => resolve(args),
        Command::CheckPath { path } => check_path(&path),
    }
}

fn init_tracing(verbose: bool) {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("detect_bundler=debug")
    } else {
        EnvFilter::new("detect_bundler=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build(args: BuildArgs) -> Result<()> {
    let (config, sources) = args.into_config()?;
    let project_dir = env::current_dir().context("reading current directory")?;
    let compiler = match &config.compiler {
        Some(line) => CommandCompiler::from_command_line(line, &project_dir)?,
        None => CommandCompiler::from_env(&project_dir)?.context(
            "no bundle compiler configured; pass --compiler or set DETECT_BUNDLE_COMPILER",
        )?,
    };

    let anchor = ResolverAnchor::process()?;
    let bundle = BundleBuilder::new(anchor, compiler)
        .with_project_dir(&project_dir)
        .build(&config, &sources)?;
    bundle.emit(config.output.as_deref())
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    #[serde(rename = "feature-detects")]
    feature_detects: &'a [String],
    unresolved: &'a [String],
}

fn resolve(args: BuildArgs) -> Result<()> {
    let (config, sources) = args.into_config()?;
    let project_dir = env::current_dir().context("reading current directory")?;
    let anchor = ResolverAnchor::process()?;
    let plan = BundleBuilder::new(anchor, ())
        .with_project_dir(&project_dir)
        .plan(&config, &sources)?;

    let report = ResolveReport {
        feature_detects: &plan.resolution.modules,
        unresolved: &plan.resolution.unresolved,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check_path(path: &str) -> Result<()> {
    match validate_custom_tests_path(Some(path)) {
        Some(valid) => {
            println!("{valid}");
            Ok(())
        }
        None => std::process::exit(1),
    }
}
