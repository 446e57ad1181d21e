//! # weld CLI Entry Point
//!
//! `weld [build]` builds the project described by `weld.toml`, `weld clean`
//! removes its build directory. Any other subcommand falls back to `build`.
//! The process exits with 0 on success and 1 on any failure.

use anyhow::{Result, anyhow};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use weld::build::{self, BuildOptions, BuildSettings};
use weld::manifest;
use weld::platform::Platform;
use weld::toolchain::CompilerType;

const COMPILE_COMMANDS: &str = "compile_commands.json";

#[derive(Parser)]
#[command(name = "weld")]
#[command(about = "Incremental, parallel native build orchestrator", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(allow_external_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Manifest to read instead of ./weld.toml
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Build without debug info, with optimizations
    #[arg(long, global = true)]
    release: bool,

    /// Show every compile and link command
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Compiler family (clang, gcc)
    #[arg(long, global = true)]
    compiler: Option<String>,

    /// Target platform for recipe variants (windows, macos, linux)
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Maximum compile processes per module [default: one per stale file]
    #[arg(short, long, global = true)]
    jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile stale sources and link the executable
    Build,
    /// Remove the build directory
    Clean,
    #[command(external_subcommand)]
    Other(Vec<String>),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_failure_code(e.kind()));
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{} {:#}", "x".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Help and version requests succeed; every usage error is a failed run.
fn parse_failure_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let manifest = manifest::load_manifest(cli.manifest.as_deref())?;

    match &cli.command {
        Some(Commands::Clean) => {
            build::clean(&manifest, Path::new(COMPILE_COMMANDS))?;
            Ok(())
        }
        Some(Commands::Other(args)) => {
            let name = args.first().map(String::as_str).unwrap_or_default();
            println!(
                "   {} Unknown subcommand '{}', building instead",
                "!".yellow(),
                name
            );
            run_build(cli, &manifest)
        }
        Some(Commands::Build) | None => run_build(cli, &manifest),
    }
}

fn run_build(cli: &Cli, manifest: &manifest::Manifest) -> Result<()> {
    let settings = BuildSettings {
        platform: match &cli.platform {
            Some(p) => p.parse::<Platform>().map_err(|e| anyhow!(e))?,
            None => Platform::host(),
        },
        release: cli.release,
        compiler: cli
            .compiler
            .as_deref()
            .map(str::parse::<CompilerType>)
            .transpose()?,
        compile_commands: Some(PathBuf::from(COMPILE_COMMANDS)),
        options: BuildOptions {
            verbose: cli.verbose,
            jobs: cli.jobs,
        },
        ..BuildSettings::default()
    };

    build::build_project(manifest, &settings)?;
    Ok(())
}
