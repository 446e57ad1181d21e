use super::command::ToolCommand;
use super::compdb::CompileEntry;
use super::error::BuildError;
use super::pool::ProcessPool;
use super::stale::needs_rebuild;
use crate::config::{BuildConfig, FrontEnd};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Knobs shared by every batch of a run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Print each command before it is dispatched
    pub verbose: bool,
    /// Concurrency cap per batch, `None` for one process per stale file
    pub jobs: Option<usize>,
}

/// A source file and the object it compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub input: PathBuf,
    pub output: PathBuf,
    pub front_end: FrontEnd,
}

impl SourceUnit {
    /// `None` when the extension is not a C/C++/Objective-C source.
    pub fn new(input: &Path, build_to: &Path) -> Option<SourceUnit> {
        let front_end = FrontEnd::from_path(input)?;
        let stem = input.file_stem()?.to_string_lossy();
        Some(SourceUnit {
            input: input.to_path_buf(),
            output: build_to.join(format!("{}.o", stem)),
            front_end,
        })
    }
}

/// Result of one builder call.
#[derive(Debug, Default)]
pub struct Batch {
    /// Every object of the module in declaration order, fresh or rebuilt
    pub artifacts: Vec<PathBuf>,
    /// Number of jobs dispatched
    pub compiled: usize,
    /// False if any job failed or could not start
    pub ok: bool,
    pub entries: Vec<CompileEntry>,
}

/// Directories expand to the sources below them, sorted by path; plain
/// files pass through untouched.
pub fn expand_sources(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for file in files {
        if file.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(file)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| FrontEnd::from_path(p).is_some())
                .collect();
            found.sort();
            expanded.extend(found);
        } else {
            expanded.push(file.clone());
        }
    }
    expanded
}

/// Compile the stale files of one module and return all of its objects.
///
/// Setup problems (missing object dir, a missing entry that is not a source
/// file, colliding object names) fail before anything is spawned. A missing
/// source file is simply stale and left to the compiler to report. Job
/// failures come back as `Batch::ok == false`.
pub fn build(
    module: &str,
    config: &BuildConfig,
    files: &[PathBuf],
    options: &BuildOptions,
) -> Result<Batch, BuildError> {
    if !config.build_to.is_dir() {
        return Err(BuildError::MissingOutputDir(config.build_to.clone()));
    }

    let mut units = Vec::new();
    let mut seen = HashSet::new();
    for file in expand_sources(files) {
        if !file.exists() && FrontEnd::from_path(&file).is_none() {
            return Err(BuildError::MissingSource {
                module: module.to_string(),
                path: file,
            });
        }
        let Some(unit) = SourceUnit::new(&file, &config.build_to) else {
            println!(
                "   {} Skipping {} (not a C/C++ source)",
                "!".yellow(),
                file.display()
            );
            continue;
        };
        if !seen.insert(unit.output.clone()) {
            return Err(BuildError::OutputCollision {
                module: module.to_string(),
                output: unit.output,
            });
        }
        units.push(unit);
    }

    let stale: Vec<bool> = units
        .iter()
        .map(|unit| needs_rebuild(&unit.output, std::slice::from_ref(&unit.input)))
        .collect();
    let stale_count = stale.iter().filter(|s| **s).count();

    if stale_count == 0 {
        println!("   {} {} up to date", "⚡".green(), module.bold());
    } else {
        println!(
            "   {} Compiling {} ({} stale / {} files)",
            "⚙".blue(),
            module.bold(),
            stale_count,
            units.len()
        );
    }

    let mut pool = match options.jobs {
        Some(limit) => ProcessPool::with_limit(limit),
        None => ProcessPool::new(),
    }
    .with_progress(batch_progress(module, stale_count));

    let mut batch = Batch {
        ok: true,
        ..Batch::default()
    };

    for (unit, is_stale) in units.iter().zip(&stale) {
        let command = ToolCommand::compile(config, unit.front_end, &unit.input, &unit.output);
        batch.entries.push(CompileEntry::new(&unit.input, &command));
        batch.artifacts.push(unit.output.clone());

        if *is_stale {
            if options.verbose {
                println!("   CMD: {}", command.render().dimmed());
            }
            if !pool.spawn(&command, &unit.input, &unit.output) {
                // Spawn failures short-circuit the rest of the batch
                break;
            }
            batch.compiled += 1;
        }
    }

    batch.ok = pool.wait_all();
    Ok(batch)
}

fn batch_progress(module: &str, len: usize) -> ProgressBar {
    if len == 0 {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let pb = ProgressBar::new(len as u64);
    pb.set_style(style);
    pb.set_message(module.to_string());
    pb
}
