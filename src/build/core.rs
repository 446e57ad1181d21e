use super::builder::{self, BuildOptions};
use super::compdb::write_compile_commands;
use super::error::BuildError;
use super::link::{link, link_command};
use super::recipe::{ArtifactList, ModuleReport, RecipeRunner, create_dir};
use crate::config::BuildConfig;
use crate::manifest::Manifest;
use crate::platform::Platform;
use crate::toolchain::{self, CompilerType, Toolchain};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Phase of one build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    PreparingOutputDirs,
    RunningRecipes,
    Linking,
    Succeeded,
    Failed,
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BuildState::Idle => "idle",
            BuildState::PreparingOutputDirs => "preparing output directories",
            BuildState::RunningRecipes => "running module recipes",
            BuildState::Linking => "linking",
            BuildState::Succeeded => "succeeded",
            BuildState::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Command-line overrides on top of the manifest.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub platform: Platform,
    /// Force release mode regardless of the manifest's `debug`
    pub release: bool,
    pub compiler: Option<CompilerType>,
    /// Explicit binaries; skips the table and `CC`/`CXX`
    pub toolchain: Option<Toolchain>,
    pub pkg_config_tool: Option<String>,
    /// Where to write `compile_commands.json`, if at all
    pub compile_commands: Option<PathBuf>,
    pub options: BuildOptions,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            platform: Platform::host(),
            release: false,
            compiler: None,
            toolchain: None,
            pkg_config_tool: None,
            compile_commands: None,
            options: BuildOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub state: BuildState,
    pub executable: PathBuf,
    pub modules: Vec<ModuleReport>,
    /// Objects compiled for the project's own sources
    pub own_compiled: usize,
    pub own_objects: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn compiled(&self) -> usize {
        self.own_compiled + self.modules.iter().map(|m| m.compiled).sum::<usize>()
    }

    pub fn objects(&self) -> usize {
        self.own_objects + self.modules.iter().map(|m| m.objects).sum::<usize>()
    }
}

struct BuildRun {
    state: BuildState,
    verbose: bool,
}

impl BuildRun {
    fn enter(&mut self, state: BuildState) {
        if self.verbose {
            println!("   {} {} -> {}", "·".dimmed(), self.state, state);
        }
        self.state = state;
    }
}

/// Build every module recipe, the project's own sources, then link.
pub fn build_project(
    manifest: &Manifest,
    settings: &BuildSettings,
) -> Result<BuildReport, BuildError> {
    let start_time = Instant::now();
    let mut run = BuildRun {
        state: BuildState::Idle,
        verbose: settings.options.verbose,
    };

    match run_phases(&mut run, manifest, settings, start_time) {
        Ok(report) => {
            println!(
                "{} Build finished in {:.2?} ({} modules, {} compiled, {} up to date) -> {}",
                "✓".green(),
                report.elapsed,
                report.modules.len(),
                report.compiled(),
                report.objects() - report.compiled(),
                report.executable.display()
            );
            Ok(report)
        }
        Err(e) => {
            println!("{} Build failed while {}: {}", "x".red(), run.state, e);
            run.enter(BuildState::Failed);
            Err(e)
        }
    }
}

fn run_phases(
    run: &mut BuildRun,
    manifest: &Manifest,
    settings: &BuildSettings,
    start_time: Instant,
) -> Result<BuildReport, BuildError> {
    let project = &manifest.project;

    // 1. Output directories
    run.enter(BuildState::PreparingOutputDirs);
    create_dir(&project.build_dir)?;
    create_dir(&project.deploy_dir)?;
    for stale in &project.stale_files {
        let path = project.deploy_dir.join(stale);
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    let own_dir = manifest.project_obj_dir();
    create_dir(&own_dir)?;

    // 2. Root configuration shared with every recipe
    let mut config = BuildConfig::init();
    config.toolchain = match &settings.toolchain {
        Some(tc) => tc.clone(),
        None => toolchain::resolve(settings.compiler.unwrap_or(project.compiler)),
    };
    config.debug = project.debug && !settings.release;
    config.add_include(project.includes.iter().cloned());
    config.add_define(project.defines.iter().cloned());

    run.enter(BuildState::RunningRecipes);
    println!(
        "{} Building {} ({}, {})",
        "🚀".blue(),
        project.name.bold(),
        settings.platform,
        if config.debug { "debug" } else { "release" }
    );

    let mut artifacts = ArtifactList::new();
    let mut runner = RecipeRunner::new(manifest, settings.platform, &settings.options);
    if let Some(tool) = &settings.pkg_config_tool {
        runner = runner.with_pkg_config_tool(tool.clone());
    }
    for name in &project.modules {
        runner.run(name, &mut artifacts, &mut config)?;
    }
    let (modules, mut entries) = runner.into_parts();

    config.build_to = own_dir;
    let own = builder::build(&project.name, &config, &project.sources, &settings.options)?;
    entries.extend(own.entries);
    if !own.ok {
        return Err(BuildError::CompileFailed {
            module: project.name.clone(),
        });
    }

    if let Some(dest) = &settings.compile_commands {
        let cwd = std::env::current_dir()?;
        if let Err(e) = write_compile_commands(&entries, &cwd, dest) {
            println!(
                "   {} Could not write {}: {}",
                "!".yellow(),
                dest.display(),
                e
            );
        }
    }

    // 3. Link
    run.enter(BuildState::Linking);
    let executable = project
        .deploy_dir
        .join(manifest.executable_name(settings.platform));
    let command = link_command(&config, &artifacts, &own.artifacts, &executable, &project.libs);
    link(&command, &executable, settings.options.verbose)?;

    run.enter(BuildState::Succeeded);
    Ok(BuildReport {
        state: run.state,
        executable,
        modules,
        own_compiled: own.compiled,
        own_objects: own.artifacts.len(),
        elapsed: start_time.elapsed(),
    })
}
