//! Module recipes.
//!
//! A recipe turns one manifest entry into a derived [`BuildConfig`], runs the
//! builder over its sources and appends the objects to the shared
//! [`ArtifactList`]. Prerequisites run first, depth first in declaration
//! order, so their objects always precede the dependent's on the link line.

use super::builder::{self, BuildOptions};
use super::compdb::CompileEntry;
use super::error::BuildError;
use crate::config::{BuildConfig, FrontEnd};
use crate::manifest::Manifest;
use crate::pkgconfig;
use crate::platform::Platform;
use colored::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered, append-only object list feeding the final link.
#[derive(Debug, Clone, Default)]
pub struct ArtifactList {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl ArtifactList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` unless it is already listed. Returns whether it was added.
    pub fn push(&mut self, path: PathBuf) -> bool {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
            true
        } else {
            false
        }
    }

    pub fn extend<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        for path in paths {
            self.push(path);
        }
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }
}

/// Per-module numbers for the build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub name: String,
    pub objects: usize,
    pub compiled: usize,
}

/// Runs recipes from a manifest, each at most once per run.
pub struct RecipeRunner<'a> {
    manifest: &'a Manifest,
    platform: Platform,
    options: &'a BuildOptions,
    pkg_config_tool: String,
    done: HashSet<String>,
    /// Link flag sources already merged into the parent, so a retried recipe
    /// or a package shared by two modules lands on the link line once.
    merged: HashSet<String>,
    reports: Vec<ModuleReport>,
    entries: Vec<CompileEntry>,
}

impl<'a> RecipeRunner<'a> {
    pub fn new(manifest: &'a Manifest, platform: Platform, options: &'a BuildOptions) -> Self {
        Self {
            manifest,
            platform,
            options,
            pkg_config_tool: pkgconfig::default_tool(),
            done: HashSet::new(),
            merged: HashSet::new(),
            reports: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_pkg_config_tool(mut self, tool: impl Into<String>) -> Self {
        self.pkg_config_tool = tool.into();
        self
    }

    pub fn reports(&self) -> &[ModuleReport] {
        &self.reports
    }

    pub fn into_parts(self) -> (Vec<ModuleReport>, Vec<CompileEntry>) {
        (self.reports, self.entries)
    }

    /// Run `name` after its prerequisites. On failure nothing of `name` is
    /// appended; objects of prerequisites that already succeeded stay.
    pub fn run(
        &mut self,
        name: &str,
        artifacts: &mut ArtifactList,
        parent: &mut BuildConfig,
    ) -> Result<(), BuildError> {
        let mut stack = Vec::new();
        self.visit(name, artifacts, parent, &mut stack)
    }

    fn visit(
        &mut self,
        name: &str,
        artifacts: &mut ArtifactList,
        parent: &mut BuildConfig,
        stack: &mut Vec<String>,
    ) -> Result<(), BuildError> {
        if self.done.contains(name) {
            return Ok(());
        }
        if stack.iter().any(|n| n == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(BuildError::RecipeCycle(chain));
        }

        let manifest = self.manifest;
        let recipe = manifest
            .modules
            .get(name)
            .ok_or_else(|| BuildError::UnknownRecipe(name.to_string()))?;

        stack.push(name.to_string());
        for dep in &recipe.deps {
            self.visit(dep, artifacts, parent, stack)?;
        }
        stack.pop();

        let lists = recipe.resolve(self.platform);
        let mut conf = BuildConfig::derive(parent);
        conf.build_to = manifest.project.build_dir.join(name);
        create_dir(&conf.build_to)?;

        conf.add_include(lists.includes.iter().cloned());
        conf.add_define(lists.defines.iter().cloned());
        conf.add_flag(FrontEnd::C, lists.c_flags.iter().cloned());
        conf.add_flag(FrontEnd::Cpp, lists.cpp_flags.iter().cloned());
        if self.merged.insert(format!("module:{}", name)) {
            parent.merge_link_flags(lists.link.iter().cloned());
        }

        for package in &lists.pkg_config {
            let flags = pkgconfig::discover(&self.pkg_config_tool, package)?;
            if self.options.verbose {
                println!(
                    "   {} {}: libs [{}] cflags [{}]",
                    "📦".blue(),
                    package,
                    flags.libs.join(" "),
                    flags.cflags.join(" ")
                );
            }
            if self.merged.insert(format!("package:{}", package)) {
                parent.merge_link_flags(flags.libs.iter().cloned());
            }
            conf.add_flag(FrontEnd::C, flags.cflags.iter().cloned());
            conf.add_flag(FrontEnd::Cpp, flags.cflags.iter().cloned());
        }

        let batch = builder::build(name, &conf, &lists.sources, self.options)?;
        self.entries.extend(batch.entries);
        if !batch.ok {
            return Err(BuildError::CompileFailed {
                module: name.to_string(),
            });
        }

        self.reports.push(ModuleReport {
            name: name.to_string(),
            objects: batch.artifacts.len(),
            compiled: batch.compiled,
        });
        artifacts.extend(batch.artifacts);
        self.done.insert(name.to_string());
        Ok(())
    }
}

pub(crate) fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
