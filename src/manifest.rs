//! Project manifest (`weld.toml`).
//!
//! The manifest is the recipe table: one `[modules.<name>]` entry per library
//! with its sources, include paths, defines and the modules it needs first.
//! Platform-specific pieces live under `[modules.<name>.platform.<os>]` and are
//! merged onto the base entry for the selected target only.

use crate::platform::Platform;
use crate::toolchain::CompilerType;
use anyhow::{Context, Result, bail};
use colored::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "weld.toml";

/// Recipe table used when the working directory has no manifest.
pub const BUILTIN_MANIFEST: &str = include_str!("../recipes/fled.toml");

#[derive(Deserialize, Debug, Clone)]
pub struct Manifest {
    pub project: ProjectConfig,
    #[serde(default)]
    pub modules: BTreeMap<String, Recipe>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    #[serde(default = "default_deploy_dir")]
    pub deploy_dir: PathBuf,
    /// Executable file name, defaults to the project name
    pub executable: Option<String>,
    #[serde(default)]
    pub compiler: CompilerType,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub defines: Vec<String>,
    /// Runtime libraries appended to the link line
    #[serde(default)]
    pub libs: Vec<String>,
    /// Files in the deploy dir removed before every build (runtime state)
    #[serde(default)]
    pub stale_files: Vec<String>,
    /// Recipes to run, in order
    #[serde(default)]
    pub modules: Vec<String>,
}

/// The list fields shared by a recipe and its platform variants.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeLists {
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub includes: Vec<PathBuf>,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub c_flags: Vec<String>,
    #[serde(default)]
    pub cpp_flags: Vec<String>,
    /// Link-only flags, forwarded to the final link
    #[serde(default)]
    pub link: Vec<String>,
    /// Packages to ask pkg-config about
    #[serde(default)]
    pub pkg_config: Vec<String>,
}

impl RecipeLists {
    fn append(&mut self, other: &RecipeLists) {
        self.sources.extend(other.sources.iter().cloned());
        self.includes.extend(other.includes.iter().cloned());
        self.defines.extend(other.defines.iter().cloned());
        self.c_flags.extend(other.c_flags.iter().cloned());
        self.cpp_flags.extend(other.cpp_flags.iter().cloned());
        self.link.extend(other.link.iter().cloned());
        self.pkg_config.extend(other.pkg_config.iter().cloned());
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Recipe {
    /// Modules that must have produced their objects before this one
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(flatten)]
    pub base: RecipeLists,
    #[serde(default)]
    pub platform: BTreeMap<String, RecipeLists>,
}

impl Recipe {
    /// Base lists followed by the variant for `platform`, if any.
    pub fn resolve(&self, platform: Platform) -> RecipeLists {
        let mut lists = self.base.clone();
        if let Some(variant) = self
            .platform
            .iter()
            .find(|(key, _)| key.parse::<Platform>().ok() == Some(platform))
            .map(|(_, v)| v)
        {
            lists.append(variant);
        }
        lists
    }
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_deploy_dir() -> PathBuf {
    PathBuf::from("Deployment")
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Manifest> {
        let manifest: Manifest = toml::from_str(content)
            .context("Failed to parse manifest - check for syntax errors (missing quotes, brackets)")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn builtin() -> Result<Manifest> {
        Self::parse(BUILTIN_MANIFEST).context("Built-in recipe table is invalid")
    }

    /// Object directory of the project's own sources.
    pub fn project_obj_dir(&self) -> PathBuf {
        self.project.build_dir.join(&self.project.name)
    }

    pub fn executable_name(&self, platform: Platform) -> String {
        let base = self
            .project
            .executable
            .clone()
            .unwrap_or_else(|| self.project.name.clone());
        platform.executable_name(&base)
    }

    fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            bail!("[project] name must not be empty");
        }
        if self.modules.contains_key(&self.project.name) {
            bail!(
                "Module '{}' would share its object directory with the project",
                self.project.name
            );
        }

        for name in &self.project.modules {
            if !self.modules.contains_key(name) {
                bail!("[project] modules lists unknown module '{}'", name);
            }
        }

        for (name, recipe) in &self.modules {
            for dep in &recipe.deps {
                if !self.modules.contains_key(dep) {
                    bail!("Module '{}' depends on unknown module '{}'", name, dep);
                }
            }
            for key in recipe.platform.keys() {
                if let Err(e) = key.parse::<Platform>() {
                    bail!("Module '{}': {}", name, e);
                }
            }
        }

        if let Some(chain) = self.find_cycle() {
            bail!("Recipe dependency cycle: {}", chain.join(" -> "));
        }
        Ok(())
    }

    fn find_cycle(&self) -> Option<Vec<String>> {
        fn visit<'a>(
            manifest: &'a Manifest,
            name: &'a str,
            stack: &mut Vec<&'a str>,
            done: &mut HashSet<&'a str>,
        ) -> Option<Vec<String>> {
            if done.contains(name) {
                return None;
            }
            if let Some(pos) = stack.iter().position(|n| *n == name) {
                let mut chain: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
                chain.push(name.to_string());
                return Some(chain);
            }
            stack.push(name);
            if let Some(recipe) = manifest.modules.get(name) {
                for dep in &recipe.deps {
                    if let Some(chain) = visit(manifest, dep, stack, done) {
                        return Some(chain);
                    }
                }
            }
            stack.pop();
            done.insert(name);
            None
        }

        let mut done = HashSet::new();
        for name in self.modules.keys() {
            if let Some(chain) = visit(self, name, &mut Vec::new(), &mut done) {
                return Some(chain);
            }
        }
        None
    }
}

/// Load `path`, or `weld.toml` in the working directory. Without an explicit
/// path and without a manifest on disk the built-in table is used.
pub fn load_manifest(path: Option<&Path>) -> Result<Manifest> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(MANIFEST_FILE);
            if !default.exists() {
                println!(
                    "   {} No {} found, using built-in recipes",
                    "ℹ".blue(),
                    MANIFEST_FILE
                );
                return Manifest::builtin();
            }
            default
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Manifest::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
}
