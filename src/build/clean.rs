//! Build artifact cleanup (`weld clean`).
//!
//! Removes the build directory with every module's objects and the
//! generated compilation database. The deploy directory is left alone.

use crate::manifest::Manifest;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

pub fn clean(manifest: &Manifest, compile_commands: &Path) -> Result<bool> {
    let mut cleaned = false;

    let build_dir = &manifest.project.build_dir;
    if build_dir.exists() {
        fs::remove_dir_all(build_dir)
            .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
        cleaned = true;
    }

    if compile_commands.exists() {
        fs::remove_file(compile_commands).context("Failed to remove compile commands")?;
        cleaned = true;
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(cleaned)
}
