use super::command::{ToolCommand, include_args};
use super::error::BuildError;
use super::recipe::ArtifactList;
use crate::config::BuildConfig;
use colored::*;
use std::path::{Path, PathBuf};

/// `<c++> -I.. <module objects> <own objects> -o <exe> <flags> <libs>`
///
/// Module objects keep recipe order; static archive resolution depends on it.
pub fn link_command(
    config: &BuildConfig,
    artifacts: &ArtifactList,
    own_objects: &[PathBuf],
    output: &Path,
    runtime_libs: &[String],
) -> ToolCommand {
    let mut args: Vec<String> = include_args(config).collect();
    args.extend(artifacts.iter().map(|p| p.to_string_lossy().to_string()));
    args.extend(own_objects.iter().map(|p| p.to_string_lossy().to_string()));
    args.push("-o".to_string());
    args.push(output.to_string_lossy().to_string());
    args.extend(config.cpp_flags.iter().cloned());
    args.extend(config.link_flags.iter().cloned());
    args.extend(runtime_libs.iter().cloned());
    ToolCommand::new(config.toolchain.linker(), args)
}

/// Run the link in the foreground with inherited output.
pub fn link(command: &ToolCommand, output: &Path, verbose: bool) -> Result<(), BuildError> {
    if verbose {
        println!("   CMD: {}", command.render().dimmed());
    }
    println!("   {} Linking {}...", "🔗".cyan(), output.display());

    let status = command
        .to_command()
        .status()
        .map_err(|source| BuildError::Spawn {
            program: command.program().display().to_string(),
            source,
        })?;

    if !status.success() {
        return Err(BuildError::LinkFailed {
            output: output.to_path_buf(),
        });
    }
    Ok(())
}
