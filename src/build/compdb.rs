use super::command::ToolCommand;
use super::error::BuildError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One `compile_commands.json` record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompileEntry {
    pub file: String,
    pub command: String,
}

impl CompileEntry {
    pub fn new(file: &Path, command: &ToolCommand) -> Self {
        Self {
            file: file.to_string_lossy().to_string(),
            command: command.render(),
        }
    }
}

#[derive(Serialize)]
struct Record<'a> {
    directory: &'a str,
    command: &'a str,
    file: &'a str,
}

/// Write the compilation database for editors and clangd.
pub fn write_compile_commands(
    entries: &[CompileEntry],
    directory: &Path,
    dest: &Path,
) -> Result<(), BuildError> {
    let directory = directory.to_string_lossy();
    let records: Vec<Record> = entries
        .iter()
        .map(|e| Record {
            directory: &directory,
            command: &e.command,
            file: &e.file,
        })
        .collect();
    let json = serde_json::to_string_pretty(&records).map_err(std::io::Error::other)?;
    fs::write(dest, json)?;
    Ok(())
}
