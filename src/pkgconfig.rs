//! System package discovery through `pkg-config`.
//!
//! The tool is queried once for linker flags and once for compiler flags;
//! its output is split on whitespace and every token becomes one flag.

use crate::build::BuildError;
use std::process::Command;

/// Flags reported for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFlags {
    /// `--libs` output, consumed by the final link
    pub libs: Vec<String>,
    /// `--cflags` output, consumed by the module's compiles
    pub cflags: Vec<String>,
}

/// Query tool: `$PKG_CONFIG` or `pkg-config`.
pub fn default_tool() -> String {
    std::env::var("PKG_CONFIG")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "pkg-config".to_string())
}

pub fn discover(tool: &str, package: &str) -> Result<PackageFlags, BuildError> {
    Ok(PackageFlags {
        libs: query(tool, "--libs", package)?,
        cflags: query(tool, "--cflags", package)?,
    })
}

fn query(tool: &str, kind: &str, package: &str) -> Result<Vec<String>, BuildError> {
    let output = Command::new(tool)
        .arg(kind)
        .arg(package)
        .output()
        .map_err(|e| BuildError::PackageDiscovery {
            package: package.to_string(),
            message: format!("could not run {}: {}", tool, e),
        })?;

    if !output.status.success() {
        return Err(BuildError::PackageDiscovery {
            package: package.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(split_flags(&String::from_utf8_lossy(&output.stdout)))
}

pub fn split_flags(output: &str) -> Vec<String> {
    output.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_flags_handles_newlines_and_runs_of_spaces() {
        let out = "-I/usr/include/dbus-1.0  -I/usr/lib/dbus-1.0/include \n";
        assert_eq!(
            split_flags(out),
            vec!["-I/usr/include/dbus-1.0", "-I/usr/lib/dbus-1.0/include"]
        );
        assert!(split_flags("\n").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_queries_libs_then_cflags() {
        // `echo` stands in for pkg-config and repeats its arguments
        let flags = discover("echo", "dbus-1").unwrap();
        assert_eq!(flags.libs, vec!["--libs", "dbus-1"]);
        assert_eq!(flags.cflags, vec!["--cflags", "dbus-1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_is_an_error() {
        let err = discover("false", "dbus-1").unwrap_err();
        assert!(matches!(err, BuildError::PackageDiscovery { .. }));
        assert!(discover("/nonexistent/pkg-config", "dbus-1").is_err());
    }
}
