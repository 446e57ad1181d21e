//! Toolchain selection
//!
//! Maps a compiler family to its C and C++ front-end binaries. `CC` and `CXX`
//! from the environment take precedence over the table.

pub mod types;

pub use types::{CompilerType, Toolchain, ToolchainError};

use std::path::PathBuf;

/// Resolve the toolchain for `compiler_type`, honoring `CC`/`CXX`.
pub fn resolve(compiler_type: CompilerType) -> Toolchain {
    resolve_with(compiler_type, |key| std::env::var(key).ok())
}

fn resolve_with<F>(compiler_type: CompilerType, lookup: F) -> Toolchain
where
    F: Fn(&str) -> Option<String>,
{
    let mut toolchain = Toolchain::new(compiler_type);
    if let Some(cc) = lookup("CC").filter(|v| !v.trim().is_empty()) {
        toolchain.cc_path = PathBuf::from(cc.trim());
    }
    if let Some(cxx) = lookup("CXX").filter(|v| !v.trim().is_empty()) {
        toolchain.cxx_path = PathBuf::from(cxx.trim());
    }
    toolchain
}
