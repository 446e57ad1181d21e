use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::FrontEnd;

/// Supported compiler families
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::upper_case_acronyms)]
pub enum CompilerType {
    /// Clang/LLVM (clang, clang++)
    #[default]
    Clang,
    /// GNU Compiler Collection (gcc, g++)
    GCC,
}

impl CompilerType {
    /// Default binary name for a front end.
    pub fn binary(&self, front_end: FrontEnd) -> &'static str {
        match (self, front_end) {
            (CompilerType::Clang, FrontEnd::C) => "clang",
            (CompilerType::Clang, FrontEnd::Cpp) => "clang++",
            (CompilerType::GCC, FrontEnd::C) => "gcc",
            (CompilerType::GCC, FrontEnd::Cpp) => "g++",
        }
    }
}

impl FromStr for CompilerType {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clang" | "clang++" => Ok(CompilerType::Clang),
            "gcc" | "g++" => Ok(CompilerType::GCC),
            other => Err(ToolchainError::Unknown(other.to_string())),
        }
    }
}

/// Toolchain selector shared by every module of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler_type: CompilerType,

    /// C front-end binary
    pub cc_path: PathBuf,

    /// C++ front-end binary, also used to link
    pub cxx_path: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(CompilerType::default())
    }
}

impl Toolchain {
    pub fn new(compiler_type: CompilerType) -> Self {
        Self {
            compiler_type,
            cc_path: PathBuf::from(compiler_type.binary(FrontEnd::C)),
            cxx_path: PathBuf::from(compiler_type.binary(FrontEnd::Cpp)),
        }
    }

    /// Explicit binaries, e.g. a cross compiler or a wrapper script.
    pub fn with_paths(
        compiler_type: CompilerType,
        cc_path: impl Into<PathBuf>,
        cxx_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler_type,
            cc_path: cc_path.into(),
            cxx_path: cxx_path.into(),
        }
    }

    pub fn binary(&self, front_end: FrontEnd) -> &Path {
        match front_end {
            FrontEnd::C => &self.cc_path,
            FrontEnd::Cpp => &self.cxx_path,
        }
    }

    pub fn linker(&self) -> &Path {
        &self.cxx_path
    }
}

/// Error type for toolchain selection
#[derive(Debug)]
pub enum ToolchainError {
    /// Compiler name not in the lookup table
    Unknown(String),
}

impl std::fmt::Display for ToolchainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolchainError::Unknown(name) => {
                write!(f, "Unknown compiler '{}' (expected clang or gcc)", name)
            }
        }
    }
}

impl std::error::Error for ToolchainError {}
