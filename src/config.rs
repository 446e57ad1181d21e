//! Per-module build configuration.
//!
//! A [`BuildConfig`] is set up once per module and never mutated while its
//! batch is compiling. Children derive from a parent with [`BuildConfig::derive`]:
//! they inherit the toolchain and debug flag, nothing else, and the two values
//! are independent afterwards.

use crate::toolchain::Toolchain;
use std::path::{Path, PathBuf};

/// Language front end a source file is compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontEnd {
    /// C and Objective-C (`.c`, `.m`)
    C,
    /// C++ and Objective-C++ (`.cpp`, `.cc`, `.cxx`, `.mm`)
    Cpp,
}

impl FrontEnd {
    /// Picks the front end from a file extension, `None` for non-sources.
    pub fn from_path(path: &Path) -> Option<FrontEnd> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "c" | "m" => Some(FrontEnd::C),
            "cpp" | "cc" | "cxx" | "mm" => Some(FrontEnd::Cpp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub toolchain: Toolchain,
    pub debug: bool,
    pub includes: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub c_flags: Vec<String>,
    pub cpp_flags: Vec<String>,
    /// Flags only the final link consumes (libraries, frameworks).
    pub link_flags: Vec<String>,
    /// Object directory. Must exist before a batch is built into it.
    pub build_to: PathBuf,
}

impl BuildConfig {
    /// Release mode, default toolchain, empty lists.
    pub fn init() -> Self {
        Self::default()
    }

    /// Fresh config sharing only the toolchain and debug flag of `parent`.
    pub fn derive(parent: &BuildConfig) -> Self {
        Self {
            toolchain: parent.toolchain.clone(),
            debug: parent.debug,
            ..Self::default()
        }
    }

    pub fn add_include<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.includes.extend(paths.into_iter().map(Into::into));
    }

    pub fn add_define<I, S>(&mut self, defines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defines.extend(defines.into_iter().map(Into::into));
    }

    pub fn add_flag<I, S>(&mut self, front_end: FrontEnd, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = match front_end {
            FrontEnd::C => &mut self.c_flags,
            FrontEnd::Cpp => &mut self.cpp_flags,
        };
        list.extend(flags.into_iter().map(Into::into));
    }

    /// Appends link flags verbatim. Multi-token flags (`-framework Cocoa`)
    /// and deliberately repeated archives keep their exact order.
    pub fn merge_link_flags<I, S>(&mut self, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link_flags.extend(flags.into_iter().map(Into::into));
    }

    pub fn flags_for(&self, front_end: FrontEnd) -> &[String] {
        match front_end {
            FrontEnd::C => &self.c_flags,
            FrontEnd::Cpp => &self.cpp_flags,
        }
    }
}
