//! Target platform selection for platform-conditional recipe variants.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

impl Platform {
    /// Platform this binary was built for. Other unix flavours use the linux
    /// variants (they share the pkg-config based backends).
    pub fn host() -> Platform {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }

    /// File name of an executable on this platform.
    pub fn executable_name(&self, base: &str) -> String {
        match self {
            Platform::Windows if !base.contains('.') => format!("{}.exe", base),
            _ => base.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win32" | "win" => Ok(Platform::Windows),
            "macos" | "darwin" | "apple" => Ok(Platform::Macos),
            "linux" => Ok(Platform::Linux),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}
