use std::path::PathBuf;

/// Error type for build operations
#[derive(Debug)]
pub enum BuildError {
    /// Object directory does not exist when a batch starts
    MissingOutputDir(PathBuf),
    /// Directory could not be created
    CreateDir { path: PathBuf, source: std::io::Error },
    /// Process could not be started (binary not found, permissions)
    Spawn { program: String, source: std::io::Error },
    /// At least one compile job of a module failed
    CompileFailed { module: String },
    /// The final link exited non-zero
    LinkFailed { output: PathBuf },
    /// A recipe names a module nobody declared
    UnknownRecipe(String),
    /// Recipe dependencies loop back on themselves
    RecipeCycle(Vec<String>),
    /// A declared source entry does not exist and names no compilable file
    MissingSource { module: String, path: PathBuf },
    /// Two sources of one module map to the same object file
    OutputCollision { module: String, output: PathBuf },
    /// pkg-config (or its replacement) failed
    PackageDiscovery { package: String, message: String },
    /// IO error
    Io(std::io::Error),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::MissingOutputDir(path) => {
                write!(f, "Output directory {} does not exist", path.display())
            }
            BuildError::CreateDir { path, source } => {
                write!(f, "Could not create {}: {}", path.display(), source)
            }
            BuildError::Spawn { program, source } => {
                write!(f, "Could not start '{}': {}", program, source)
            }
            BuildError::CompileFailed { module } => {
                write!(f, "Compilation of module '{}' failed", module)
            }
            BuildError::LinkFailed { output } => {
                write!(f, "Linking {} failed", output.display())
            }
            BuildError::UnknownRecipe(name) => write!(f, "Unknown module recipe '{}'", name),
            BuildError::RecipeCycle(chain) => {
                write!(f, "Recipe dependency cycle: {}", chain.join(" -> "))
            }
            BuildError::MissingSource { module, path } => write!(
                f,
                "Source {} of module '{}' does not exist",
                path.display(),
                module
            ),
            BuildError::OutputCollision { module, output } => write!(
                f,
                "Two sources of module '{}' compile to {}",
                module,
                output.display()
            ),
            BuildError::PackageDiscovery { package, message } => {
                write!(f, "Package discovery for '{}' failed: {}", package, message)
            }
            BuildError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::CreateDir { source, .. } | BuildError::Spawn { source, .. } => Some(source),
            BuildError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}
