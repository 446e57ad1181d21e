mod builder;
mod clean;
mod command;
mod compdb;
mod core;
mod error;
mod link;
mod pool;
mod recipe;
mod stale;

pub use builder::{Batch, BuildOptions, SourceUnit, build, expand_sources};
pub use clean::clean;
pub use command::ToolCommand;
pub use compdb::{CompileEntry, write_compile_commands};
pub use self::core::{BuildReport, BuildSettings, BuildState, build_project};
pub use error::BuildError;
pub use link::{link, link_command};
pub use pool::{Job, JobState, ProcessPool};
pub use recipe::{ArtifactList, ModuleReport, RecipeRunner};
pub use stale::needs_rebuild;
