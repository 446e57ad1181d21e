use crate::config::{BuildConfig, FrontEnd};
use std::path::{Path, PathBuf};
use std::process::Command;

/// One external tool invocation. Built fresh for every dispatch and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `<cc|c++> <mode> -I.. <defines> <front-end flags> -c <input> -o <output>`
    pub fn compile(config: &BuildConfig, front_end: FrontEnd, input: &Path, output: &Path) -> Self {
        let mut args = Vec::new();

        if config.debug {
            args.push("-g".to_string());
            args.push("-O0".to_string());
        } else {
            args.push("-O2".to_string());
        }

        args.extend(include_args(config));
        args.extend(config.defines.iter().map(|d| define_arg(d)));
        args.extend(config.flags_for(front_end).iter().cloned());

        args.push("-c".to_string());
        args.push(input.to_string_lossy().to_string());
        args.push("-o".to_string());
        args.push(output.to_string_lossy().to_string());

        Self::new(config.toolchain.binary(front_end), args)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-like rendering for logs and `compile_commands.json`.
    pub fn render(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .map(|token| {
                if token.is_empty() || token.contains(char::is_whitespace) {
                    format!("\"{}\"", token.replace('"', "\\\""))
                } else {
                    token
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

pub(crate) fn include_args(config: &BuildConfig) -> impl Iterator<Item = String> + '_ {
    config
        .includes
        .iter()
        .map(|path| format!("-I{}", path.display()))
}

/// Bare names become `-DNAME`; anything starting with `-` is a raw flag.
fn define_arg(define: &str) -> String {
    if define.starts_with('-') {
        define.to_string()
    } else {
        format!("-D{}", define)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::{CompilerType, Toolchain};

    fn sample_config() -> BuildConfig {
        let mut config = BuildConfig::init();
        config.toolchain = Toolchain::new(CompilerType::GCC);
        config.add_include(["Libraries/luau/VM/include", "Libraries/luau/Ast/include"]);
        config.add_define(["-std=c++17", "CPPDAP_JSON_NLOHMANN"]);
        config.add_flag(FrontEnd::Cpp, ["-fPIC"]);
        config.add_flag(FrontEnd::C, ["-std=c99"]);
        config
    }

    #[test]
    fn test_compile_command_layout() {
        let cmd = ToolCommand::compile(
            &sample_config(),
            FrontEnd::Cpp,
            Path::new("src/main.cpp"),
            Path::new("build/app/main.o"),
        );
        assert_eq!(cmd.program(), Path::new("g++"));
        assert_eq!(
            cmd.args(),
            [
                "-O2",
                "-ILibraries/luau/VM/include",
                "-ILibraries/luau/Ast/include",
                "-std=c++17",
                "-DCPPDAP_JSON_NLOHMANN",
                "-fPIC",
                "-c",
                "src/main.cpp",
                "-o",
                "build/app/main.o",
            ]
        );
    }

    #[test]
    fn test_c_front_end_uses_c_flags_and_binary() {
        let mut config = sample_config();
        config.debug = true;
        let cmd = ToolCommand::compile(
            &config,
            FrontEnd::C,
            Path::new("rcore.c"),
            Path::new("rcore.o"),
        );
        assert_eq!(cmd.program(), Path::new("gcc"));
        assert_eq!(&cmd.args()[..2], ["-g", "-O0"]);
        assert!(cmd.args().contains(&"-std=c99".to_string()));
        assert!(!cmd.args().contains(&"-fPIC".to_string()));
    }

    #[test]
    fn test_render_quotes_whitespace() {
        let cmd = ToolCommand::new(
            "clang++",
            vec!["-framework AppKit".to_string(), "-o".to_string(), "out".to_string()],
        );
        assert_eq!(cmd.render(), "clang++ \"-framework AppKit\" -o out");
    }
}
