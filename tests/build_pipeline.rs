//! End-to-end tests for the build pipeline.
//!
//! A small shell script stands in for the compiler: in compile mode it writes
//! the `-o` object (or fails when the source contains `COMPILE_ERROR`), in link
//! mode it writes its whole argument list into the executable so tests can
//! inspect link order.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use tempfile::{TempDir, tempdir};
use weld::build::{
    self, ArtifactList, BuildError, BuildOptions, BuildSettings, BuildState, RecipeRunner,
};
use weld::config::BuildConfig;
use weld::manifest::Manifest;
use weld::platform::Platform;
use weld::toolchain::{CompilerType, Toolchain};

const FAKE_CC: &str = r#"#!/bin/sh
all="$*"
out=""
src=""
while [ $# -gt 0 ]; do
    case "$1" in
        -o) out="$2"; shift 2 ;;
        -c) src="$2"; shift 2 ;;
        *) shift ;;
    esac
done
if [ -n "$src" ]; then
    if grep -q COMPILE_ERROR "$src"; then
        echo "$src: error: boom" >&2
        exit 1
    fi
    echo "object of $src" > "$out"
else
    echo "$all" > "$out"
fi
"#;

/// Every test that spawns processes goes through here first, so the script is
/// fully written before any fork happens in this binary.
fn fake_cc() -> &'static Path {
    static FAKE: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_dir, path) = FAKE.get_or_init(|| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fakecc");
        fs::write(&path, FAKE_CC).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

fn settings() -> BuildSettings {
    let cc = fake_cc();
    BuildSettings {
        platform: Platform::Linux,
        toolchain: Some(Toolchain::with_paths(CompilerType::Clang, cc, cc)),
        ..BuildSettings::default()
    }
}

fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Source files are backdated so objects written later are always newer.
fn write_source(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    set_mtime(path, SystemTime::now() - Duration::from_secs(3600));
}

struct Project {
    dir: TempDir,
    manifest: Manifest,
}

impl Project {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn exe(&self) -> PathBuf {
        self.path("Deployment/app")
    }
}

/// Two library modules (`liba`, `libb`) and a `top` module depending on
/// both, plus the project's own `src/main.cpp`.
fn sample_project(roots: &str) -> Project {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_source(&root.join("liba/a1.c"), "int a1;");
    write_source(&root.join("liba/a2.c"), "int a2;");
    write_source(&root.join("libb/b1.cpp"), "int b1;");
    write_source(&root.join("top/t1.cpp"), "int t1;");
    write_source(&root.join("src/main.cpp"), "int main() { return 0; }");

    let r = root.display();
    let manifest = Manifest::parse(&format!(
        r#"
[project]
name = "app"
build_dir = '{r}/build'
deploy_dir = '{r}/Deployment'
stale_files = ["imgui.ini"]
sources = ['{r}/src']
includes = ['{r}/src']
libs = ["-lm"]
modules = [{roots}]

[modules.liba]
sources = ['{r}/liba/a1.c', '{r}/liba/a2.c']
defines = ["-fPIC"]

[modules.libb]
sources = ['{r}/libb']
link = ["-lpthread"]

[modules.top]
deps = ["liba", "libb"]
sources = ['{r}/top/t1.cpp']
"#
    ))
    .unwrap();

    Project { dir, manifest }
}

fn link_args(project: &Project) -> Vec<String> {
    fs::read_to_string(project.exe())
        .unwrap()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_end_to_end_two_modules() {
    let project = sample_project(r#""liba""#);
    let report = build::build_project(&project.manifest, &settings()).unwrap();

    assert_eq!(report.state, BuildState::Succeeded);
    // a1.c, a2.c and main.cpp
    assert_eq!(report.compiled(), 3);
    assert_eq!(report.executable, project.exe());

    let deployed: Vec<_> = fs::read_dir(project.path("Deployment"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(deployed, vec![std::ffi::OsString::from("app")]);

    let args = link_args(&project);
    let a1 = project.path("build/liba/a1.o").display().to_string();
    let a2 = project.path("build/liba/a2.o").display().to_string();
    let main = project.path("build/app/main.o").display().to_string();
    let pos = |s: &str| args.iter().position(|a| a == s).unwrap();
    assert!(pos(&a1) < pos(&a2));
    assert!(pos(&a2) < pos(&main));
    assert!(pos(&main) < pos("-o"));
    assert_eq!(args.last().map(String::as_str), Some("-lm"));
}

#[test]
fn test_second_build_spawns_nothing() {
    let project = sample_project(r#""top""#);
    let first = build::build_project(&project.manifest, &settings()).unwrap();
    assert_eq!(first.compiled(), 5);
    let first_link = link_args(&project);

    let second = build::build_project(&project.manifest, &settings()).unwrap();
    assert_eq!(second.compiled(), 0);
    assert_eq!(second.objects(), first.objects());
    assert_eq!(link_args(&project), first_link);
}

#[test]
fn test_touching_one_source_rebuilds_only_it() {
    let project = sample_project(r#""top""#);
    build::build_project(&project.manifest, &settings()).unwrap();

    set_mtime(
        &project.path("liba/a2.c"),
        SystemTime::now() + Duration::from_secs(60),
    );
    let report = build::build_project(&project.manifest, &settings()).unwrap();
    assert_eq!(report.compiled(), 1);
    let liba = report.modules.iter().find(|m| m.name == "liba").unwrap();
    assert_eq!(liba.compiled, 1);
    assert!(report.modules.iter().filter(|m| m.name != "liba").all(|m| m.compiled == 0));
}

#[test]
fn test_artifacts_follow_declaration_order() {
    let cc = fake_cc();
    let dir = tempdir().unwrap();
    let files: Vec<PathBuf> = ["f1.c", "f2.c", "f3.c"]
        .iter()
        .map(|f| dir.path().join(f))
        .collect();
    for f in &files {
        write_source(f, "int x;");
    }
    let obj_dir = dir.path().join("obj");
    fs::create_dir(&obj_dir).unwrap();
    // f1 and f3 are up to date, f2 has no object yet
    fs::write(obj_dir.join("f1.o"), "").unwrap();
    fs::write(obj_dir.join("f3.o"), "").unwrap();

    let mut config = BuildConfig::init();
    config.toolchain = Toolchain::with_paths(CompilerType::Clang, cc, cc);
    config.build_to = obj_dir.clone();

    let batch = build::build("m", &config, &files, &BuildOptions::default()).unwrap();
    assert!(batch.ok);
    assert_eq!(batch.compiled, 1);
    assert_eq!(
        batch.artifacts,
        vec![obj_dir.join("f1.o"), obj_dir.join("f2.o"), obj_dir.join("f3.o")]
    );
    assert!(obj_dir.join("f2.o").exists());
}

#[test]
fn test_prerequisites_precede_dependent() {
    let cc = fake_cc();
    let project = sample_project(r#""top""#);
    let options = BuildOptions::default();
    let mut runner = RecipeRunner::new(&project.manifest, Platform::Linux, &options);
    let mut artifacts = ArtifactList::new();
    let mut parent = BuildConfig::init();
    parent.toolchain = Toolchain::with_paths(CompilerType::Clang, cc, cc);

    runner.run("top", &mut artifacts, &mut parent).unwrap();
    // Running again (or through another dependent) adds nothing
    runner.run("liba", &mut artifacts, &mut parent).unwrap();

    let build_dir = project.path("build");
    assert_eq!(
        artifacts.as_slice(),
        [
            build_dir.join("liba/a1.o"),
            build_dir.join("liba/a2.o"),
            build_dir.join("libb/b1.o"),
            build_dir.join("top/t1.o"),
        ]
    );
    assert_eq!(parent.link_flags, vec!["-lpthread"]);
}

#[test]
fn test_compile_error_fails_build_and_leaves_no_object() {
    let project = sample_project(r#""top""#);
    write_source(&project.path("liba/a1.c"), "COMPILE_ERROR");

    let err = build::build_project(&project.manifest, &settings()).unwrap_err();
    assert!(matches!(err, BuildError::CompileFailed { ref module } if module == "liba"));

    // The sibling job still ran to completion
    assert!(project.path("build/liba/a2.o").exists());
    assert!(!project.path("build/liba/a1.o").exists());
    // Dependents of the failed module never ran
    assert!(!project.path("build/top").exists());
    assert!(!project.exe().exists());

    // Fixing the source retries exactly that unit
    write_source(&project.path("liba/a1.c"), "int a1;");
    let report = build::build_project(&project.manifest, &settings()).unwrap();
    let liba = report.modules.iter().find(|m| m.name == "liba").unwrap();
    assert_eq!(liba.compiled, 1);
}

#[test]
fn test_stale_runtime_file_is_removed() {
    let project = sample_project("");
    fs::create_dir_all(project.path("Deployment")).unwrap();
    fs::write(project.path("Deployment/imgui.ini"), "[Window]").unwrap();

    build::build_project(&project.manifest, &settings()).unwrap();
    assert!(!project.path("Deployment/imgui.ini").exists());
    assert!(project.exe().exists());
}

#[test]
fn test_missing_cxx_compiler_fails_before_link() {
    let cc = fake_cc();
    let project = sample_project("");
    let mut settings = settings();
    settings.toolchain = Some(Toolchain::with_paths(
        CompilerType::Clang,
        cc,
        project.root().join("no-such-cxx"),
    ));
    // main.cpp needs the C++ front end, which cannot be spawned
    let err = build::build_project(&project.manifest, &settings).unwrap_err();
    assert!(matches!(err, BuildError::CompileFailed { .. }));
    assert!(!project.exe().exists());
}

#[test]
fn test_compile_commands_written() {
    let project = sample_project(r#""liba""#);
    let mut settings = settings();
    let db = project.path("compile_commands.json");
    settings.compile_commands = Some(db.clone());
    build::build_project(&project.manifest, &settings).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&db).unwrap()).unwrap();
    let files: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["file"].as_str().unwrap())
        .collect();
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("a1.c"));
    assert!(files[2].ends_with("main.cpp"));
}
