use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::{Path, PathBuf};
use weld::build::{ToolCommand, needs_rebuild};
use weld::config::{BuildConfig, FrontEnd};
use weld::manifest::{BUILTIN_MANIFEST, Manifest};
use weld::platform::Platform;

fn bench_manifest_parse(c: &mut Criterion) {
    c.bench_function("parse_builtin_manifest", |b| {
        b.iter(|| Manifest::parse(black_box(BUILTIN_MANIFEST)).unwrap())
    });
}

fn bench_resolve_recipe(c: &mut Criterion) {
    let manifest = Manifest::builtin().unwrap();
    c.bench_function("resolve_recipe_nfd", |b| {
        b.iter(|| manifest.modules["nfd"].resolve(black_box(Platform::Linux)))
    });
}

fn bench_compile_command(c: &mut Criterion) {
    let mut config = BuildConfig::init();
    config.add_include((0..12).map(|i| format!("Libraries/lib{}/include", i)));
    config.add_define(["-std=c++17", "CPPDAP_JSON_NLOHMANN", "-fPIC"]);
    config.build_to = PathBuf::from("build/luau");

    c.bench_function("compile_command", |b| {
        b.iter(|| {
            ToolCommand::compile(
                black_box(&config),
                FrontEnd::Cpp,
                Path::new("Libraries/luau/Ast/src/Parser.cpp"),
                Path::new("build/luau/Parser.o"),
            )
            .render()
        })
    });
}

fn bench_needs_rebuild(c: &mut Criterion) {
    let temp_dir = std::env::temp_dir().join("weld_bench_stale");
    std::fs::create_dir_all(&temp_dir).unwrap();
    let src = temp_dir.join("main.cpp");
    let obj = temp_dir.join("main.o");
    std::fs::write(&src, "int main() { return 0; }").unwrap();
    std::fs::write(&obj, "").unwrap();

    c.bench_function("needs_rebuild_fresh", |b| {
        b.iter(|| needs_rebuild(black_box(&obj), black_box(&[&src])))
    });
}

criterion_group!(
    benches,
    bench_manifest_parse,
    bench_resolve_recipe,
    bench_compile_command,
    bench_needs_rebuild
);
criterion_main!(benches);
