//! # weld - minimal native build orchestrator
//!
//! weld compiles a C/C++ project together with the third-party libraries it
//! vendors, then links everything into one executable.
//!
//! ## Features
//!
//! - **Incremental**: a translation unit is recompiled only when its object is
//!   missing or older than its source
//! - **Parallel**: every stale file of a module compiles as its own process
//! - **Declarative recipes**: libraries are described in `weld.toml`, with
//!   per-platform variants and `pkg-config` lookups
//! - **Ordered link**: objects reach the linker in recipe order
//!
//! ## Module Organization
//!
//! - [`build`] - Staleness check, process pool, builder, recipes and link
//! - [`config`] - Per-module build configuration
//! - [`manifest`] - Recipe table parsing (`weld.toml`)
//! - [`toolchain`] - Compiler selection
//! - [`pkgconfig`] - System package discovery

/// Build engine: staleness, process pool, recipes, link.
pub mod build;

/// Per-module build configuration.
pub mod config;

/// Project manifest and recipe table.
pub mod manifest;

/// System package discovery.
pub mod pkgconfig;

/// Target platform selection.
pub mod platform;

/// Toolchain selection.
pub mod toolchain;
