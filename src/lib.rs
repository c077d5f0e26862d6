//! Cargo + wasm-bindgen integration for JS bundlers.
//!
//! A [`Manager`] owns one [`Target`] per configured output prefix. Each
//! target runs `cargo build`, locates the raw wasm through `cargo metadata`
//! and runs `wasm-bindgen --target bundler`. The manager then routes bundler
//! ids to generated JS that instantiates the `_bg.wasm` lazily.

pub mod codegen;
pub mod config;
pub mod error;
pub mod executor;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod plugin;
pub mod target;
pub mod wasm_info;

pub use config::{HostConfig, Options, Profile, SkipPolicy, TargetConfig};
pub use error::{Error, ErrorKind, Result};
pub use manager::{BuildReport, Manager};
pub use plugin::{ChangeKind, WasmBindgenPlugin, WatchRegistrar};
pub use target::{Target, TargetStatus};
pub use wasm_info::WasmInfo;
