use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Builds Rust wasm targets and generates their wasm-bindgen modules
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run cargo build and wasm-bindgen for every configured target
    Build {
        /// Configuration file
        #[arg(short, long, default_value = "rs-wasm-bindgen.toml")]
        config: PathBuf,

        /// Build for production (release profile by default)
        #[arg(short = 'b', long, conflicts_with = "development")]
        production: bool,

        /// Build for development (dev profile by default)
        #[arg(long)]
        development: bool,

        /// Print executed commands
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },

    /// List the import modules and exports of a wasm module
    Inspect {
        /// Path of the wasm file
        wasm: PathBuf,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the JS proxy module generated for a `_bg.wasm` file
    Render {
        /// Target key the proxy belongs to, e.g. src/gen/app
        key: String,

        /// Path of the `_bg.wasm` file
        wasm: PathBuf,
    },
}
