mod cli;
mod pipelines;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Print a single line instead of the error chain debug output.
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            config,
            production,
            development,
            verbose,
        } => {
            let mode = match (production, development) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            pipelines::execute_build_pipeline(&config, mode, verbose)
        }
        Commands::Inspect { wasm, json } => pipelines::execute_inspect_pipeline(&wasm, json),
        Commands::Render { key, wasm } => pipelines::execute_render_pipeline(&key, &wasm),
    }
}
