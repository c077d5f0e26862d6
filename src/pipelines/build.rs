use anyhow::Result;
use colored::*;
use std::path::Path;
use std::time::Instant;

use rs_wasm_bindgen::config;
use rs_wasm_bindgen::manager::Manager;

/// Manual build pass.
///
/// Flow:
/// 1. Load the configuration file
/// 2. Build every target (`auto` skip flags do not apply)
/// 3. Report failures
pub fn execute_build_pipeline(
    config_path: &Path,
    production: Option<bool>,
    verbose: bool,
) -> Result<()> {
    let start_time = Instant::now();

    // --- 1. Configuration ---
    let (mut options, host) = config::load(config_path, production)?;
    options.verbose |= verbose;

    if options.targets.is_empty() {
        println!(
            "{} No targets configured in {}",
            "[WARN]".yellow(),
            config_path.display()
        );
        return Ok(());
    }

    println!(
        "{} Building {} target(s) [{}]",
        "[rs-wasm]".green().bold(),
        options.targets.len(),
        if host.is_production {
            "production"
        } else {
            "development"
        }
    );

    // --- 2. Build ---
    let mut manager = Manager::new(&options, &host);
    let report = manager.build_all(true);

    for target in manager.targets() {
        if let Some(js_id) = target.js_id() {
            println!(
                "{} {} -> {} (profile={}, debug={})",
                "[INFO]".cyan(),
                target.key(),
                js_id,
                target.profile().name(),
                target.debug_build()
            );
        }
    }

    // --- 3. Report ---
    if !report.is_success() {
        let keys: Vec<&str> = report.failures.iter().map(|f| f.key.as_str()).collect();
        anyhow::bail!(
            "{} of {} target(s) failed: {}",
            report.failures.len(),
            report.statuses.len(),
            keys.join(", ")
        );
    }

    let duration = start_time.elapsed();
    println!(
        "{} Build completed in {:.2}s",
        "[DONE]".green().bold(),
        duration.as_secs_f64()
    );

    Ok(())
}
