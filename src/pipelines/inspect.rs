use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use rs_wasm_bindgen::wasm_info::WasmInfo;

pub fn execute_inspect_pipeline(wasm_path: &Path, json: bool) -> Result<()> {
    let info = WasmInfo::from_file(wasm_path)?;

    if json {
        let out = serde_json::to_string_pretty(&info).context("Failed to serialize wasm info")?;
        println!("{out}");
        return Ok(());
    }

    println!("{} {}", "[WASM]".green().bold(), info.file_name());
    println!("{} imports:", "[INFO]".cyan());
    for module in info.import_modules() {
        println!("  {module}");
    }
    println!("{} exports:", "[INFO]".cyan());
    for name in info.export_names() {
        println!("  {name}");
    }

    Ok(())
}
