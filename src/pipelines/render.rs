use anyhow::Result;
use std::path::Path;

use rs_wasm_bindgen::codegen;
use rs_wasm_bindgen::wasm_info::WasmInfo;

pub fn execute_render_pipeline(key: &str, wasm_path: &Path) -> Result<()> {
    let info = WasmInfo::from_file(wasm_path)?;
    print!("{}", codegen::render_proxy_module(key, &info));
    Ok(())
}
