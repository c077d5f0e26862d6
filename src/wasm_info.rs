use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;
use wasmparser::{Encoding, Parser as WasmParser, Payload, Validator};

/// Import/export table of a compiled core wasm module.
///
/// Built fresh on every load of a `_bg.wasm` id; never cached, since the
/// file may have been regenerated in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WasmInfo {
    file_name: String,
    import_modules: Vec<String>,
    export_names: Vec<String>,
}

impl WasmInfo {
    /// Reads, validates and reflects the module at `wasm_path`.
    pub fn from_file(wasm_path: &Path) -> Result<Self> {
        let bytes = std::fs::read(wasm_path).map_err(|source| Error::WasmRead {
            path: wasm_path.to_path_buf(),
            source,
        })?;

        let file_name = wasm_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::from_bytes(file_name, &bytes).map_err(|message| Error::WasmInvalid {
            path: wasm_path.to_path_buf(),
            message,
        })
    }

    /// Validates `bytes` and collects import module names and export names,
    /// deduplicated in first-occurrence order.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> std::result::Result<Self, String> {
        Validator::new()
            .validate_all(bytes)
            .map_err(|e| e.to_string())?;

        let mut import_modules: Vec<String> = Vec::new();
        let mut export_names: Vec<String> = Vec::new();

        for payload in WasmParser::new(0).parse_all(bytes) {
            match payload.map_err(|e| e.to_string())? {
                Payload::Version {
                    encoding: Encoding::Component,
                    ..
                } => return Err("expected a core module, found a component".to_string()),
                Payload::ImportSection(reader) => {
                    for import in reader {
                        let import = import.map_err(|e| e.to_string())?;
                        push_unique(&mut import_modules, import.module);
                    }
                }
                Payload::ExportSection(reader) => {
                    for export in reader {
                        let export = export.map_err(|e| e.to_string())?;
                        push_unique(&mut export_names, export.name);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            file_name: file_name.into(),
            import_modules,
            export_names,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn import_modules(&self) -> &[String] {
        &self.import_modules
    }

    pub fn export_names(&self) -> &[String] {
        &self.export_names
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_duplicate_import_modules() {
        let bytes = wat::parse_str(
            r#"(module
                (import "env" "a" (func))
                (import "./app_bg.js" "b" (func))
                (import "env" "c" (func))
                (func $f)
                (export "foo" (func $f))
                (export "bar" (func $f)))"#,
        )
        .unwrap();

        let info = WasmInfo::from_bytes("app_bg.wasm", &bytes).unwrap();
        assert_eq!(info.file_name(), "app_bg.wasm");
        assert_eq!(info.import_modules(), ["env", "./app_bg.js"]);
        assert_eq!(info.export_names(), ["foo", "bar"]);
    }

    #[test]
    fn empty_module_has_no_tables() {
        let bytes = wat::parse_str("(module)").unwrap();
        let info = WasmInfo::from_bytes("empty.wasm", &bytes).unwrap();
        assert!(info.import_modules().is_empty());
        assert!(info.export_names().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(WasmInfo::from_bytes("x.wasm", &[0xde, 0xad, 0xbe, 0xef]).is_err());
    }

    #[test]
    fn rejects_invalid_body() {
        // Function declared in the function section but no code section.
        let bytes = [
            0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type section: () -> ()
            0x03, 0x02, 0x01, 0x00, // function section: one func of type 0
        ];
        assert!(WasmInfo::from_bytes("x.wasm", &bytes).is_err());
    }
}
