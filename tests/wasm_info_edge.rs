use rs_wasm_bindgen::WasmInfo;
use std::io::Write;
use tempfile::NamedTempFile;

const CORE_MODULE_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

fn write_temp(bytes: &[u8]) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    Ok(file)
}

#[test]
fn header_only_module_is_empty() -> anyhow::Result<()> {
    let file = write_temp(&CORE_MODULE_HEADER)?;
    let info = WasmInfo::from_file(file.path())?;
    assert!(info.import_modules().is_empty());
    assert!(info.export_names().is_empty());
    Ok(())
}

#[test]
fn file_name_is_basename() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app_bg.wasm");
    std::fs::write(&path, CORE_MODULE_HEADER)?;
    let info = WasmInfo::from_file(&path)?;
    assert_eq!(info.file_name(), "app_bg.wasm");
    Ok(())
}

#[test]
fn rejects_truncated_magic() -> anyhow::Result<()> {
    let file = write_temp(&[0x00, 0x61, 0x73, 0x6d])?;
    let err = WasmInfo::from_file(file.path()).unwrap_err();
    assert!(err.is_introspection_error());
    Ok(())
}

#[test]
fn rejects_truncated_section() -> anyhow::Result<()> {
    let bytes = [
        0x00, 0x61, 0x73, 0x6d, // magic
        0x01, 0x00, 0x00, 0x00, // version
        0x01, 0x01, // type section id + size, but missing payload
    ];
    let file = write_temp(&bytes)?;
    let err = WasmInfo::from_file(file.path()).unwrap_err();
    assert!(err.is_introspection_error());
    Ok(())
}

#[test]
fn rejects_large_section_length() -> anyhow::Result<()> {
    let bytes = [
        0x00, 0x61, 0x73, 0x6d, // magic
        0x01, 0x00, 0x00, 0x00, // version
        0x01, 0xff, 0xff, 0xff, 0xff, 0x0f, // type section, length = 0x1fffffff
    ];
    let file = write_temp(&bytes)?;
    assert!(WasmInfo::from_file(file.path()).is_err());
    Ok(())
}

#[test]
fn rejects_component() -> anyhow::Result<()> {
    let bytes = [
        0x00, 0x61, 0x73, 0x6d, // magic
        0x0d, 0x00, 0x01, 0x00, // component encoding
    ];
    let file = write_temp(&bytes)?;
    assert!(WasmInfo::from_file(file.path()).is_err());
    Ok(())
}

#[test]
fn rejects_empty_input() -> anyhow::Result<()> {
    let file = write_temp(&[])?;
    assert!(WasmInfo::from_file(file.path()).is_err());
    Ok(())
}

#[test]
fn missing_file_is_read_error() {
    let err = WasmInfo::from_file(std::path::Path::new("/nonexistent/app_bg.wasm")).unwrap_err();
    assert!(err.is_introspection_error());
    assert!(err.to_string().contains("failed to read"));
}
