//! JavaScript sources served to the bundler.
//!
//! Every function here is pure: identifiers go in, module source comes out.

use crate::wasm_info::WasmInfo;

/// Prefix of the per-target init helper virtual module ids.
pub const INIT_HELPER_PREFIX: &str = "\0virtual:rs-wasm-bindgen?init";

/// Export that wasm-bindgen expects to be called once after instantiation.
pub const MANUAL_START: &str = "__wbindgen_start";

/// Virtual id of the init helper private to `key`.
pub fn init_helper_id(key: &str) -> String {
    format!("{INIT_HELPER_PREFIX}&{key}")
}

pub fn is_init_helper_id(id: &str) -> bool {
    id.starts_with(INIT_HELPER_PREFIX)
}

/// Quotes `value` as a JS string literal.
fn js_string(value: &str) -> String {
    // A JSON string is a valid JS string literal.
    serde_json::Value::from(value).to_string()
}

/// Source of the init helper module.
///
/// `init()` runs the registered initializer at most once and hands every
/// caller the same promise.
pub fn render_init_helper() -> String {
    "let initPromise = null;
let initSub = null;

export function hookInit(fn) {
  initSub = fn;
}

export function init() {
  if (!initPromise && initSub) {
    initPromise = initSub();
    initSub = null;
  }
  return initPromise;
}
"
    .to_string()
}

/// Source standing in for the `_bg.wasm` file of `key`.
///
/// Each export becomes a live binding assigned after instantiation. The
/// manual-start export is replaced by a no-op; the real one is invoked right
/// after the bindings are assigned.
pub fn render_proxy_module(key: &str, wasm: &WasmInfo) -> String {
    let mut out = String::new();

    let wasm_url = js_string(&format!("./{}?url", wasm.file_name()));
    out.push_str(&format!("import wasmUrl from {wasm_url};\n"));
    out.push_str(&format!(
        "import {{ hookInit }} from {};\n",
        js_string(&init_helper_id(key))
    ));

    let mut import_entries = String::new();
    for (index, module) in wasm.import_modules().iter().enumerate() {
        let module = js_string(module);
        out.push_str(&format!("import * as m{index} from {module};\n"));
        import_entries.push_str(&format!("      [{module}]: m{index},\n"));
    }
    out.push('\n');

    let mut assigns = String::new();
    let mut has_manual_start = false;
    for (index, name) in wasm.export_names().iter().enumerate() {
        if name == MANUAL_START {
            has_manual_start = true;
            continue;
        }
        let name = js_string(name);
        out.push_str(&format!("let x{index} = undefined;\n"));
        out.push_str(&format!("export {{ x{index} as {name} }};\n"));
        assigns.push_str(&format!("        x{index} = exports[{name}];\n"));
    }
    if has_manual_start {
        out.push_str(&format!("export function {MANUAL_START}() {{}}\n"));
    }
    out.push('\n');

    let call_manual_start = if has_manual_start {
        format!("        exports[{}]();\n", js_string(MANUAL_START))
    } else {
        String::new()
    };

    out.push_str(&format!(
        "hookInit(() => {{
  const imports = {{
{import_entries}  }};
  const source = fetch(wasmUrl);
  return WebAssembly.instantiateStreaming(source, imports)
    .then((result) => {{
        const {{ instance }} = result;
        const exports = instance.exports;
{assigns}{call_manual_start}        return instance;
    }});
}});
"
    ));

    out
}

/// Source of the `?init` shim: the init function as default export.
pub fn render_eager_init(key: &str) -> String {
    format!(
        "import {{ init }} from {};\nexport default init;\n",
        js_string(&init_helper_id(key))
    )
}

/// Appends a top-level `await init()` to the wasm-bindgen output.
pub fn render_awaited_transform(code: &str, key: &str) -> String {
    let mut out = String::with_capacity(code.len() + 128);
    out.push_str(code);
    if !code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "import {{ init }} from {};\nawait init();\n",
        js_string(&init_helper_id(key))
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> WasmInfo {
        let bytes = wat::parse_str(
            r#"(module
                (import "env" "log" (func))
                (func $f)
                (export "foo" (func $f))
                (export "bar" (func $f))
                (export "__wbindgen_start" (func $f)))"#,
        )
        .unwrap();
        WasmInfo::from_bytes("app_bg.wasm", &bytes).unwrap()
    }

    #[test]
    fn helper_ids() {
        let id = init_helper_id("gen/app");
        assert_eq!(id, "\0virtual:rs-wasm-bindgen?init&gen/app");
        assert!(is_init_helper_id(&id));
        assert!(!is_init_helper_id("/project/gen/app.js"));
    }

    #[test]
    fn init_helper_memoizes() {
        // The initializer is dropped once it has produced the shared promise,
        // so later `init()` calls can only return that same promise.
        assert_eq!(
            render_init_helper(),
            "let initPromise = null;\n\
             let initSub = null;\n\
             \n\
             export function hookInit(fn) {\n\
             \x20 initSub = fn;\n\
             }\n\
             \n\
             export function init() {\n\
             \x20 if (!initPromise && initSub) {\n\
             \x20   initPromise = initSub();\n\
             \x20   initSub = null;\n\
             \x20 }\n\
             \x20 return initPromise;\n\
             }\n"
        );
    }

    #[test]
    fn proxy_declares_live_exports() {
        let code = render_proxy_module("gen/app", &sample_info());

        assert!(code.contains("import wasmUrl from \"./app_bg.wasm?url\";"));
        assert!(code.contains("import { hookInit } from \"\\u0000virtual:rs-wasm-bindgen?init&gen/app\";"));
        assert!(code.contains("import * as m0 from \"env\";"));
        assert!(code.contains("[\"env\"]: m0,"));

        assert_eq!(code.matches("= undefined;").count(), 2);
        assert!(code.contains("export { x0 as \"foo\" };"));
        assert!(code.contains("export { x1 as \"bar\" };"));
        assert!(!code.contains("as \"__wbindgen_start\""));
        assert!(code.contains("export function __wbindgen_start() {}"));
    }

    #[test]
    fn proxy_starts_after_assignments() {
        let code = render_proxy_module("gen/app", &sample_info());

        let assign = code.find("x1 = exports[\"bar\"];").unwrap();
        let start = code.find("exports[\"__wbindgen_start\"]();").unwrap();
        let resolve = code.find("return instance;").unwrap();
        assert!(assign < start);
        assert!(start < resolve);
    }

    #[test]
    fn proxy_without_manual_start() {
        let bytes = wat::parse_str(r#"(module (func $f) (export "only" (func $f)))"#).unwrap();
        let info = WasmInfo::from_bytes("lib_bg.wasm", &bytes).unwrap();
        let code = render_proxy_module("lib", &info);

        assert!(!code.contains(MANUAL_START));
        assert!(code.contains("export { x0 as \"only\" };"));
        assert!(!code.contains("import * as"));
    }

    #[test]
    fn eager_init_reexports_init() {
        let code = render_eager_init("gen/app");
        assert_eq!(
            code,
            "import { init } from \"\\u0000virtual:rs-wasm-bindgen?init&gen/app\";\nexport default init;\n"
        );
    }

    #[test]
    fn awaited_transform_appends_await() {
        let original = "export * from \"./app_bg.js\";";
        let code = render_awaited_transform(original, "gen/app");

        assert!(code.starts_with(original));
        assert!(code.ends_with("await init();\n"));
        assert!(code.contains("import { init } from"));
    }
}
