//! Bundler hook adapter.
//!
//! The host bundler is reached only through [`HostConfig`] and
//! [`WatchRegistrar`]; any bundler with resolve/load/transform/watch hooks
//! can drive a [`WasmBindgenPlugin`].

use crate::config::{HostConfig, Options};
use crate::error::Result;
use crate::manager::{BuildReport, Manager};

pub const PLUGIN_NAME: &str = "rs-wasm-bindgen";

/// Lets the plugin ask the host to watch a file or directory.
pub trait WatchRegistrar {
    fn add_watch_file(&mut self, path: &str);
}

/// File system event kind reported by the host's watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// Hook implementations over a [`Manager`].
///
/// The manager is created by [`config_resolved`](Self::config_resolved);
/// before that every hook defers.
pub struct WasmBindgenPlugin {
    options: Options,
    manager: Option<Manager>,
}

impl WasmBindgenPlugin {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            manager: None,
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn manager(&self) -> Option<&Manager> {
        self.manager.as_ref()
    }

    /// Rebuilds the target set for the host's root and mode.
    pub fn config_resolved(&mut self, host: &HostConfig) {
        self.manager = Some(Manager::new(&self.options, host));
    }

    /// Installs an already configured manager, e.g. one with a custom executor.
    pub fn with_manager(options: Options, manager: Manager) -> Self {
        Self {
            options,
            manager: Some(manager),
        }
    }

    /// Automatic build pass plus watch registration of raw wasm directories.
    pub fn build_start(&mut self, registrar: &mut dyn WatchRegistrar) -> BuildReport {
        let Some(manager) = self.manager.as_mut() else {
            return BuildReport::default();
        };

        let report = manager.build_all(false);
        for dir in manager.list_watch_directories() {
            registrar.add_watch_file(&dir);
        }
        report
    }

    pub fn resolve_id(&self, source: &str) -> Option<String> {
        let manager = self.manager.as_ref()?;
        manager
            .is_init_helper_id(source)
            .then(|| source.to_string())
    }

    pub fn load(&self, id: &str, registrar: &mut dyn WatchRegistrar) -> Result<Option<String>> {
        let Some(manager) = self.manager.as_ref() else {
            return Ok(None);
        };

        if manager.is_init_helper_id(id) {
            Ok(Some(manager.load_init_helper()))
        } else if manager.is_bg_wasm_id(id) {
            registrar.add_watch_file(id);
            manager.load_bg_wasm(id)
        } else if manager.is_js_init_id(id) {
            Ok(manager.load_js_init(id))
        } else {
            Ok(None)
        }
    }

    pub fn transform(&self, code: &str, id: &str) -> Option<String> {
        self.manager.as_ref()?.transform_js(code, id)
    }

    pub fn watch_change(&mut self, id: &str, kind: ChangeKind) -> Result<()> {
        if kind == ChangeKind::Delete {
            return Ok(());
        }
        if let Some(manager) = self.manager.as_mut() {
            manager.handle_raw_wasm_change(id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::init_helper_id;
    use crate::config::TargetConfig;
    use crate::executor::testing::FakeRunner;
    use crate::executor::Executor;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Watched(Vec<String>);

    impl WatchRegistrar for Watched {
        fn add_watch_file(&mut self, path: &str) {
            self.0.push(path.to_string());
        }
    }

    fn plugin(runner: &FakeRunner, root: PathBuf, config: TargetConfig) -> WasmBindgenPlugin {
        let options = Options {
            targets: vec![config],
            ..Options::default()
        };
        let host = HostConfig {
            root,
            is_production: true,
        };
        let executor = Executor::with_runner(&options, Box::new(runner.clone()));
        let manager = Manager::with_executor(&options, &host, executor);
        WasmBindgenPlugin::with_manager(options, manager)
    }

    #[test]
    fn hooks_defer_before_config() {
        let mut plugin = WasmBindgenPlugin::new(Options::default());
        let mut watched = Watched::default();

        assert_eq!(plugin.name(), "rs-wasm-bindgen");
        assert!(plugin.resolve_id(&init_helper_id("gen/app")).is_none());
        assert!(plugin.load("/x.js", &mut watched).unwrap().is_none());
        assert!(plugin.build_start(&mut watched).is_success());
        assert!(watched.0.is_empty());
    }

    #[test]
    fn config_resolved_creates_manager() {
        let options = Options {
            targets: vec![TargetConfig::new("gen/app")],
            ..Options::default()
        };
        let mut plugin = WasmBindgenPlugin::new(options);
        plugin.config_resolved(&HostConfig {
            root: PathBuf::from("/project"),
            is_production: false,
        });
        assert_eq!(plugin.manager().unwrap().targets().len(), 1);
    }

    #[test]
    fn build_start_registers_watch_dirs() {
        let runner = FakeRunner::default();
        let mut config = TargetConfig::new("gen/app").with_raw_wasm("/work/out/app.wasm");
        config.watch_raw_wasm = true;
        let mut plugin = plugin(&runner, PathBuf::from("/project"), config);
        let mut watched = Watched::default();

        assert!(plugin.build_start(&mut watched).is_success());
        assert_eq!(watched.0, ["/work/out"]);

        let helper = init_helper_id("gen/app");
        assert_eq!(plugin.resolve_id(&helper).as_deref(), Some(helper.as_str()));
        assert!(plugin.resolve_id("/project/gen/app.js").is_none());

        let code = plugin.load(&helper, &mut watched).unwrap().unwrap();
        assert!(code.contains("export function init()"));
    }

    #[test]
    fn load_serves_proxy_and_watches_bg_wasm() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let runner = FakeRunner::default();
        let mut plugin = plugin(
            &runner,
            root.clone(),
            TargetConfig::new("gen/app").with_raw_wasm("/work/app.wasm"),
        );
        let mut watched = Watched::default();
        plugin.build_start(&mut watched);

        let bg = root.join("gen").join("app_bg.wasm");
        std::fs::create_dir_all(bg.parent().unwrap()).unwrap();
        let bytes = wat::parse_str(
            r#"(module (import "./app_bg.js" "__wbg_log" (func)) (func $f) (export "greet" (func $f)))"#,
        )
        .unwrap();
        std::fs::write(&bg, bytes).unwrap();

        let id = crate::target::normalize_id(&bg);
        let code = plugin.load(&id, &mut watched).unwrap().unwrap();
        assert!(code.contains("export { x0 as \"greet\" };"));
        assert!(code.contains("import * as m0 from \"./app_bg.js\";"));
        assert_eq!(watched.0, [id]);
    }

    #[test]
    fn delete_events_are_ignored() {
        let runner = FakeRunner::default();
        let mut config = TargetConfig::new("gen/app").with_raw_wasm("/work/out/app.wasm");
        config.watch_raw_wasm = true;
        let mut plugin = plugin(&runner, PathBuf::from("/project"), config);
        plugin.build_start(&mut Watched::default());
        runner.calls.borrow_mut().clear();

        plugin
            .watch_change("/work/out/app.wasm", ChangeKind::Delete)
            .unwrap();
        assert!(runner.calls.borrow().is_empty());

        plugin
            .watch_change("/work/out/app.wasm", ChangeKind::Update)
            .unwrap();
        assert_eq!(runner.count("wasm-bindgen"), 1);

        plugin
            .watch_change("/somewhere/else.wasm", ChangeKind::Create)
            .unwrap();
        assert_eq!(runner.count("wasm-bindgen"), 1);
    }
}
