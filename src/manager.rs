//! Target collection and the id routing tables queried by the bundler hooks.

use crate::codegen;
use crate::config::{HostConfig, Options};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::logger::Logger;
use crate::target::{normalize_id, Step, Target, TargetStatus};
use crate::wasm_info::WasmInfo;
use std::collections::BTreeMap;
use std::path::Path;

/// A target that failed during a pass.
#[derive(Debug)]
pub struct TargetFailure {
    pub key: String,
    pub step: Step,
    pub error: Error,
}

/// Outcome of [`Manager::build_all`].
#[derive(Debug, Default)]
pub struct BuildReport {
    pub statuses: Vec<(String, TargetStatus)>,
    pub failures: Vec<TargetFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Routing tables, keyed by normalized id; values index `Manager::targets`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Routes {
    raw_wasm: BTreeMap<String, usize>,
    bg_wasm: BTreeMap<String, usize>,
    /// Value carries the target's `use_await` flag.
    js: BTreeMap<String, (usize, bool)>,
    js_init: BTreeMap<String, usize>,
}

impl Routes {
    /// Watched raw wasm paths are routed whatever the status, so a failed
    /// bind can be retried by the next change. Output ids need `Bound`.
    fn insert(&mut self, index: usize, target: &Target) {
        if let Some(path) = target.watch_path() {
            self.raw_wasm.insert(path.to_string(), index);
        }
        if target.status() != TargetStatus::Bound {
            return;
        }
        if let Some(id) = target.bg_wasm_id() {
            self.bg_wasm.insert(id, index);
        }
        let use_await = target.config().use_await;
        if let Some(id) = target.js_id() {
            self.js.insert(id, (index, use_await));
        }
        if !use_await {
            if let Some(id) = target.js_init_id() {
                self.js_init.insert(id, index);
            }
        }
    }

    fn remove(&mut self, index: usize) {
        self.raw_wasm.retain(|_, i| *i != index);
        self.bg_wasm.retain(|_, i| *i != index);
        self.js.retain(|_, (i, _)| *i != index);
        self.js_init.retain(|_, i| *i != index);
    }
}

/// Owns every target and dispatches bundler ids to them.
pub struct Manager {
    targets: Vec<Target>,
    executor: Executor,
    logger: Logger,
    routes: Routes,
}

impl Manager {
    pub fn new(options: &Options, host: &HostConfig) -> Self {
        Self::with_executor(options, host, Executor::new(options))
    }

    pub fn with_executor(options: &Options, host: &HostConfig, executor: Executor) -> Self {
        let logger = executor.logger();

        let targets = options
            .targets
            .iter()
            .map(|config| {
                if Path::new(&config.key).extension().is_some() {
                    logger.warn(format!("target key \"{}\" has an extension", config.key));
                }
                Target::new(config.clone(), host)
            })
            .collect();

        Self {
            targets,
            executor,
            logger,
            routes: Routes::default(),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Runs every target's pipeline in declaration order and rebuilds the
    /// routing tables from scratch.
    pub fn build_all(&mut self, manual: bool) -> BuildReport {
        self.routes = Routes::default();
        let mut report = BuildReport::default();

        for target in &mut self.targets {
            if let Err(failure) = target.build(&self.executor, manual) {
                self.logger
                    .error(format!("FAILED {}: {}", failure.step, failure.error));
                report.failures.push(TargetFailure {
                    key: target.key().to_string(),
                    step: failure.step,
                    error: failure.error,
                });
            }
            report
                .statuses
                .push((target.key().to_string(), target.status()));
        }

        for (index, target) in self.targets.iter().enumerate() {
            self.routes.insert(index, target);
        }

        report
    }

    /// Parent directories of every watched raw wasm.
    pub fn list_watch_directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for target in &self.targets {
            let Some(parent) = target
                .watch_path()
                .and_then(|path| Path::new(path).parent())
            else {
                continue;
            };
            let dir = normalize_id(parent);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Re-runs bindgen for the target watching `path`.
    ///
    /// Returns `Ok(false)` when no target watches it.
    pub fn handle_raw_wasm_change(&mut self, path: &str) -> Result<bool> {
        let id = normalize_id(Path::new(path));
        let Some(&index) = self.routes.raw_wasm.get(&id) else {
            return Ok(false);
        };
        let target = &mut self.targets[index];
        if !target.config().watch_raw_wasm {
            return Ok(false);
        }

        self.logger
            .info(format!("raw-wasm of \"{}\" changed: {id}", target.key()));

        let result = target.rebind(&self.executor);
        self.routes.remove(index);
        self.routes.insert(index, target);

        match result {
            Ok(()) => Ok(true),
            Err(failure) => {
                self.logger
                    .error(format!("FAILED {}: {}", failure.step, failure.error));
                Err(failure.error)
            }
        }
    }

    pub fn is_raw_wasm_id(&self, id: &str) -> bool {
        self.routes.raw_wasm.contains_key(id)
    }

    pub fn is_init_helper_id(&self, id: &str) -> bool {
        codegen::is_init_helper_id(id)
    }

    pub fn is_bg_wasm_id(&self, id: &str) -> bool {
        self.routes.bg_wasm.contains_key(id)
    }

    pub fn is_js_id(&self, id: &str) -> bool {
        self.routes.js.contains_key(id)
    }

    pub fn is_js_init_id(&self, id: &str) -> bool {
        self.routes.js_init.contains_key(id)
    }

    pub fn load_init_helper(&self) -> String {
        codegen::render_init_helper()
    }

    /// Introspects the `_bg.wasm` behind `id` and renders its proxy module.
    pub fn load_bg_wasm(&self, id: &str) -> Result<Option<String>> {
        let Some(&index) = self.routes.bg_wasm.get(id) else {
            return Ok(None);
        };
        let target = &self.targets[index];
        let wasm = WasmInfo::from_file(Path::new(id))?;
        Ok(Some(codegen::render_proxy_module(target.key(), &wasm)))
    }

    pub fn load_js_init(&self, id: &str) -> Option<String> {
        let &index = self.routes.js_init.get(id)?;
        Some(codegen::render_eager_init(self.targets[index].key()))
    }

    /// Adds the top-level await to wasm-bindgen output of `use_await` targets.
    pub fn transform_js(&self, code: &str, id: &str) -> Option<String> {
        let &(index, use_await) = self.routes.js.get(id)?;
        if !use_await {
            return None;
        }
        Some(codegen::render_awaited_transform(
            code,
            self.targets[index].key(),
        ))
    }

    #[cfg(test)]
    fn route_keys(&self) -> Vec<Vec<String>> {
        vec![
            self.routes.raw_wasm.keys().cloned().collect(),
            self.routes.bg_wasm.keys().cloned().collect(),
            self.routes.js.keys().cloned().collect(),
            self.routes.js_init.keys().cloned().collect(),
        ]
    }
}
