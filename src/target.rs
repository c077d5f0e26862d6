use crate::config::{HostConfig, Profile, TargetConfig};
use crate::error::Error;
use crate::executor::{Executor, StepOutcome};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Pipeline step, used to report where a target failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Build,
    Resolve,
    Bind,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Build => "building raw-wasm",
            Step::Resolve => "resolving raw-wasm path",
            Step::Bind => "generating module",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Unbuilt,
    BuildAttempted,
    PathResolved,
    Bound,
    Failed(Step),
}

/// A step failure, tagged with the step it happened in.
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: Error,
}

/// File names produced by a successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundOutputs {
    pub js_file: String,
    pub bg_wasm_file: String,
}

/// Lexically resolves `.` and `..` components without touching the file
/// system. A `..` at the root is dropped; leading `..` of a relative path
/// are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalized, forward-slash form of a path, the convention of bundler ids.
pub fn normalize_id(path: &Path) -> String {
    normalize_path(path).to_string_lossy().replace('\\', "/")
}

/// One configured wasm module and its build state.
#[derive(Debug)]
pub struct Target {
    config: TargetConfig,
    profile: Profile,
    status: TargetStatus,

    raw_wasm_path: Option<PathBuf>,
    out_dir: PathBuf,
    out_name: String,
    debug_build: bool,
    watch_path: Option<String>,
    outputs: Option<BoundOutputs>,
}

impl Target {
    /// Derives the output location from the key once; it never changes
    /// afterwards.
    pub fn new(config: TargetConfig, host: &HostConfig) -> Self {
        let output_prefix = normalize_path(&host.root.join(&config.key));
        let out_dir = output_prefix
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| host.root.clone());
        let out_name = output_prefix
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let profile = config.profile.clone().unwrap_or(if host.is_production {
            Profile::Release
        } else {
            Profile::Dev
        });

        let raw_wasm_path = config
            .raw_wasm_path
            .as_ref()
            .map(|p| normalize_path(&host.root.join(p)));

        let mut target = Self {
            config,
            profile,
            status: TargetStatus::Unbuilt,
            raw_wasm_path,
            out_dir,
            out_name,
            debug_build: false,
            watch_path: None,
            outputs: None,
        };
        target.sync_watch_path();
        target
    }

    /// Runs build, path resolution and bind in order, stopping at the first
    /// fatal failure. Skipped steps do not stop the pipeline.
    pub fn build(&mut self, executor: &Executor, manual: bool) -> Result<(), StepFailure> {
        self.status = TargetStatus::Unbuilt;
        self.outputs = None;

        let outcome = executor
            .build_raw_wasm(&self.config, &self.profile, manual)
            .map_err(|error| self.fail(Step::Build, error))?;
        if outcome != StepOutcome::Skipped {
            self.debug_build = self.profile.is_debug();
        }
        self.status = TargetStatus::BuildAttempted;

        let resolved = executor
            .resolve_raw_wasm_path(&self.config, &self.profile)
            .map_err(|error| self.fail(Step::Resolve, error))?;
        if let Some(path) = resolved {
            self.raw_wasm_path = Some(normalize_path(&path));
            self.sync_watch_path();
        }
        self.status = TargetStatus::PathResolved;

        self.bind(executor, manual)
    }

    /// Re-runs only the bind step with the state of the previous pass.
    pub fn rebind(&mut self, executor: &Executor) -> Result<(), StepFailure> {
        self.bind(executor, false)
    }

    fn bind(&mut self, executor: &Executor, manual: bool) -> Result<(), StepFailure> {
        executor
            .generate_bindings(
                &self.config,
                self.raw_wasm_path.as_deref(),
                &self.out_dir,
                &self.out_name,
                manual,
            )
            .map_err(|error| self.fail(Step::Bind, error))?;

        self.outputs = Some(BoundOutputs {
            js_file: format!("{}.js", self.out_name),
            bg_wasm_file: format!("{}_bg.wasm", self.out_name),
        });
        self.status = TargetStatus::Bound;
        Ok(())
    }

    fn fail(&mut self, step: Step, error: Error) -> StepFailure {
        self.status = TargetStatus::Failed(step);
        self.outputs = None;
        StepFailure { step, error }
    }

    fn sync_watch_path(&mut self) {
        self.watch_path = match (&self.raw_wasm_path, self.config.watch_raw_wasm) {
            (Some(path), true) => Some(normalize_id(path)),
            _ => None,
        };
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    pub fn status(&self) -> TargetStatus {
        self.status
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn debug_build(&self) -> bool {
        self.debug_build
    }

    pub fn raw_wasm_path(&self) -> Option<&Path> {
        self.raw_wasm_path.as_deref()
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn out_name(&self) -> &str {
        &self.out_name
    }

    /// Normalized raw wasm path, only when the target watches it.
    pub fn watch_path(&self) -> Option<&str> {
        self.watch_path.as_deref()
    }

    /// Id of the wasm-bindgen JS output.
    pub fn js_id(&self) -> Option<String> {
        self.outputs
            .as_ref()
            .map(|o| normalize_id(&self.out_dir.join(&o.js_file)))
    }

    /// Id of the `?init` shim exporting the init function.
    pub fn js_init_id(&self) -> Option<String> {
        self.js_id().map(|id| id + "?init")
    }

    /// Id of the `_bg.wasm` file served through the proxy module.
    pub fn bg_wasm_id(&self) -> Option<String> {
        self.outputs
            .as_ref()
            .map(|o| normalize_id(&self.out_dir.join(&o.bg_wasm_file)))
    }
}
