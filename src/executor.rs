//! External tool invocations: `cargo build`, `cargo metadata` and
//! `wasm-bindgen`.

use crate::config::{Options, Profile, TargetConfig};
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::metadata::{CargoMetadata, WASM_TARGET};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    /// Human readable exit status, e.g. `exit status: 101`.
    pub status: String,
    pub stdout: String,
    pub stderr: Vec<u8>,
}

/// Seam between the executor and the OS process API.
pub trait ToolRunner {
    /// Runs the invocation to completion. `Err` means it could not start.
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput>;
}

/// Runs tools as real child processes, capturing stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ToolOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()?;

        Ok(ToolOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: output.stderr,
        })
    }
}

/// Result of a step that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The tool ran and succeeded.
    Done,
    /// Skipped by policy or because there was nothing to do.
    Skipped,
    /// The tool failed but the target asked to ignore it.
    Ignored,
}

/// Runs the external steps of a target pipeline.
pub struct Executor {
    runner: Box<dyn ToolRunner>,
    logger: Logger,
    redirect_stderr: bool,
    cargo: String,
    wasm_bindgen: String,
}

impl Executor {
    pub fn new(options: &Options) -> Self {
        Self::with_runner(options, Box::new(SystemRunner))
    }

    pub fn with_runner(options: &Options, runner: Box<dyn ToolRunner>) -> Self {
        Self {
            runner,
            logger: Logger::new(options.verbose),
            redirect_stderr: options.redirect_stderr,
            cargo: options.cargo.clone(),
            wasm_bindgen: options.wasm_bindgen.clone(),
        }
    }

    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// `cargo build --lib --target wasm32-unknown-unknown` for the target's
    /// manifest.
    pub fn build_raw_wasm(
        &self,
        config: &TargetConfig,
        profile: &Profile,
        manual: bool,
    ) -> Result<StepOutcome> {
        let key = config.key.as_str();
        let operation = format!("building \"{key}\" raw-wasm");

        if config.skip_build.should_skip(manual) {
            self.logger.info(format!("skip {operation} (skip_build)"));
            return Ok(StepOutcome::Skipped);
        }
        let Some(manifest_path) = config.manifest_path.as_deref() else {
            self.logger.info(format!("skip {operation} (no manifest_path)"));
            return Ok(StepOutcome::Skipped);
        };

        let mut invocation = Invocation::new(&self.cargo)
            .arg("build")
            .arg("--lib")
            .arg("--manifest-path")
            .path_arg(manifest_path)
            .arg("--target")
            .arg(WASM_TARGET);
        invocation.args.extend(profile.cargo_args());

        match self.execute(key, &operation, &invocation) {
            Ok(_) => Ok(StepOutcome::Done),
            Err(e) if config.ignore_build_error && e.is_tool_error() => {
                self.logger.warn(format!("FAILED {operation} (ignored): {e}"));
                Ok(StepOutcome::Ignored)
            }
            Err(e) => Err(e),
        }
    }

    /// Finds the raw wasm path through `cargo metadata`.
    ///
    /// Returns `Ok(None)` when the step is skipped: an explicit raw wasm path
    /// was configured, or there is no manifest to ask about.
    pub fn resolve_raw_wasm_path(
        &self,
        config: &TargetConfig,
        profile: &Profile,
    ) -> Result<Option<PathBuf>> {
        let key = config.key.as_str();
        let operation = format!("resolving \"{key}\" raw-wasm path");

        if config.raw_wasm_path.is_some() {
            self.logger.info(format!("skip {operation} (raw_wasm_path is given)"));
            return Ok(None);
        }
        let Some(manifest_path) = config.manifest_path.as_deref() else {
            self.logger.info(format!("skip {operation} (no manifest_path)"));
            return Ok(None);
        };

        let invocation = Invocation::new(&self.cargo)
            .arg("metadata")
            .arg("--no-deps")
            .arg("--manifest-path")
            .path_arg(manifest_path)
            .arg("--format-version")
            .arg("1");

        let output = self.execute(key, &operation, &invocation)?;
        let metadata = CargoMetadata::parse(key, &output.stdout)?;
        let path = metadata.raw_wasm_path(key, config.crate_name.as_deref(), profile)?;

        self.logger.info(format!(" => {}", path.display()));
        Ok(Some(path))
    }

    /// `wasm-bindgen --target bundler` into `<out_dir>/<out_name>.js`.
    pub fn generate_bindings(
        &self,
        config: &TargetConfig,
        raw_wasm_path: Option<&Path>,
        out_dir: &Path,
        out_name: &str,
        manual: bool,
    ) -> Result<StepOutcome> {
        let key = config.key.as_str();
        let operation = format!("generating \"{key}\" module");

        if config.skip_bindgen.should_skip(manual) {
            self.logger.info(format!("skip {operation} (skip_bindgen)"));
            return Ok(StepOutcome::Skipped);
        }
        let Some(raw_wasm_path) = raw_wasm_path else {
            return Err(Error::config(key, "no raw wasm path to generate bindings from"));
        };

        let invocation = Invocation::new(&self.wasm_bindgen)
            .arg("--out-dir")
            .path_arg(out_dir)
            .arg("--out-name")
            .arg(out_name)
            .arg("--target")
            .arg("bundler")
            .path_arg(raw_wasm_path);

        self.execute(key, &operation, &invocation)?;
        Ok(StepOutcome::Done)
    }

    fn execute(&self, key: &str, operation: &str, invocation: &Invocation) -> Result<ToolOutput> {
        self.logger.info(format!("{operation}: {invocation}"));

        let output = self
            .runner
            .run(invocation)
            .map_err(|source| Error::Spawn {
                target: key.to_string(),
                program: invocation.program.clone(),
                source,
            })?;

        if self.redirect_stderr {
            self.logger.forward_stderr(&output.stderr);
        }

        if !output.success {
            return Err(Error::ToolFailed {
                target: key.to_string(),
                command: invocation.to_string(),
                status: output.status,
            });
        }

        Ok(output)
    }
}
