use crate::target::normalize_path;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "rs-wasm-bindgen.toml";

/// Three-way skip flag for the build and bindgen steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Always skip the step.
    Always,
    /// Never skip the step.
    #[default]
    Never,
    /// Run the step only for a manual (CLI requested) pass.
    OnlyWhenManual,
}

impl SkipPolicy {
    /// `Always`/`Never` ignore the invocation context; only
    /// `OnlyWhenManual` looks at `manual`.
    pub fn should_skip(self, manual: bool) -> bool {
        match self {
            SkipPolicy::Always => true,
            SkipPolicy::Never => false,
            SkipPolicy::OnlyWhenManual => !manual,
        }
    }
}

/// Cargo build profile of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Release,
    Named(String),
}

impl Profile {
    pub fn parse(name: &str) -> Self {
        match name {
            "dev" | "debug" => Profile::Dev,
            "release" => Profile::Release,
            other => Profile::Named(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Profile::Dev => "dev",
            Profile::Release => "release",
            Profile::Named(name) => name,
        }
    }

    /// Extra `cargo build` arguments selecting this profile.
    pub fn cargo_args(&self) -> Vec<String> {
        match self {
            Profile::Dev => Vec::new(),
            Profile::Release => vec!["--release".to_string()],
            Profile::Named(name) => vec!["--profile".to_string(), name.clone()],
        }
    }

    /// Directory under `target/<triple>/` that cargo writes this profile to.
    pub fn output_dir_name(&self) -> &str {
        match self.name() {
            "dev" | "test" => "debug",
            "bench" => "release",
            other => other,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.output_dir_name() == "debug"
    }
}

/// Canonical per-target configuration.
///
/// Produced once by [`FileConfig::into_options`]; nothing downstream sees the
/// string-or-table shape of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    /// Output prefix relative to the project root, e.g. `src/gen/app`.
    pub key: String,
    pub manifest_path: Option<PathBuf>,
    pub raw_wasm_path: Option<PathBuf>,
    pub crate_name: Option<String>,
    /// `None` follows the host mode (release in production, dev otherwise).
    pub profile: Option<Profile>,
    pub skip_build: SkipPolicy,
    pub skip_bindgen: SkipPolicy,
    pub ignore_build_error: bool,
    pub watch_raw_wasm: bool,
    pub use_await: bool,
}

impl TargetConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            manifest_path: None,
            raw_wasm_path: None,
            crate_name: None,
            profile: None,
            skip_build: SkipPolicy::Never,
            skip_bindgen: SkipPolicy::Never,
            ignore_build_error: false,
            watch_raw_wasm: false,
            use_await: false,
        }
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_raw_wasm(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_wasm_path = Some(path.into());
        self
    }
}

/// Plugin-wide options after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub verbose: bool,
    pub redirect_stderr: bool,
    pub cargo: String,
    pub wasm_bindgen: String,
    pub targets: Vec<TargetConfig>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbose: false,
            redirect_stderr: false,
            cargo: "cargo".to_string(),
            wasm_bindgen: "wasm-bindgen".to_string(),
            targets: Vec::new(),
        }
    }
}

/// What the host bundler tells us once its own config is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Absolute project root.
    pub root: PathBuf,
    pub is_production: bool,
}

/// `true`, `false` or `"auto"` in the config file.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(untagged)]
pub enum SkipFlag {
    Flag(bool),
    Keyword(SkipKeyword),
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SkipKeyword {
    Auto,
}

impl From<SkipFlag> for SkipPolicy {
    fn from(flag: SkipFlag) -> Self {
        match flag {
            SkipFlag::Flag(true) => SkipPolicy::Always,
            SkipFlag::Flag(false) => SkipPolicy::Never,
            SkipFlag::Keyword(SkipKeyword::Auto) => SkipPolicy::OnlyWhenManual,
        }
    }
}

/// A `[targets]` entry: a bare manifest path or a full table.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum TargetEntry {
    Manifest(String),
    Table(TargetTable),
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetTable {
    pub manifest_path: Option<String>,
    pub raw_wasm_path: Option<String>,
    pub crate_name: Option<String>,
    pub profile: Option<String>,
    pub use_debug_build: Option<bool>,
    pub skip_build: Option<SkipFlag>,
    pub skip_bindgen: Option<SkipFlag>,
    pub ignore_build_error: Option<bool>,
    pub watch_raw_wasm: Option<bool>,
    pub use_await: Option<bool>,
}

/// Layout of `rs-wasm-bindgen.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Project root; relative values resolve against the file's directory.
    pub root: Option<String>,
    pub production: Option<bool>,
    pub verbose: Option<bool>,
    pub redirect_stderr: Option<bool>,
    pub cargo: Option<String>,
    pub wasm_bindgen: Option<String>,

    // Defaults inherited by every target.
    pub skip_build: Option<SkipFlag>,
    pub skip_bindgen: Option<SkipFlag>,
    pub profile: Option<String>,
    pub use_debug_build: Option<bool>,
    pub use_await: Option<bool>,
    pub ignore_build_error: Option<bool>,
    pub watch_raw_wasm: Option<bool>,

    #[serde(default)]
    pub targets: toml::Table,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration content")
    }

    /// Resolves string-or-table entries into canonical [`TargetConfig`]s.
    ///
    /// Target values override top-level defaults field by field. Relative
    /// paths are resolved against `root`.
    pub fn into_options(self, root: &Path) -> Result<Options> {
        let mut targets = Vec::with_capacity(self.targets.len());

        for (key, value) in &self.targets {
            let entry: TargetEntry = value
                .clone()
                .try_into::<TargetEntry>()
                .with_context(|| format!("Invalid entry for target \"{key}\""))?;

            let table = match entry {
                TargetEntry::Manifest(path) => TargetTable {
                    manifest_path: Some(path),
                    ..TargetTable::default()
                },
                TargetEntry::Table(table) => table,
            };

            let profile = level_profile(table.profile.as_deref(), table.use_debug_build)
                .or_else(|| level_profile(self.profile.as_deref(), self.use_debug_build));

            targets.push(TargetConfig {
                key: key.clone(),
                manifest_path: table.manifest_path.map(|p| normalize_path(&root.join(p))),
                raw_wasm_path: table.raw_wasm_path.map(|p| normalize_path(&root.join(p))),
                crate_name: table.crate_name,
                profile,
                skip_build: table
                    .skip_build
                    .or(self.skip_build)
                    .map(Into::into)
                    .unwrap_or_default(),
                skip_bindgen: table
                    .skip_bindgen
                    .or(self.skip_bindgen)
                    .map(Into::into)
                    .unwrap_or_default(),
                ignore_build_error: table
                    .ignore_build_error
                    .or(self.ignore_build_error)
                    .unwrap_or(false),
                watch_raw_wasm: table.watch_raw_wasm.or(self.watch_raw_wasm).unwrap_or(false),
                use_await: table.use_await.or(self.use_await).unwrap_or(false),
            });
        }

        Ok(Options {
            verbose: self.verbose.unwrap_or(false),
            redirect_stderr: self.redirect_stderr.unwrap_or(false),
            cargo: self.cargo.unwrap_or_else(|| "cargo".to_string()),
            wasm_bindgen: self.wasm_bindgen.unwrap_or_else(|| "wasm-bindgen".to_string()),
            targets,
        })
    }
}

/// Profile chosen at one config level; `profile` beats `use_debug_build`.
fn level_profile(profile: Option<&str>, use_debug_build: Option<bool>) -> Option<Profile> {
    profile
        .map(Profile::parse)
        .or_else(|| use_debug_build.filter(|debug| *debug).map(|_| Profile::Dev))
}

/// Loads the configuration file and derives options plus host settings.
///
/// `production` on the command line wins over the file's `production` key.
pub fn load(config_path: &Path, production: Option<bool>) -> Result<(Options, HostConfig)> {
    if !config_path.exists() {
        anyhow::bail!("Configuration file '{}' not found.", config_path.display());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let file = FileConfig::parse(&content)?;

    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let config_dir = std::path::absolute(config_dir)
        .with_context(|| format!("Failed to resolve {}", config_dir.display()))?;

    let root = match file.root.as_deref() {
        Some(root) => normalize_path(&config_dir.join(root)),
        None => normalize_path(&config_dir),
    };

    let host = HostConfig {
        root: root.clone(),
        is_production: production.or(file.production).unwrap_or(false),
    };
    let options = file.into_options(&root)?;

    Ok((options, host))
}
