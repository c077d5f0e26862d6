//! Locating the raw wasm artifact from `cargo metadata` output.

use crate::config::Profile;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Target triple every raw wasm is built for.
pub const WASM_TARGET: &str = "wasm32-unknown-unknown";

/// Subset of `cargo metadata --format-version 1` we rely on.
#[derive(Deserialize, Debug, Clone)]
pub struct CargoMetadata {
    pub target_directory: PathBuf,
    pub packages: Vec<CargoPackage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CargoPackage {
    pub name: String,
    pub manifest_path: PathBuf,
    #[serde(default)]
    pub targets: Vec<CargoTarget>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CargoTarget {
    pub name: String,
    #[serde(default)]
    pub kind: Vec<String>,
}

impl CargoMetadata {
    pub fn parse(target: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Metadata {
            target: target.to_string(),
            source,
        })
    }

    /// Picks the package whose artifact is wanted.
    ///
    /// An explicit crate name always wins. Otherwise the metadata has to
    /// describe exactly one package.
    pub fn artifact_name(&self, target: &str, crate_name: Option<&str>) -> Result<String> {
        if let Some(name) = crate_name {
            return Ok(name.to_string());
        }

        match self.packages.as_slice() {
            [package] => Ok(package.name.clone()),
            [] => Err(Error::config(target, "no package found in cargo metadata")),
            _ => Err(Error::config(
                target,
                "multiple packages found in cargo metadata (explicit crate_name is required)",
            )),
        }
    }

    /// `<target_directory>/wasm32-unknown-unknown/<profile_dir>/<name>.wasm`
    pub fn raw_wasm_path(
        &self,
        target: &str,
        crate_name: Option<&str>,
        profile: &Profile,
    ) -> Result<PathBuf> {
        let name = self.artifact_name(target, crate_name)?;

        Ok(self
            .target_directory
            .join(WASM_TARGET)
            .join(profile.output_dir_name())
            .join(format!("{}.wasm", name.replace('-', "_"))))
    }
}
