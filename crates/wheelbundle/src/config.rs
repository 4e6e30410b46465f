// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Build configuration from `.wheelbundle.yaml` files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::repair::TargetPlatform;
use crate::{CONFIG_FILENAME, DEFAULT_REPORT_NAME};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// API version for config files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "wheelbundle/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Settings for one repair-and-attribute run.
///
/// Everything the workflow needs is passed explicitly through this value;
/// nothing is read from process-wide state once it is loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// API version identifier.
    pub api: ApiVersion,

    /// Conda prefix holding the installed packages.
    /// Relative paths resolve against this file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<PathBuf>,

    /// Packages whose license text is always included in the report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub always_include: Vec<String>,

    /// Platform tag for the repair tool (e.g. `manylinux_2_31_x86_64`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plat: Option<String>,

    /// Directory receiving the repaired wheel and the report.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// File name of the license report.
    #[serde(default = "default_report_name")]
    pub report_name: String,

    /// Target platform; the host platform when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<TargetPlatform>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_report_name() -> String {
    DEFAULT_REPORT_NAME.to_string()
}

impl BuildConfig {
    /// Parse config from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        match with_version.api {
            ApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })
            }
        }
    }

    /// Load config from file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut config = Self::from_yaml(yaml)?;
        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Validate config after loading.
    pub fn validate(&self) -> crate::Result<()> {
        let has_separator = self.report_name.contains(|c: char| c == '/' || c == '\\');
        if self.report_name.is_empty() || has_separator {
            return Err(crate::Error::ValidationFailed(format!(
                "report_name must be a plain file name, got {:?}",
                self.report_name
            )));
        }
        if self.always_include.iter().any(|name| name.trim().is_empty()) {
            return Err(crate::Error::ValidationFailed(
                "always_include entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory that relative paths in this config are resolved against.
    fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Resolve a configured path: `~/` is home-relative, relative paths
    /// are taken from the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> crate::Result<PathBuf> {
        if let Ok(rel) = path.strip_prefix("~") {
            let home = dirs::home_dir().ok_or_else(|| {
                crate::Error::ValidationFailed("Cannot resolve ~ without HOME".to_string())
            })?;
            Ok(home.join(rel))
        } else if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir().join(path))
        }
    }

    /// Output directory with relative paths resolved.
    pub fn out_dir(&self) -> crate::Result<PathBuf> {
        self.resolve_path(&self.out_dir)
    }

    /// Configured prefix with relative paths resolved.
    pub fn prefix(&self) -> crate::Result<Option<PathBuf>> {
        self.prefix.as_deref().map(|p| self.resolve_path(p)).transpose()
    }

    /// Full path of the license report for this run.
    pub fn report_path(&self) -> crate::Result<PathBuf> {
        Ok(self.out_dir()?.join(&self.report_name))
    }

    /// Configured target platform, falling back to the host.
    pub fn target_platform(&self) -> crate::Result<TargetPlatform> {
        match self.platform {
            Some(platform) => Ok(platform),
            None => TargetPlatform::host(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            api: ApiVersion::default(),
            prefix: None,
            always_include: Vec::new(),
            plat: None,
            out_dir: default_out_dir(),
            report_name: default_report_name(),
            platform: None,
            source_path: None,
        }
    }
}

/// Resolve starting path, preferring $PWD to preserve symlinks.
fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Find the nearest `.wheelbundle.yaml`, starting at `start_path` and
/// walking up through its parents.
pub fn find_config<P: AsRef<Path>>(start_path: P) -> crate::Result<PathBuf> {
    let start = resolve_start_path(start_path.as_ref());
    if start.is_file() {
        return Ok(start);
    }

    let mut current = start.clone();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "found config");
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(crate::Error::ConfigNotFound(start));
        }
    }
}
