// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Locating the conda prefix that holds the installed packages.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{BuildConfig, Error, Result};

#[cfg(test)]
#[path = "./conda_test.rs"]
mod conda_test;

/// Overrides the configured prefix.
pub const PREFIX_ENV_VAR: &str = "WHEELBUNDLE_PREFIX";

/// Set by `conda activate`.
pub const CONDA_PREFIX_ENV_VAR: &str = "CONDA_PREFIX";

/// The parts of `conda info --json` that are used.
#[derive(Debug, Clone, Deserialize)]
pub struct CondaInfo {
    #[serde(default)]
    pub conda_prefix: Option<PathBuf>,
    #[serde(default)]
    pub active_prefix: Option<PathBuf>,
    #[serde(default)]
    pub pkgs_dirs: Vec<PathBuf>,
}

impl CondaInfo {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::ValidationFailed(format!("Unexpected output from 'conda info --json': {e}"))
        })
    }

    /// The environment packages were installed into.
    pub fn prefix(&self) -> Option<&PathBuf> {
        self.active_prefix.as_ref().or(self.conda_prefix.as_ref())
    }
}

/// Run `conda info --json`.
pub async fn conda_info() -> Result<CondaInfo> {
    let output = tokio::process::Command::new("conda")
        .args(["info", "--json"])
        .output()
        .await
        .map_err(|e| Error::ToolNotFound {
            tool: "conda".to_string(),
            error: e,
        })?;
    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: "conda".to_string(),
            status: output.status,
        });
    }
    CondaInfo::from_json(&String::from_utf8_lossy(&output.stdout))
}

/// Prefix from configuration or environment, without asking conda.
///
/// Precedence: `WHEELBUNDLE_PREFIX`, the config's `prefix`, then
/// `CONDA_PREFIX`.
pub fn configured_prefix<F>(config: &BuildConfig, env: F) -> Result<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(prefix) = env(PREFIX_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(Some(PathBuf::from(prefix)));
    }
    if let Some(prefix) = config.prefix()? {
        return Ok(Some(prefix));
    }
    Ok(env(CONDA_PREFIX_ENV_VAR)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from))
}

/// Resolve the prefix, falling back to `conda info --json`.
pub async fn resolve_prefix(config: &BuildConfig) -> Result<PathBuf> {
    if let Some(prefix) = configured_prefix(config, |key| std::env::var(key).ok())? {
        tracing::debug!(prefix = %prefix.display(), "using configured prefix");
        return Ok(prefix);
    }

    let info = conda_info().await?;
    let prefix = info.prefix().cloned().ok_or_else(|| {
        Error::ValidationFailed(
            "conda did not report a prefix; set 'prefix:' in .wheelbundle.yaml".to_string(),
        )
    })?;
    tracing::debug!(prefix = %prefix.display(), "using prefix reported by conda");
    Ok(prefix)
}
