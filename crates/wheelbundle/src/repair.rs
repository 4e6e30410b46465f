// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Platform repair tools that bundle shared libraries into a wheel.
//!
//! Conda libraries find each other through RPATHs relative to the prefix
//! (`$ORIGIN/../../..`), which break once the wheel is unpacked in a
//! temporary directory. Every strategy therefore points the tool's library
//! search path at the prefix explicitly.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./repair_test.rs"]
mod repair_test;

/// Operating system the wheel is being repaired for.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Linux,
    Macos,
    Windows,
}

impl TargetPlatform {
    /// The platform this binary was built for.
    pub fn host() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
        };
        f.write_str(name)
    }
}

/// Inputs shared by every strategy.
#[derive(Debug, Clone)]
pub struct StrategyOptions {
    /// Conda prefix holding the libraries to bundle.
    pub prefix: PathBuf,
    /// Platform tag, only used by auditwheel.
    pub plat: Option<String>,
}

/// One external command a strategy runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(String, OsString)>,
}

impl ToolCommand {
    fn new<P: Into<OsString>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    fn arg<A: Into<OsString>>(mut self, arg: A) -> Self {
        self.args.push(arg.into());
        self
    }

    fn env<V: Into<OsString>>(mut self, key: &str, value: V) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Run to completion, failing on a non-zero exit.
    pub async fn run(&self) -> Result<()> {
        let tool = self.program.to_string_lossy().into_owned();
        tracing::info!(command = %self, "running repair tool");

        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let status = command
            .status()
            .await
            .map_err(|e| Error::ToolNotFound {
                tool: tool.clone(),
                error: e,
            })?;
        if !status.success() {
            return Err(Error::ToolFailed { tool, status });
        }
        Ok(())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={} ", value.to_string_lossy())?;
        }
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// A way of bundling a wheel's shared library dependencies into it.
#[async_trait]
pub trait RepairStrategy: Send + Sync {
    /// Name of the underlying tool, for messages.
    fn name(&self) -> &'static str;

    /// Commands that repair `wheel`, writing the result into `wheelhouse`.
    fn commands(&self, wheel: &Path, wheelhouse: &Path) -> Vec<ToolCommand>;

    /// Run the commands and return the path of the repaired wheel.
    async fn repair(&self, wheel: &Path, wheelhouse: &Path) -> Result<PathBuf> {
        for command in self.commands(wheel, wheelhouse) {
            command.run().await?;
        }
        find_repaired_wheel(wheelhouse)
    }
}

/// Linux: `auditwheel show` followed by `auditwheel repair`.
#[derive(Debug, Clone)]
pub struct Auditwheel {
    options: StrategyOptions,
}

#[async_trait]
impl RepairStrategy for Auditwheel {
    fn name(&self) -> &'static str {
        "auditwheel"
    }

    fn commands(&self, wheel: &Path, wheelhouse: &Path) -> Vec<ToolCommand> {
        let python = self.options.prefix.join("bin").join("python");
        let lib = self.options.prefix.join("lib");

        let show = ToolCommand::new(&python)
            .env("LD_LIBRARY_PATH", &lib)
            .arg("-m")
            .arg("auditwheel")
            .arg("show")
            .arg(wheel);

        let mut repair = ToolCommand::new(&python)
            .env("LD_LIBRARY_PATH", &lib)
            .arg("-m")
            .arg("auditwheel")
            .arg("repair");
        if let Some(plat) = &self.options.plat {
            repair = repair.arg(format!("--plat={plat}"));
        }
        let mut wheel_dir = OsString::from("--wheel-dir=");
        wheel_dir.push(wheelhouse);
        repair = repair.arg(wheel_dir).arg(wheel);

        vec![show, repair]
    }
}

/// macOS: `delocate-listdeps` followed by `delocate-wheel`.
#[derive(Debug, Clone)]
pub struct Delocate {
    options: StrategyOptions,
}

#[async_trait]
impl RepairStrategy for Delocate {
    fn name(&self) -> &'static str {
        "delocate"
    }

    fn commands(&self, wheel: &Path, wheelhouse: &Path) -> Vec<ToolCommand> {
        let bin = self.options.prefix.join("bin");
        let lib = self.options.prefix.join("lib");

        let show = ToolCommand::new(bin.join("delocate-listdeps"))
            .env("DYLD_LIBRARY_PATH", &lib)
            .arg(wheel);
        let repair = ToolCommand::new(bin.join("delocate-wheel"))
            .env("DYLD_LIBRARY_PATH", &lib)
            .arg("-w")
            .arg(wheelhouse)
            .arg("-v")
            .arg(wheel);

        vec![show, repair]
    }
}

/// Windows: `delvewheel show` followed by `delvewheel repair`.
#[derive(Debug, Clone)]
pub struct Delvewheel {
    options: StrategyOptions,
}

#[async_trait]
impl RepairStrategy for Delvewheel {
    fn name(&self) -> &'static str {
        "delvewheel"
    }

    fn commands(&self, wheel: &Path, wheelhouse: &Path) -> Vec<ToolCommand> {
        let python = self.options.prefix.join("python.exe");
        // conda keeps DLLs under Library\bin on Windows
        let dll_dir = self.options.prefix.join("Library").join("bin");

        let show = ToolCommand::new(&python)
            .arg("-m")
            .arg("delvewheel")
            .arg("show")
            .arg("--add-path")
            .arg(&dll_dir)
            .arg(wheel);
        let repair = ToolCommand::new(&python)
            .arg("-m")
            .arg("delvewheel")
            .arg("repair")
            .arg("--add-path")
            .arg(&dll_dir)
            .arg("-w")
            .arg(wheelhouse)
            .arg(wheel);

        vec![show, repair]
    }
}

/// Pick the repair strategy for a platform.
pub fn select_strategy(
    platform: TargetPlatform,
    options: StrategyOptions,
) -> Box<dyn RepairStrategy> {
    tracing::debug!(%platform, prefix = %options.prefix.display(), "selecting repair strategy");
    match platform {
        TargetPlatform::Linux => Box::new(Auditwheel { options }),
        TargetPlatform::Macos => Box::new(Delocate { options }),
        TargetPlatform::Windows => Box::new(Delvewheel { options }),
    }
}

/// Locate the single wheel a repair tool wrote into `wheelhouse`.
pub fn find_repaired_wheel(wheelhouse: &Path) -> Result<PathBuf> {
    let escaped = glob::Pattern::escape(&wheelhouse.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.whl");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| {
        Error::ValidationFailed(format!("Invalid wheelhouse path {pattern}: {e}"))
    })?;

    let mut wheels = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        wheels.push(path);
    }

    match wheels.len() {
        0 => Err(Error::RepairedWheelNotFound(wheelhouse.to_path_buf())),
        1 => Ok(wheels.remove(0)),
        _ => Err(Error::AmbiguousRepairedWheel(wheels)),
    }
}
