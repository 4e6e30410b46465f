// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `wheelbundle repair` command.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use colored::Colorize;
use miette::Result;

/// Stands in for the temporary wheelhouse in `--dry-run` output.
const WHEELHOUSE_PLACEHOLDER: &str = "<temporary wheelhouse>";

/// Target platform as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    Linux,
    Macos,
    Windows,
}

impl From<PlatformArg> for wheelbundle::TargetPlatform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Linux => Self::Linux,
            PlatformArg::Macos => Self::Macos,
            PlatformArg::Windows => Self::Windows,
        }
    }
}

/// Repair a wheel and write its license report
#[derive(Debug, Args)]
pub struct CmdRepair {
    /// The wheel to repair
    wheel: PathBuf,

    #[clap(flatten)]
    config: crate::ConfigFlags,

    /// Override the target platform
    #[clap(long, value_enum)]
    platform: Option<PlatformArg>,

    /// Print the repair commands without running them
    #[clap(long)]
    dry_run: bool,
}

impl CmdRepair {
    pub async fn run(&mut self) -> Result<i32> {
        let mut config = self.config.load(true)?;
        if let Some(platform) = self.platform {
            config.platform = Some(platform.into());
        }

        if !self.wheel.is_file() {
            return Err(miette::miette!("Wheel not found: {:?}", self.wheel));
        }

        let prefix = self.config.resolve_prefix(&config).await?;
        let strategy = wheelbundle::select_strategy(
            config.target_platform()?,
            wheelbundle::StrategyOptions {
                prefix: prefix.clone(),
                plat: config.plat.clone(),
            },
        );

        if self.dry_run {
            println!("{}", "Repair commands:".bold());
            for command in preview_commands(strategy.as_ref(), &self.wheel) {
                println!("  {}", command.cyan());
            }
            println!();
            println!("Repaired wheel moves to: {}", config.out_dir()?.display());
            println!("Report: {}", config.report_path()?.display());
            return Ok(0);
        }

        let catalog = wheelbundle::Catalog::load_conda_prefix(&prefix)?;
        let outcome =
            wheelbundle::repair_wheel(&self.wheel, &config, strategy.as_ref(), &catalog).await?;

        let attribution = &outcome.attributed.attribution;
        println!("{} {}", "Repaired:".bold(), outcome.wheel.display());
        println!("{} {}", "Report:".bold(), outcome.report_path.display());
        println!();
        println!(
            "Bundled {} file(s) from {} package(s)",
            outcome.attributed.added_files.len(),
            attribution.packages.len()
        );
        for name in &attribution.packages {
            println!("  - {}", name.green());
        }

        if !attribution.is_complete() {
            println!();
            println!("{}", "Unattributed files:".yellow().bold());
            for file in &attribution.unattributed {
                println!("  - {}", file.yellow());
            }
        }

        Ok(0)
    }
}

/// The commands a repair would run, with the wheelhouse left symbolic since
/// it only exists for the duration of the run.
fn preview_commands(strategy: &dyn wheelbundle::RepairStrategy, wheel: &Path) -> Vec<String> {
    strategy
        .commands(wheel, Path::new(WHEELHOUSE_PLACEHOLDER))
        .iter()
        .map(ToString::to_string)
        .collect()
}
