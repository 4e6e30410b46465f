// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! wheelbundle - bundle native libraries into wheels and report their licenses

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_attribute;
mod cmd_catalog;
mod cmd_init;
mod cmd_repair;
mod cmd_unmangle;

use cmd_attribute::CmdAttribute;
use cmd_catalog::CmdCatalog;
use cmd_init::CmdInit;
use cmd_repair::CmdRepair;
use cmd_unmangle::CmdUnmangle;

#[derive(Parser)]
#[clap(
    name = "wheelbundle",
    about = "Bundle native library dependencies into wheels",
    version,
    long_about = "Repair wheels with the platform's repair tool and collect the license texts of every bundled library"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Where to find `.wheelbundle.yaml`.
#[derive(Parser, Clone, Debug)]
pub struct ConfigFlags {
    /// Start config discovery from PATH (a directory or the file itself)
    #[clap(short = 'f', long = "file", default_value = ".")]
    pub file: PathBuf,

    /// Conda prefix holding the installed packages
    #[clap(long, env = "WHEELBUNDLE_PREFIX")]
    pub prefix: Option<PathBuf>,
}

impl ConfigFlags {
    /// Load the config, or defaults when none exists and `required` is
    /// false.
    pub fn load(&self, required: bool) -> Result<wheelbundle::BuildConfig> {
        let mut config = match wheelbundle::find_config(&self.file) {
            Ok(path) => wheelbundle::BuildConfig::load(path)?,
            Err(wheelbundle::Error::ConfigNotFound(_)) if !required => {
                tracing::debug!("no config found, using defaults");
                wheelbundle::BuildConfig::default()
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(prefix) = &self.prefix {
            config.prefix = Some(prefix.clone());
        }
        Ok(config)
    }

    /// The conda prefix to read packages from. An explicit `--prefix` wins
    /// over everything else.
    pub async fn resolve_prefix(&self, config: &wheelbundle::BuildConfig) -> Result<PathBuf> {
        match &self.prefix {
            Some(prefix) => Ok(prefix.clone()),
            None => Ok(wheelbundle::conda::resolve_prefix(config).await?),
        }
    }

    /// Load the catalog for the prefix this config points at.
    pub async fn load_catalog(
        &self,
        config: &wheelbundle::BuildConfig,
    ) -> Result<wheelbundle::Catalog> {
        let prefix = self.resolve_prefix(config).await?;
        Ok(wheelbundle::Catalog::load_conda_prefix(prefix)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new .wheelbundle.yaml file
    Init(CmdInit),

    /// Repair a wheel and write its license report
    Repair(CmdRepair),

    /// Attribute the files added between two wheels
    Attribute(CmdAttribute),

    /// Display the installed package catalog
    Catalog(CmdCatalog),

    /// Recover the original name of mangled library files
    Unmangle(CmdUnmangle),
}

impl Opt {
    async fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run().await,
            Command::Repair(mut cmd) => cmd.run().await,
            Command::Attribute(mut cmd) => cmd.run().await,
            Command::Catalog(mut cmd) => cmd.run().await,
            Command::Unmangle(mut cmd) => cmd.run().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run().await?;
    std::process::exit(code);
}
