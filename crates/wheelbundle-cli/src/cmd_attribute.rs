// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Attribute the files a repair tool added to a wheel.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

/// Attribute the files added between two wheels
#[derive(Debug, Args)]
pub struct CmdAttribute {
    /// The wheel before repair
    #[clap(long)]
    before: PathBuf,

    /// The wheel after repair
    #[clap(long)]
    after: PathBuf,

    #[clap(flatten)]
    config: crate::ConfigFlags,

    /// Additional package to always include (repeatable)
    #[clap(long = "always-include")]
    always_include: Vec<String>,

    /// Write the report to FILE instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Exit with 1 when a bundled file matches no package
    #[clap(long)]
    strict: bool,
}

impl CmdAttribute {
    pub async fn run(&mut self) -> Result<i32> {
        let mut config = self.config.load(false)?;
        config.always_include.extend(self.always_include.iter().cloned());

        let catalog = self.config.load_catalog(&config).await?;
        let result =
            wheelbundle::attribute_wheels(&self.before, &self.after, &catalog, &config.always_include)?;

        for file in &result.attribution.unattributed {
            eprintln!("Warning: no package found for {}", file);
        }

        match &self.output {
            Some(path) => {
                result.report.write_to(path)?;
                eprintln!("Wrote license report: {:?}", path);
            }
            None => print!("{}", result.report.render()),
        }

        if self.strict && !result.attribution.is_complete() {
            return Ok(1);
        }
        Ok(0)
    }
}
