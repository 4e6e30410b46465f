// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `wheelbundle catalog` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

/// Display the installed package catalog
#[derive(Debug, Args)]
pub struct CmdCatalog {
    #[clap(flatten)]
    config: crate::ConfigFlags,

    /// Show installed files for each package
    #[clap(long)]
    files: bool,

    /// Show base filenames installed by more than one package
    #[clap(long)]
    collisions: bool,

    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdCatalog {
    pub async fn run(&mut self) -> Result<i32> {
        let config = self.config.load(false)?;
        let catalog = self.config.load_catalog(&config).await?;

        match self.format.as_str() {
            "yaml" => self.show_yaml(&catalog)?,
            "json" => self.show_json(&catalog)?,
            "table" => self.show_table(&catalog, &config),
            other => {
                return Err(miette::miette!(
                    "Unknown format '{}' (expected table, yaml or json)",
                    other
                ));
            }
        }

        if self.collisions {
            println!();
            self.show_collisions(&catalog);
        }

        Ok(0)
    }

    fn show_table(&self, catalog: &wheelbundle::Catalog, config: &wheelbundle::BuildConfig) {
        if let Some(prefix) = catalog.prefix() {
            println!("{} {}", "Prefix:".bold(), prefix.display());
            println!();
        }

        for manifest in catalog.iter() {
            let marker = if config.always_include.contains(&manifest.name) {
                " [always]"
            } else {
                ""
            };
            println!(
                "  {} {} {}{}",
                manifest.name.cyan(),
                manifest.version,
                manifest.license.dimmed(),
                marker.yellow()
            );

            if self.files {
                for file in &manifest.installed_files {
                    println!("      {}", file.display());
                }
            }
        }

        println!();
        println!("Total: {} package(s)", catalog.len());
    }

    fn show_yaml(&self, catalog: &wheelbundle::Catalog) -> Result<()> {
        let manifests = self.manifests(catalog);
        print!("{}", serde_yaml::to_string(&manifests).into_diagnostic()?);
        Ok(())
    }

    fn show_json(&self, catalog: &wheelbundle::Catalog) -> Result<()> {
        let manifests = self.manifests(catalog);
        println!(
            "{}",
            serde_json::to_string_pretty(&manifests).into_diagnostic()?
        );
        Ok(())
    }

    /// Manifests to serialize, without file lists unless asked for.
    fn manifests(&self, catalog: &wheelbundle::Catalog) -> Vec<wheelbundle::PackageManifest> {
        catalog
            .iter()
            .cloned()
            .map(|mut manifest| {
                if !self.files {
                    manifest.installed_files.clear();
                }
                manifest
            })
            .collect()
    }

    fn show_collisions(&self, catalog: &wheelbundle::Catalog) {
        println!("{}", "Shared Filenames:".bold());
        let index = wheelbundle::FilenameIndex::from_catalog(catalog);
        let mut count = 0;
        for (file_name, packages) in index.collisions() {
            count += 1;
            let packages: Vec<&str> = packages.iter().map(String::as_str).collect();
            println!("  {} {}", file_name.cyan(), packages.join(", ").yellow());
        }
        if count == 0 {
            println!("  {}", "(none)".dimmed());
        }
    }
}
