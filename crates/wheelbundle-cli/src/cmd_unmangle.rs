// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `wheelbundle unmangle` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Recover the original name of mangled library files
#[derive(Debug, Args)]
pub struct CmdUnmangle {
    /// Bundled file names or archive member paths
    #[clap(required = true)]
    names: Vec<String>,
}

impl CmdUnmangle {
    pub async fn run(&mut self) -> Result<i32> {
        for name in &self.names {
            let file_name = wheelbundle::base_name(name);
            match wheelbundle::unmangle(file_name) {
                Some(original) => println!("{} -> {}", file_name, original.green()),
                None => println!("{} {}", file_name, "(not mangled)".dimmed()),
            }
        }
        Ok(0)
    }
}
