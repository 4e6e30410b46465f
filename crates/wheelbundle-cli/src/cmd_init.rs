// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `wheelbundle init` command.

use clap::Args;
use miette::Result;
use std::path::PathBuf;

/// Create a new .wheelbundle.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Package whose license is always bundled (repeatable)
    #[clap(long = "always-include")]
    always_include: Vec<String>,

    /// Platform tag for auditwheel
    #[clap(long)]
    plat: Option<String>,
}

impl CmdInit {
    pub async fn run(&mut self) -> Result<i32> {
        let config_path = self.path.join(wheelbundle::CONFIG_FILENAME);

        // Check if file already exists
        if config_path.exists() {
            return Err(miette::miette!(
                ".wheelbundle.yaml already exists at {:?}",
                config_path
            ));
        }

        std::fs::write(&config_path, self.render_template())
            .map_err(|e| miette::miette!("Failed to write .wheelbundle.yaml: {}", e))?;

        println!("Created .wheelbundle.yaml at {:?}", config_path);
        println!();
        println!("Next steps:");
        println!("  1. List the packages whose licenses must always ship");
        println!("  2. Run 'wheelbundle catalog' to check the installed packages");
        println!("  3. Run 'wheelbundle repair <wheel>' to build the portable wheel");

        Ok(0)
    }

    fn render_template(&self) -> String {
        let always_include = if self.always_include.is_empty() {
            "# always_include:\n\
            #   - ocp\n\
            #   - vtk\n"
                .to_string()
        } else {
            let mut section = "always_include:\n".to_string();
            for name in &self.always_include {
                section.push_str(&format!("  - {}\n", name));
            }
            section
        };

        let plat = match &self.plat {
            Some(plat) => format!("plat: {}\n", plat),
            None => "# plat: manylinux_2_31_x86_64\n".to_string(),
        };

        format!(
            "api: wheelbundle/v0\n\
            \n\
            # Conda prefix holding the installed packages\n\
            # (defaults to $CONDA_PREFIX or 'conda info --json')\n\
            # prefix: /opt/conda/envs/build\n\
            \n\
            # Packages whose license text is always bundled\n\
            {}\
            \n\
            # Platform tag passed to auditwheel\n\
            {}\
            \n\
            out_dir: dist\n\
            report_name: {}\n",
            always_include,
            plat,
            wheelbundle::DEFAULT_REPORT_NAME
        )
    }
}
