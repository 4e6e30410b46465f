// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! License report for the packages bundled into a wheel.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Catalog, Error, PackageManifest, Result};

#[cfg(test)]
#[path = "./report_test.rs"]
mod report_test;

/// Directory inside an extracted conda package holding license files.
const LICENSES_DIR: &str = "info/licenses";

/// Single-file fallback used by older conda packages.
const LEGACY_LICENSE_FILE: &str = "info/LICENSE.txt";

const SEPARATOR_WIDTH: usize = 72;

/// Prefix applied to every line of quoted license text.
const QUOTE: &str = ">";

/// A license file found in a package, with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseFile {
    /// Path relative to the package directory.
    pub path: PathBuf,
    pub text: String,
}

/// Report entry for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub version: String,
    pub url: String,
    pub license: String,
    pub license_files: Vec<LicenseFile>,
}

/// The license texts of every package bundled into a wheel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseReport {
    entries: Vec<ReportEntry>,
}

impl LicenseReport {
    /// Collect license files for each named package.
    ///
    /// Every name must be in the catalog; a missing one aborts the report
    /// rather than silently dropping a license.
    pub fn build<I>(packages: I, catalog: &Catalog) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut names: Vec<String> = packages
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        names.sort();
        names.dedup();

        let mut entries = Vec::with_capacity(names.len());
        for name in &names {
            let manifest = catalog.require(name)?;
            entries.push(ReportEntry {
                name: manifest.name.clone(),
                version: manifest.version.clone(),
                url: manifest.url.clone(),
                license: manifest.license.clone(),
                license_files: collect_license_files(manifest)?,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Render the report as text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(&"-".repeat(SEPARATOR_WIDTH));
                out.push_str("\n\n");
            }
            render_entry(&mut out, entry);
        }
        out
    }

    /// Write the rendered report to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render())?;
        tracing::info!(path = %path.display(), packages = self.entries.len(), "wrote license report");
        Ok(())
    }
}

fn render_entry(out: &mut String, entry: &ReportEntry) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "Name: {}", entry.name);
    let _ = writeln!(out, "Version: {}", entry.version);
    let _ = writeln!(out, "URL: {}", entry.url);
    let _ = writeln!(out, "License: {}", entry.license);
    out.push('\n');

    if entry.license_files.is_empty() {
        out.push_str("(no license files found)\n\n");
        return;
    }

    for file in &entry.license_files {
        let _ = writeln!(out, "License file: {}", file.path.display());
        for line in file.text.lines() {
            if line.is_empty() {
                out.push_str(QUOTE);
            } else {
                let _ = write!(out, "{QUOTE} {line}");
            }
            out.push('\n');
        }
        out.push('\n');
    }
}

/// Find the license files of an installed package, sorted by path.
fn collect_license_files(manifest: &PackageManifest) -> Result<Vec<LicenseFile>> {
    let Some(package_dir) = &manifest.package_dir else {
        tracing::warn!(package = %manifest.name, "no package directory, cannot collect license files");
        return Ok(Vec::new());
    };

    let mut paths = Vec::new();
    let licenses_dir = package_dir.join(LICENSES_DIR);
    if licenses_dir.is_dir() {
        for entry in WalkDir::new(&licenses_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
    } else {
        let legacy = package_dir.join(LEGACY_LICENSE_FILE);
        if legacy.is_file() {
            paths.push(legacy);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(&path).map_err(|e| Error::ReadFailed {
            path: path.clone(),
            error: e,
        })?;
        let relative = path
            .strip_prefix(package_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        files.push(LicenseFile {
            path: relative,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    if files.is_empty() {
        tracing::warn!(package = %manifest.name, "no license files found");
    }
    Ok(files)
}
