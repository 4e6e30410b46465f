// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Installed package manifests and the catalog that holds them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./catalog_test.rs"]
mod catalog_test;

/// Directory under a conda prefix holding one JSON record per package.
pub const CONDA_META_DIR: &str = "conda-meta";

/// License identifier used when a record does not declare one.
pub const UNKNOWN_LICENSE: &str = "unknown";

/// Metadata for one installed package.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,

    /// Declared license, free text.
    #[serde(default = "default_license")]
    pub license: String,

    /// Where the package was downloaded from.
    #[serde(default)]
    pub url: String,

    /// Absolute paths of every file the package installed.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub installed_files: BTreeSet<PathBuf>,

    /// Extracted package directory, searched for license files.
    /// Always absolute when loaded from conda-meta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_dir: Option<PathBuf>,
}

fn default_license() -> String {
    UNKNOWN_LICENSE.to_string()
}

impl PackageManifest {
    /// Create a manifest with no files and an unknown license.
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: None,
            license: default_license(),
            url: String::new(),
            installed_files: BTreeSet::new(),
            package_dir: None,
        }
    }
}

/// The record conda writes to `conda-meta/<name>-<version>-<build>.json`.
///
/// Only the fields needed for attribution are read; everything else in
/// the document is ignored.
#[derive(Debug, Deserialize)]
struct CondaRecord {
    name: String,
    version: String,
    #[serde(default)]
    build: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    url: Option<String>,
    /// Paths relative to the prefix.
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    extracted_package_dir: Option<PathBuf>,
}

impl CondaRecord {
    fn into_manifest(self, prefix: &Path) -> PackageManifest {
        PackageManifest {
            name: self.name,
            version: self.version,
            build: self.build,
            license: self
                .license
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(default_license),
            url: self.url.unwrap_or_default(),
            installed_files: self.files.iter().map(|f| prefix.join(f)).collect(),
            // a relative directory would be searched from the working directory
            package_dir: self.extracted_package_dir.filter(|p| p.is_absolute()),
        }
    }
}

/// All installed package manifests, keyed and ordered by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: BTreeMap<String, PackageManifest>,
    prefix: Option<PathBuf>,
}

impl Catalog {
    /// Build a catalog from manifests, rejecting duplicate names.
    pub fn from_manifests<I>(manifests: I) -> Result<Self>
    where
        I: IntoIterator<Item = PackageManifest>,
    {
        let mut packages = BTreeMap::new();
        for manifest in manifests {
            if packages.contains_key(&manifest.name) {
                return Err(Error::DuplicatePackage(manifest.name));
            }
            packages.insert(manifest.name.clone(), manifest);
        }
        Ok(Self {
            packages,
            prefix: None,
        })
    }

    /// Load every `conda-meta/*.json` record under a conda prefix.
    pub fn load_conda_prefix<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        let prefix = prefix.as_ref();
        let meta_dir = prefix.join(CONDA_META_DIR);
        let entries = std::fs::read_dir(&meta_dir).map_err(|e| Error::ReadFailed {
            path: meta_dir.clone(),
            error: e,
        })?;

        let mut record_paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                record_paths.push(path);
            }
        }
        // read_dir order is platform dependent
        record_paths.sort();

        let mut manifests = Vec::with_capacity(record_paths.len());
        for path in record_paths {
            let content = std::fs::read_to_string(&path).map_err(|e| Error::ReadFailed {
                path: path.clone(),
                error: e,
            })?;
            let record: CondaRecord =
                serde_json::from_str(&content).map_err(|e| Error::InvalidRecord {
                    path: path.clone(),
                    error: e,
                })?;
            tracing::trace!(name = %record.name, path = %path.display(), "loaded conda record");
            manifests.push(record.into_manifest(prefix));
        }

        let mut catalog = Self::from_manifests(manifests)?;
        catalog.prefix = Some(prefix.to_path_buf());
        tracing::debug!(
            prefix = %prefix.display(),
            packages = catalog.len(),
            "loaded package catalog"
        );
        Ok(catalog)
    }

    /// The prefix this catalog was loaded from, if any.
    pub fn prefix(&self) -> Option<&Path> {
        self.prefix.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&PackageManifest> {
        self.packages.get(name)
    }

    /// Look up a package that must exist.
    ///
    /// A missing package means the catalog and the caller disagree about
    /// what is installed, so the error carries close matches to help fix
    /// the configuration.
    pub fn require(&self, name: &str) -> Result<&PackageManifest> {
        self.packages.get(name).ok_or_else(|| Error::MissingManifest {
            name: name.to_string(),
            similar: self.similar_names(name),
        })
    }

    /// Iterate manifests in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageManifest> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn similar_names(&self, name: &str) -> Vec<String> {
        let needle = name.to_lowercase();
        self.packages
            .keys()
            .filter(|candidate| {
                let candidate = candidate.to_lowercase();
                !needle.is_empty() && (candidate.contains(&needle) || needle.contains(&candidate))
            })
            .take(5)
            .cloned()
            .collect()
    }
}
