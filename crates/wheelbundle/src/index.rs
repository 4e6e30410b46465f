// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Base filename lookup over every file in a catalog.

use std::collections::{BTreeMap, BTreeSet};

use crate::Catalog;

#[cfg(test)]
#[path = "./index_test.rs"]
mod index_test;

/// Maps a base filename to the names of every package that installed a
/// file with that name.
///
/// Collisions are kept: when two packages ship `libz.so.1` both names are
/// returned by [`FilenameIndex::lookup`].
#[derive(Debug, Clone, Default)]
pub struct FilenameIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl FilenameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every installed file of every package in the catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut index = Self::new();
        for manifest in catalog.iter() {
            for path in &manifest.installed_files {
                if let Some(file_name) = path.file_name() {
                    index.insert(file_name.to_string_lossy(), &manifest.name);
                }
            }
        }
        tracing::debug!(filenames = index.len(), "built filename index");
        index
    }

    pub fn insert<F: Into<String>>(&mut self, file_name: F, package: &str) {
        self.entries
            .entry(file_name.into())
            .or_default()
            .insert(package.to_string());
    }

    /// Packages that installed a file with exactly this base name.
    pub fn lookup(&self, file_name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(file_name)
    }

    /// Base filenames claimed by more than one package.
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries
            .iter()
            .filter(|(_, packages)| packages.len() > 1)
            .map(|(name, packages)| (name.as_str(), packages))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
