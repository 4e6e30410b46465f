// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Attribute files bundled by a repair tool to the packages that
//! installed them.

use std::collections::BTreeSet;

use crate::FilenameIndex;
use crate::mangle::unmangle;

#[cfg(test)]
#[path = "./attribution_test.rs"]
mod attribution_test;

/// Result of attributing an Added-File Set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    /// Always-included packages plus every package a bundled file was
    /// traced to.
    pub packages: BTreeSet<String>,

    /// Archive members that matched no package, even after unmangling.
    pub unattributed: Vec<String>,
}

impl Attribution {
    pub fn is_complete(&self) -> bool {
        self.unattributed.is_empty()
    }
}

/// Strip directory components from an archive member path.
///
/// Wheels use `/`, but repair tools on Windows have been seen writing `\`.
pub fn base_name(member: &str) -> &str {
    member
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(member)
}

/// Map every added file to the packages it most likely came from.
///
/// A file whose base name is in the index is attributed to every package
/// that installed a file of that name. Otherwise the name is unmangled and
/// looked up again. Over-attribution is accepted: an ambiguous name pulls
/// in all candidates.
pub fn resolve<'a, A, N>(added_files: A, index: &FilenameIndex, always_include: N) -> Attribution
where
    A: IntoIterator<Item = &'a String>,
    N: IntoIterator,
    N::Item: AsRef<str>,
{
    let mut attribution = Attribution {
        packages: always_include
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect(),
        unattributed: Vec::new(),
    };

    for member in added_files {
        let file_name = base_name(member);

        let matched = match index.lookup(file_name) {
            Some(packages) => Some(packages),
            None => unmangle(file_name).and_then(|original| {
                tracing::trace!(%file_name, %original, "unmangled bundled file");
                index.lookup(&original)
            }),
        };

        match matched {
            Some(packages) => {
                tracing::debug!(%member, ?packages, "attributed bundled file");
                attribution.packages.extend(packages.iter().cloned());
            }
            None => {
                tracing::warn!(%member, "bundled file matches no installed package");
                attribution.unattributed.push(member.clone());
            }
        }
    }

    attribution.unattributed.sort();
    attribution.unattributed.dedup();
    tracing::info!(packages = ?attribution.packages, "resolved bundled packages");
    attribution
}
