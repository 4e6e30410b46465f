// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Wheel member listings.

use std::collections::BTreeSet;
use std::path::Path;

use zip::ZipArchive;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./archive_test.rs"]
mod archive_test;

/// List the file members of a wheel. Directory entries are skipped.
pub fn list_members<P: AsRef<Path>>(wheel: P) -> Result<BTreeSet<String>> {
    let wheel = wheel.as_ref();
    let file = std::fs::File::open(wheel).map_err(|e| Error::ReadFailed {
        path: wheel.to_path_buf(),
        error: e,
    })?;
    let archive = ZipArchive::new(std::io::BufReader::new(file)).map_err(|e| {
        Error::InvalidArchive {
            path: wheel.to_path_buf(),
            error: e,
        }
    })?;

    let members: BTreeSet<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(String::from)
        .collect();
    tracing::trace!(wheel = %wheel.display(), members = members.len(), "listed wheel");
    Ok(members)
}

/// Members present in `after` but not in `before`.
///
/// This is the set of files a repair tool injected; files it rewrote in
/// place (RECORD, WHEEL, the extension module itself) are not included.
pub fn added_files(before: &BTreeSet<String>, after: &BTreeSet<String>) -> BTreeSet<String> {
    after.difference(before).cloned().collect()
}
