// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Repair a wheel and report the licenses of what was bundled into it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::archive::{added_files, list_members};
use crate::attribution::{Attribution, resolve};
use crate::repair::RepairStrategy;
use crate::{BuildConfig, Catalog, FilenameIndex, LicenseReport, Result};

#[cfg(test)]
#[path = "./workflow_test.rs"]
mod workflow_test;

/// What attributing one repaired wheel produced.
#[derive(Debug, Clone)]
pub struct WheelAttribution {
    /// Members the repair tool added.
    pub added_files: BTreeSet<String>,
    pub attribution: Attribution,
    pub report: LicenseReport,
}

/// Result of a full repair run.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Final location of the repaired wheel.
    pub wheel: PathBuf,
    /// Where the license report was written.
    pub report_path: PathBuf,
    pub attributed: WheelAttribution,
}

/// Attribute the files added between two versions of a wheel.
pub fn attribute_wheels<N>(
    before: &Path,
    after: &Path,
    catalog: &Catalog,
    always_include: N,
) -> Result<WheelAttribution>
where
    N: IntoIterator,
    N::Item: AsRef<str>,
{
    let before_members = list_members(before)?;
    let after_members = list_members(after)?;
    let added = added_files(&before_members, &after_members);
    tracing::debug!(added = ?added, "files added by repair");

    let index = FilenameIndex::from_catalog(catalog);
    let attribution = resolve(&added, &index, always_include);
    let report = LicenseReport::build(&attribution.packages, catalog)?;

    Ok(WheelAttribution {
        added_files: added,
        attribution,
        report,
    })
}

/// Repair `wheel` with `strategy`, then write the repaired wheel and its
/// license report into the configured output directory.
///
/// The repair tool writes into a temporary wheelhouse that is removed when
/// this returns, whether or not the run succeeded.
pub async fn repair_wheel(
    wheel: &Path,
    config: &BuildConfig,
    strategy: &dyn RepairStrategy,
    catalog: &Catalog,
) -> Result<RepairOutcome> {
    // Fail on a misconfigured catalog before spending time in the tool
    for name in &config.always_include {
        catalog.require(name)?;
    }

    let out_dir = config.out_dir()?;
    std::fs::create_dir_all(&out_dir)?;

    let wheelhouse = tempfile::Builder::new()
        .prefix("wheelbundle-")
        .tempdir()?;
    tracing::debug!(
        tool = strategy.name(),
        wheelhouse = %wheelhouse.path().display(),
        "repairing wheel"
    );

    let repaired = strategy.repair(wheel, wheelhouse.path()).await?;
    let attributed = attribute_wheels(wheel, &repaired, catalog, &config.always_include)?;

    let file_name = repaired.file_name().ok_or_else(|| {
        crate::Error::ValidationFailed(format!(
            "Repaired wheel has no file name: {}",
            repaired.display()
        ))
    })?;
    let dest = out_dir.join(file_name);
    move_file(&repaired, &dest)?;

    let report_path = config.report_path()?;
    attributed.report.write_to(&report_path)?;

    tracing::info!(wheel = %dest.display(), "repaired wheel");
    Ok(RepairOutcome {
        wheel: dest,
        report_path,
        attributed,
    })
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if std::fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    std::fs::copy(src, dest)?;
    std::fs::remove_file(src)?;
    Ok(())
}
