// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! wheelbundle - bundled library attribution for repaired wheels
//!
//! Repair tools such as `auditwheel`, `delocate` and `delvewheel` copy the
//! shared libraries a native extension links against into the wheel itself,
//! often renaming them with a hash fragment to avoid collisions. This crate
//! works out which installed packages those bundled files came from so that
//! their license texts can be shipped alongside the wheel.
//!
//! # Overview
//!
//! 1. Load a [`Catalog`] of installed package manifests (a conda prefix).
//! 2. Build a [`FilenameIndex`] from it.
//! 3. Diff the member listings of the wheel before and after repair.
//! 4. [`resolve`] the added files against the index, undoing name mangling.
//! 5. Render a [`LicenseReport`] for the attributed packages.
//!
//! # Example
//!
//! ```yaml
//! # .wheelbundle.yaml
//! api: wheelbundle/v0
//!
//! # Packages whose license text is always bundled
//! always_include:
//!   - ocp
//!   - vtk
//!
//! plat: manylinux_2_31_x86_64
//! out_dir: dist
//! ```

pub mod archive;
pub mod attribution;
pub mod catalog;
pub mod conda;
pub mod config;
pub mod error;
pub mod index;
pub mod mangle;
pub mod repair;
pub mod report;
pub mod workflow;

pub use archive::{added_files, list_members};
pub use attribution::{Attribution, base_name, resolve};
pub use catalog::{Catalog, PackageManifest};
pub use config::{ApiVersion, BuildConfig, find_config};
pub use error::{Error, Result};
pub use index::FilenameIndex;
pub use mangle::{Mangling, unmangle};
pub use repair::{RepairStrategy, StrategyOptions, TargetPlatform, ToolCommand, select_strategy};
pub use report::LicenseReport;
pub use workflow::{RepairOutcome, WheelAttribution, attribute_wheels, repair_wheel};

/// Well-known filename for build configuration.
pub const CONFIG_FILENAME: &str = ".wheelbundle.yaml";

/// Default filename of the license report written next to the wheel.
pub const DEFAULT_REPORT_NAME: &str = "LICENSES.bundled.txt";
