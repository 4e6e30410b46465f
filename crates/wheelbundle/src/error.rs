// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for wheelbundle operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with wheelbundle Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during wheelbundle operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No .wheelbundle.yaml found in directory tree
    #[error("No .wheelbundle.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(wheelbundle::config_not_found),
        help("Create one with 'wheelbundle init' or specify a directory with -f")
    )]
    ConfigNotFound(PathBuf),

    /// Invalid YAML in config file
    #[error("Invalid .wheelbundle.yaml file: {error}")]
    #[diagnostic(
        code(wheelbundle::invalid_yaml),
        help("Check YAML syntax and ensure 'api: wheelbundle/v0' is present")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(wheelbundle::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A conda-meta record could not be parsed
    #[error("Invalid package record: {path:?}")]
    #[diagnostic(
        code(wheelbundle::invalid_record),
        help("conda-meta records are JSON documents written by conda at install time")
    )]
    InvalidRecord {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    /// Two manifests in the catalog share a name
    #[error("Package {0:?} appears more than once in the catalog")]
    #[diagnostic(code(wheelbundle::duplicate_package))]
    DuplicatePackage(String),

    /// A package that must be reported is absent from the catalog
    #[error("No manifest for package {name:?} in the catalog")]
    #[diagnostic(
        code(wheelbundle::missing_manifest),
        help("{}", suggestion_message(similar))
    )]
    MissingManifest { name: String, similar: Vec<String> },

    /// The wheel could not be read as a zip archive
    #[error("Invalid archive: {path:?}")]
    #[diagnostic(code(wheelbundle::invalid_archive))]
    InvalidArchive {
        path: PathBuf,
        #[source]
        error: zip::result::ZipError,
    },

    /// An external repair tool exited unsuccessfully
    #[error("{tool} failed with {status}")]
    #[diagnostic(
        code(wheelbundle::tool_failed),
        help("Run the command shown above with -v for the tool's full output")
    )]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
    },

    /// An external tool could not be started
    #[error("Failed to run {tool}")]
    #[diagnostic(
        code(wheelbundle::tool_not_found),
        help("Make sure {} is installed in the active environment", tool)
    )]
    ToolNotFound {
        tool: String,
        #[source]
        error: std::io::Error,
    },

    /// The repair tool produced no wheel in its output directory
    #[error("No repaired wheel found in {0:?}")]
    #[diagnostic(code(wheelbundle::repaired_wheel_not_found))]
    RepairedWheelNotFound(PathBuf),

    /// The repair tool produced more than one wheel
    #[error("Expected one repaired wheel, found {}", .0.len())]
    #[diagnostic(code(wheelbundle::ambiguous_repaired_wheel))]
    AmbiguousRepairedWheel(Vec<PathBuf>),

    /// No repair strategy exists for the platform
    #[error("Unsupported target platform: {0}")]
    #[diagnostic(
        code(wheelbundle::unsupported_platform),
        help("Set 'platform:' in .wheelbundle.yaml to one of linux, macos, windows")
    )]
    UnsupportedPlatform(String),

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(wheelbundle::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(wheelbundle::io_error))]
    Io(#[from] std::io::Error),
}

fn suggestion_message(similar: &[String]) -> String {
    if similar.is_empty() {
        "Check the always_include list in .wheelbundle.yaml against the installed packages"
            .to_string()
    } else {
        format!("Did you mean one of: {}?", similar.join(", "))
    }
}
