// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use async_trait::async_trait;
use rstest::rstest;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use super::*;
use crate::PackageManifest;
use crate::repair::ToolCommand;

const BASE_MEMBERS: &[&str] = &[
    "OCP.cpython-39-x86_64-linux-gnu.so",
    "vtkmodules/__init__.py",
    "ocpvtk-7.5.1.dist-info/RECORD",
];

const BUNDLED: &[&str] = &[
    "ocpvtk.libs/libvtkCommonColor-9-9810eeb7.0.so.9.0.1",
    "ocpvtk.libs/libTKernel-0a1b2c3d.so.7",
    "ocpvtk.libs/libmystery.so.2",
];

fn write_wheel(path: &Path, members: &[&str]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for member in members {
        zip.start_file(*member, SimpleFileOptions::default()).unwrap();
        zip.write_all(b"contents").unwrap();
    }
    zip.finish().unwrap();
}

fn catalog() -> Catalog {
    let mut vtk = PackageManifest::new("vtk", "9.0.1");
    vtk.installed_files
        .insert(PathBuf::from("/opt/conda/lib/libvtkCommonColor-9.0.so.9.0.1"));
    let mut occt = PackageManifest::new("occt", "7.5.1");
    occt.installed_files
        .insert(PathBuf::from("/opt/conda/lib/libTKernel.so.7"));
    let ocp = PackageManifest::new("ocp", "7.5.1");
    Catalog::from_manifests(vec![vtk, occt, ocp]).unwrap()
}

/// Stands in for auditwheel: writes a copy of the wheel with extra members.
struct FakeRepair {
    extra: Vec<&'static str>,
    fail: bool,
}

#[async_trait]
impl RepairStrategy for FakeRepair {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn commands(&self, _wheel: &Path, _wheelhouse: &Path) -> Vec<ToolCommand> {
        Vec::new()
    }

    async fn repair(&self, wheel: &Path, wheelhouse: &Path) -> Result<PathBuf> {
        if self.fail {
            return Err(crate::Error::RepairedWheelNotFound(wheelhouse.to_path_buf()));
        }
        let mut members = list_members(wheel)?;
        members.extend(self.extra.iter().map(|m| m.to_string()));
        let members: Vec<&str> = members.iter().map(String::as_str).collect();
        let repaired = wheelhouse.join("ocpvtk-7.5.1-cp39-cp39-manylinux_2_31_x86_64.whl");
        write_wheel(&repaired, &members);
        Ok(repaired)
    }
}

#[rstest]
fn test_attribute_wheels() {
    let tmp = TempDir::new().unwrap();
    let before = tmp.path().join("before.whl");
    let after = tmp.path().join("after.whl");
    write_wheel(&before, BASE_MEMBERS);
    write_wheel(&after, &[BASE_MEMBERS, BUNDLED].concat());

    let result = attribute_wheels(&before, &after, &catalog(), ["ocp"]).unwrap();
    assert_eq!(result.added_files.len(), 3);
    let names: Vec<_> = result
        .attribution
        .packages
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["occt", "ocp", "vtk"]);
    assert_eq!(result.attribution.unattributed, vec!["ocpvtk.libs/libmystery.so.2"]);
    assert_eq!(result.report.entries().len(), 3);
}

#[rstest]
fn test_attribute_identical_wheels_keeps_always_include() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("ocpvtk.whl");
    write_wheel(&wheel, BASE_MEMBERS);

    let result = attribute_wheels(&wheel, &wheel, &catalog(), ["ocp", "vtk"]).unwrap();
    assert!(result.added_files.is_empty());
    assert_eq!(result.attribution.packages.len(), 2);
}

#[tokio::test]
async fn test_repair_wheel_writes_outputs() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("ocpvtk-7.5.1-cp39-cp39-linux_x86_64.whl");
    write_wheel(&wheel, BASE_MEMBERS);

    let config = BuildConfig {
        always_include: vec!["ocp".to_string(), "vtk".to_string()],
        out_dir: tmp.path().join("dist"),
        ..Default::default()
    };
    let strategy = FakeRepair {
        extra: BUNDLED.to_vec(),
        fail: false,
    };

    let outcome = repair_wheel(&wheel, &config, &strategy, &catalog())
        .await
        .expect("Repair should succeed");

    assert_eq!(
        outcome.wheel,
        tmp.path()
            .join("dist")
            .join("ocpvtk-7.5.1-cp39-cp39-manylinux_2_31_x86_64.whl")
    );
    assert!(outcome.wheel.is_file());
    assert!(wheel.is_file(), "input wheel is left in place");

    let report = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.contains("Name: occt"));
    assert!(report.contains("Name: ocp"));
    assert!(report.contains("Name: vtk"));
    assert_eq!(outcome.attributed.attribution.unattributed.len(), 1);
}

#[tokio::test]
async fn test_repair_wheel_missing_always_include_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("ocpvtk.whl");
    write_wheel(&wheel, BASE_MEMBERS);

    let config = BuildConfig {
        always_include: vec!["cadquery".to_string()],
        out_dir: tmp.path().join("dist"),
        ..Default::default()
    };
    let strategy = FakeRepair {
        extra: Vec::new(),
        fail: false,
    };

    match repair_wheel(&wheel, &config, &strategy, &catalog()).await {
        Err(crate::Error::MissingManifest { name, .. }) => assert_eq!(name, "cadquery"),
        other => panic!("Expected MissingManifest, got: {:?}", other),
    }
    assert!(!tmp.path().join("dist").exists());
}

#[tokio::test]
async fn test_repair_failure_propagates() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("ocpvtk.whl");
    write_wheel(&wheel, BASE_MEMBERS);

    let config = BuildConfig {
        out_dir: tmp.path().join("dist"),
        ..Default::default()
    };
    let strategy = FakeRepair {
        extra: Vec::new(),
        fail: true,
    };

    let result = repair_wheel(&wheel, &config, &strategy, &catalog()).await;
    assert!(matches!(result, Err(crate::Error::RepairedWheelNotFound(_))));
    assert!(!tmp.path().join("dist").join(crate::DEFAULT_REPORT_NAME).exists());
}
