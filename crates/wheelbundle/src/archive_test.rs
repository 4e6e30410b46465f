// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use rstest::rstest;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use super::*;

fn write_wheel(path: &Path, members: &[&str]) {
    let file = std::fs::File::create(path).expect("Failed to create wheel");
    let mut zip = zip::ZipWriter::new(file);
    for member in members {
        if member.ends_with('/') {
            zip.add_directory(*member, SimpleFileOptions::default())
                .unwrap();
        } else {
            zip.start_file(*member, SimpleFileOptions::default())
                .unwrap();
            zip.write_all(member.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}

#[rstest]
fn test_list_members_skips_directories() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("ocpvtk-7.5.1-cp39-cp39-linux_x86_64.whl");
    write_wheel(
        &wheel,
        &[
            "OCP.cpython-39-x86_64-linux-gnu.so",
            "vtkmodules/",
            "vtkmodules/__init__.py",
            "ocpvtk-7.5.1.dist-info/RECORD",
        ],
    );

    let members = list_members(&wheel).expect("Should list members");
    assert_eq!(members.len(), 3);
    assert!(members.contains("vtkmodules/__init__.py"));
    assert!(!members.contains("vtkmodules/"));
}

#[rstest]
fn test_list_members_not_a_zip() {
    let tmp = TempDir::new().unwrap();
    let wheel = tmp.path().join("broken.whl");
    std::fs::write(&wheel, "not a zip").unwrap();
    match list_members(&wheel) {
        Err(Error::InvalidArchive { .. }) => {}
        other => panic!("Expected InvalidArchive, got: {:?}", other),
    }
}

#[rstest]
fn test_list_members_missing_file() {
    let tmp = TempDir::new().unwrap();
    match list_members(tmp.path().join("missing.whl")) {
        Err(Error::ReadFailed { .. }) => {}
        other => panic!("Expected ReadFailed, got: {:?}", other),
    }
}

#[rstest]
fn test_added_files_is_difference() {
    let tmp = TempDir::new().unwrap();
    let before_path = tmp.path().join("before.whl");
    let after_path = tmp.path().join("after.whl");
    write_wheel(
        &before_path,
        &["OCP.so", "ocpvtk-7.5.1.dist-info/RECORD"],
    );
    write_wheel(
        &after_path,
        &[
            "OCP.so",
            "ocpvtk-7.5.1.dist-info/RECORD",
            "ocpvtk.libs/",
            "ocpvtk.libs/libTKernel-0a1b2c3d.so.7",
            "ocpvtk.libs/libz-a1b2c3d4.so.1",
        ],
    );

    let before = list_members(&before_path).unwrap();
    let after = list_members(&after_path).unwrap();
    let added = added_files(&before, &after);
    let added: Vec<_> = added.iter().map(String::as_str).collect();
    assert_eq!(
        added,
        vec![
            "ocpvtk.libs/libTKernel-0a1b2c3d.so.7",
            "ocpvtk.libs/libz-a1b2c3d4.so.1",
        ]
    );
}
