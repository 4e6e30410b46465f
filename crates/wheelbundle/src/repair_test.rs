// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

fn options() -> StrategyOptions {
    StrategyOptions {
        prefix: PathBuf::from("/opt/conda"),
        plat: Some("manylinux_2_31_x86_64".to_string()),
    }
}

fn rendered(commands: &[ToolCommand]) -> Vec<String> {
    commands.iter().map(ToString::to_string).collect()
}

#[rstest]
#[case(TargetPlatform::Linux, "auditwheel")]
#[case(TargetPlatform::Macos, "delocate")]
#[case(TargetPlatform::Windows, "delvewheel")]
fn test_select_strategy(#[case] platform: TargetPlatform, #[case] expected: &str) {
    let strategy = select_strategy(platform, options());
    assert_eq!(strategy.name(), expected);
}

#[rstest]
fn test_auditwheel_commands() {
    let strategy = select_strategy(TargetPlatform::Linux, options());
    let commands = strategy.commands(Path::new("/build/ocpvtk.whl"), Path::new("/tmp/wh"));
    assert_eq!(
        rendered(&commands),
        vec![
            "LD_LIBRARY_PATH=/opt/conda/lib /opt/conda/bin/python -m auditwheel show /build/ocpvtk.whl",
            "LD_LIBRARY_PATH=/opt/conda/lib /opt/conda/bin/python -m auditwheel repair \
             --plat=manylinux_2_31_x86_64 --wheel-dir=/tmp/wh /build/ocpvtk.whl",
        ]
    );
}

#[rstest]
fn test_auditwheel_without_plat() {
    let strategy = select_strategy(
        TargetPlatform::Linux,
        StrategyOptions {
            plat: None,
            ..options()
        },
    );
    let commands = strategy.commands(Path::new("w.whl"), Path::new("out"));
    assert!(!commands[1].to_string().contains("--plat"));
}

#[rstest]
fn test_delocate_commands() {
    let strategy = select_strategy(TargetPlatform::Macos, options());
    let commands = strategy.commands(Path::new("/build/ocpvtk.whl"), Path::new("/tmp/wh"));
    assert_eq!(
        rendered(&commands),
        vec![
            "DYLD_LIBRARY_PATH=/opt/conda/lib /opt/conda/bin/delocate-listdeps /build/ocpvtk.whl",
            "DYLD_LIBRARY_PATH=/opt/conda/lib /opt/conda/bin/delocate-wheel -w /tmp/wh -v /build/ocpvtk.whl",
        ]
    );
}

#[rstest]
fn test_delvewheel_commands() {
    let strategy = select_strategy(TargetPlatform::Windows, options());
    let commands = strategy.commands(Path::new("ocpvtk.whl"), Path::new("wh"));
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[1].args[2], OsString::from("repair"));
    assert!(commands[1].args.contains(&OsString::from("--add-path")));
    assert!(commands.iter().all(|c| c.env.is_empty()));
}

#[rstest]
fn test_find_repaired_wheel() {
    let tmp = TempDir::new().unwrap();
    match find_repaired_wheel(tmp.path()) {
        Err(Error::RepairedWheelNotFound(_)) => {}
        other => panic!("Expected RepairedWheelNotFound, got: {:?}", other),
    }

    let first = tmp.path().join("ocpvtk-7.5.1-cp39-cp39-manylinux_2_31_x86_64.whl");
    std::fs::write(&first, "").unwrap();
    std::fs::write(tmp.path().join("auditwheel.log"), "").unwrap();
    assert_eq!(find_repaired_wheel(tmp.path()).unwrap(), first);

    std::fs::write(tmp.path().join("other-1.0-py3-none-any.whl"), "").unwrap();
    match find_repaired_wheel(tmp.path()) {
        Err(Error::AmbiguousRepairedWheel(wheels)) => assert_eq!(wheels.len(), 2),
        other => panic!("Expected AmbiguousRepairedWheel, got: {:?}", other),
    }
}

#[rstest]
#[case("build[1]")]
#[case("wheel*house")]
#[case("what?")]
fn test_find_repaired_wheel_special_characters(#[case] dir_name: &str) {
    let tmp = TempDir::new().unwrap();
    let wheelhouse = tmp.path().join(dir_name);
    std::fs::create_dir(&wheelhouse).unwrap();
    let wheel = wheelhouse.join("x-1.0-py3-none-manylinux_2_31_x86_64.whl");
    std::fs::write(&wheel, "").unwrap();

    assert_eq!(find_repaired_wheel(&wheelhouse).unwrap(), wheel);
}

#[rstest]
#[case("linux", TargetPlatform::Linux)]
#[case("macos", TargetPlatform::Macos)]
#[case("windows", TargetPlatform::Windows)]
fn test_platform_serde_names(#[case] name: &str, #[case] expected: TargetPlatform) {
    let parsed: TargetPlatform = serde_yaml::from_str(name).unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(expected.to_string(), name);
}

#[tokio::test]
async fn test_missing_tool_reported() {
    let command = ToolCommand::new("/nonexistent/wheelbundle-repair-tool").arg("show");
    match command.run().await {
        Err(Error::ToolNotFound { tool, .. }) => {
            assert_eq!(tool, "/nonexistent/wheelbundle-repair-tool")
        }
        other => panic!("Expected ToolNotFound, got: {:?}", other),
    }
}
