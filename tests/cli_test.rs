//! Integration tests for the crosskit binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn crosskit(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("crosskit"));
    cmd.current_dir(temp.path()).env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("crosskit"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cross-compilation toolchain provisioning"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("generate"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("crosskit"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_a_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("crosskit"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn detect_with_platform_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    crosskit(&temp)
        .args(["--platform", "debian", "detect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform: debian"))
        .stdout(predicate::str::contains("Provider: apt"));
    Ok(())
}

#[test]
fn detect_json_with_platform_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = crosskit(&temp)
        .args(["--platform", "arch", "--json", "detect"])
        .output()?;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["family"], "arch");
    assert_eq!(value["provider_id"], "pacman");
    Ok(())
}

#[test]
fn unsupported_platform_override_exits_2() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    crosskit(&temp)
        .args(["--platform", "unsupported", "detect"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported platform"));
    Ok(())
}

#[test]
fn generate_writes_configs() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    crosskit(&temp)
        .args([
            "--platform",
            "debian",
            "generate",
            "--target",
            "aarch64-unknown-linux-gnu",
            "--output",
            "cross",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Result: complete (exit 0)"));

    let out = temp.path().join("cross");
    let cmake = fs::read_to_string(out.join("toolchain.cmake"))?;
    assert!(cmake.contains("set(CMAKE_C_COMPILER \"/usr/bin/aarch64-linux-gnu-gcc\")"));
    assert!(out.join("config.site").is_file());
    assert!(out.join("cross-toolchain.pc").is_file());
    assert!(out.join("env.sh").is_file());
    assert!(out.join("toolchain.json").is_file());
    Ok(())
}

#[test]
fn generate_reads_project_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::create_dir_all(temp.path().join(".crosskit"))?;
    fs::write(
        temp.path().join(".crosskit/config.yml"),
        "target: riscv64gc-unknown-linux-gnu\nplatform: fedora\ncpu_tuning: sifive-u74\n",
    )?;

    crosskit(&temp)
        .args(["--json", "generate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"target\": \"riscv64gc-unknown-linux-gnu\""));

    let site = fs::read_to_string(temp.path().join(".crosskit/out/config.site"))?;
    assert!(site.contains("-mcpu=sifive-u74"));
    Ok(())
}

#[test]
fn generate_rejects_relative_sysroot() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::create_dir_all(temp.path().join(".crosskit"))?;
    fs::write(
        temp.path().join(".crosskit/config.yml"),
        "target: aarch64-unknown-linux-gnu\nsysroot: sysroot\n",
    )?;

    crosskit(&temp)
        .args(["--platform", "debian", "generate"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("sysroot"));
    assert!(!temp.path().join(".crosskit/out/toolchain.cmake").exists());
    Ok(())
}

#[test]
fn invalid_config_exits_5() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::create_dir_all(temp.path().join(".crosskit"))?;
    fs::write(
        temp.path().join(".crosskit/config.yml"),
        "settings:\n  max_parallel: 0\n",
    )?;

    crosskit(&temp)
        .args(["--platform", "debian", "generate", "--target", "aarch64-unknown-linux-gnu"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("max_parallel"));
    Ok(())
}

#[test]
fn missing_explicit_config_exits_5() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    crosskit(&temp)
        .args(["--config", "missing.yml", "--platform", "debian", "generate"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("Configuration not found"));
    Ok(())
}
