#![cfg(unix)]

use std::{fs, os::unix::fs::PermissionsExt, path::Path};

use assert_cmd::Command;

fn write_script(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
    let mut permissions = fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).unwrap();
}

fn bwbridge() -> Command {
    Command::cargo_bin("bwbridge").unwrap()
}

#[test]
fn check_without_binary_fails_with_stable_tag() {
    let temp_dir = tempfile::tempdir().unwrap();

    let assert = bwbridge()
        .arg("--plugin-dir")
        .arg(temp_dir.path())
        .arg("check")
        .assert()
        .failure()
        .code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed["ok"], false);
    assert_eq!(parsed["error"], "BW_BINARY_MISSING");
}

#[test]
fn status_prints_one_json_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_script(
        &temp_dir.path().join("backend/bin/bw"),
        r#"#!/usr/bin/env bash
echo '{"serverUrl":null,"lastSync":null,"userEmail":null,"userId":null,"status":"unauthenticated"}'
"#,
    );

    let assert = bwbridge()
        .arg("--plugin-dir")
        .arg(temp_dir.path())
        .arg("status")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["data"]["status"], "unauthenticated");
}

#[test]
fn login_requires_password_in_the_environment() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_script(
        &temp_dir.path().join("backend/bin/bw"),
        "#!/usr/bin/env bash\nexit 0\n",
    );

    bwbridge()
        .arg("--plugin-dir")
        .arg(temp_dir.path())
        .args(["login", "user@example.com"])
        .env_remove("BW_PASSWORD")
        .assert()
        .failure()
        .stderr(predicates::str::contains("BW_PASSWORD"));
}

#[test]
fn login_code_flag_requires_method() {
    let temp_dir = tempfile::tempdir().unwrap();

    bwbridge()
        .arg("--plugin-dir")
        .arg(temp_dir.path())
        .args(["login", "user@example.com", "--code", "123456"])
        .env("BW_PASSWORD", "pw")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn config_file_drives_the_bridge() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_script(
        &temp_dir.path().join("plugin/backend/bin/bw"),
        "#!/usr/bin/env bash\necho 2024.6.0\n",
    );
    let config_path = temp_dir.path().join("bwbridge.toml");
    fs::write(&config_path, "plugin_dir = \"plugin\"\n").unwrap();

    let assert = bwbridge()
        .arg("--config")
        .arg(&config_path)
        .arg("check")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed["data"]["version"], "2024.6.0");
}
