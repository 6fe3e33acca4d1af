use assert_cmd::Command;
use std::path::{Path, PathBuf};

fn write_stub_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("stub-tool");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

fn write_config(dir: &Path, binary: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!("[tool]\nbinary = \"{}\"\n", binary.display()),
    )
    .unwrap();
    path
}

fn mallet() -> Command {
    Command::cargo_bin("mallet").unwrap()
}

#[test]
fn help_exits_zero() {
    mallet().arg("--help").assert().success();
}

#[test]
fn no_args_shows_help() {
    mallet().assert().failure();
}

#[test]
fn resources_lists_catalog_without_config() {
    mallet()
        .args(["--config", "/nonexistent/config.toml", "resources"])
        .assert()
        .success()
        .stdout(predicates::str::contains("capsule"))
        .stdout(predicates::str::contains("content-synchronize"));
}

#[test]
fn resources_json_output() {
    mallet()
        .args(["--json", "resources", "capsule"])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"capsule content synchronize\""));
}

#[test]
fn resources_unknown_name_fails() {
    mallet()
        .args(["resources", "widget"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown resource"));
}

#[test]
fn run_without_config_mentions_init() {
    mallet()
        .args([
            "--config",
            "/nonexistent/config.toml",
            "run",
            "capsule",
            "list",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("config not found"))
        .stderr(predicates::str::contains("mallet init"));
}

#[test]
fn run_parses_table_from_stub() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "echo 'Id,Name'\necho '1,cap01.example.com'\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args(["--config", config.to_str().unwrap(), "run", "capsule", "list"])
        .assert()
        .success()
        .stdout(predicates::str::contains("cap01.example.com"));
}

#[test]
fn run_json_output_is_records() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "echo 'Id,Name'\necho '1,cap01.example.com'\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args([
            "--json",
            "--config",
            config.to_str().unwrap(),
            "run",
            "capsule",
            "list",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"Name\": \"cap01.example.com\""));
}

#[test]
fn run_nonzero_exit_fails_with_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "echo 'no such capsule' >&2\nexit 70\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args(["--config", config.to_str().unwrap(), "run", "capsule", "list"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("70"))
        .stderr(predicates::str::contains("no such capsule"));
}

#[test]
fn run_raw_mode_reports_failure_without_failing() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "echo 'no such capsule' >&2\nexit 70\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "run",
            "capsule",
            "delete",
            "-o",
            "id=99",
            "--raw",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("exit code: 70"));
}

#[test]
fn run_unknown_action_lists_alternatives() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "exit 0\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "run",
            "capsule",
            "explode",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown action"))
        .stderr(predicates::str::contains("content-synchronize"));
}

#[test]
fn capsule_status_against_stub() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(
        tmp.path(),
        "echo 'Last Sync Time,Active Sync Tasks,Last Failed Sync Tasks'\n\
         echo '2026/08/07 10:00:00,0,'\n",
    );
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "capsule",
            "status",
            "--id",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("0 active sync task(s)"));
}

#[test]
fn init_writes_config_and_respects_force() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("config.toml");

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "init",
            "--host",
            "sat.example.com",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("root@sat.example.com:22"));
    assert!(config.exists());

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "init",
            "--host",
            "sat.example.com",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("already exists"));

    mallet()
        .args([
            "--config",
            config.to_str().unwrap(),
            "init",
            "--host",
            "other.example.com",
            "--force",
        ])
        .assert()
        .success();
}

#[test]
fn init_show_path_prints_resolved_path() {
    mallet()
        .args(["--config", "/tmp/mallet-test/config.toml", "init", "--show-path"])
        .assert()
        .success()
        .stdout(predicates::str::contains("/tmp/mallet-test/config.toml"));
}

#[test]
fn doctor_fails_when_tool_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("config.toml");
    std::fs::write(&config, "[tool]\nbinary = \"/nonexistent/tool-binary\"\n").unwrap();

    mallet()
        .args(["--config", config.to_str().unwrap(), "doctor"])
        .assert()
        .failure()
        .stdout(predicates::str::contains("fail"));
}

#[test]
fn doctor_passes_with_stub_tool() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub_tool(tmp.path(), "echo 'hammer 3.5.1'\n");
    let config = write_config(tmp.path(), &stub);

    mallet()
        .args(["--config", config.to_str().unwrap(), "doctor"])
        .assert()
        .success()
        .stdout(predicates::str::contains("3.5.1"));
}
