use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::{TempDir, tempdir};

const SECRETS: &str = r#"
artifactory:
  username: "${CONVEYOR_TEST_USER}"
  password: hunter2
s3: ~
"#;

fn config(notifications: &str) -> String {
    format!(
        r#"
products:
  - product_name: widget
    git_repository: https://git.example.com/widget.git
    default_target_branch: main
    repositories:
      artifactory:
        enabled: true
        credentials_ref: artifactory
      nexus:
        enabled: true
      s3:
        enabled: false
        credentials_ref: s3
    notifications:
{notifications}
"#
    )
}

const NO_NOTIFICATIONS: &str = r#"      email:
        enabled: false
      slack:
        enabled: false"#;

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("write");
}

fn workspace(config: &str) -> TempDir {
    let td = tempdir().expect("tempdir");
    write_file(&td.path().join("config.yaml"), config);
    write_file(&td.path().join("secrets.yaml"), SECRETS);
    td
}

fn conveyor(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("conveyor"));
    cmd.current_dir(dir)
        .env_remove("CONVEYOR_CONFIG")
        .env_remove("CONVEYOR_SECRETS")
        .env("RUST_LOG", "info");
    cmd
}

fn closed_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port()
}

#[test]
fn run_all_stages_succeeds() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget"])
        .assert()
        .success()
        .stdout(contains("Stage 'build' completed successfully"))
        .stdout(contains("Stage 'deploy' completed successfully"))
        .stdout(contains("Stage 'notify' completed successfully"))
        .stdout(contains("Pipeline completed successfully"));
}

#[test]
fn run_accepts_underscore_aliases() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args([
            "run",
            "--repo_name",
            "widget",
            "--target_branch",
            "release",
            "--stages",
            "build",
        ])
        .assert()
        .success()
        .stdout(contains("Stage 'build' completed successfully"))
        .stdout(contains("Stage 'deploy'").not());
}

#[test]
fn run_respects_stage_order() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    let output = conveyor(td.path())
        .args(["run", "--repo-name", "widget", "--stages", "notify, build"])
        .output()
        .expect("run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let notify = stdout.find("Stage 'notify' started").expect("notify ran");
    let build = stdout.find("Stage 'build' started").expect("build ran");
    assert!(notify < build, "{stdout}");
    assert!(!stdout.contains("Stage 'deploy' started"), "{stdout}");
}

#[test]
fn invalid_stage_exits_with_config_error() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget", "--stages", "build,test"])
        .assert()
        .code(1)
        .stderr(contains(
            "error: stage 'test' is not valid. Valid stages are: build, deploy, notify",
        ))
        .stdout(contains("started").not());
}

#[test]
fn duplicate_stage_exits_with_config_error() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget", "--stages", "deploy,deploy"])
        .assert()
        .code(1)
        .stderr(contains("deploy"));
}

#[test]
fn unknown_product_exits_with_config_error() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "gadget"])
        .assert()
        .code(1)
        .stderr(contains("error: product 'gadget' not found in configuration"))
        .stdout(contains("started").not());
}

#[test]
fn missing_config_exits_with_config_error() {
    let td = tempdir().expect("tempdir");
    write_file(&td.path().join("secrets.yaml"), SECRETS);

    conveyor(td.path())
        .args(["run", "--repo-name", "widget"])
        .assert()
        .code(1)
        .stderr(contains("config.yaml"));
}

#[test]
fn missing_secrets_exits_with_config_error() {
    let td = tempdir().expect("tempdir");
    write_file(&td.path().join("config.yaml"), &config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget"])
        .assert()
        .code(1)
        .stderr(contains("secrets.yaml"));
}

#[test]
fn config_paths_from_environment() {
    let td = tempdir().expect("tempdir");
    let config_path = td.path().join("pipeline.yaml");
    let secrets_path = td.path().join("vault.yaml");
    write_file(&config_path, &config(NO_NOTIFICATIONS));
    write_file(&secrets_path, SECRETS);

    conveyor(td.path())
        .env("CONVEYOR_CONFIG", &config_path)
        .env("CONVEYOR_SECRETS", &secrets_path)
        .args(["run", "--repo-name", "widget", "--stages", "build"])
        .assert()
        .success();
}

#[test]
fn delivery_failure_exits_two_and_skips_later_stages() {
    let notifications = format!(
        r#"      email:
        enabled: true
        config:
          smtp_server: 127.0.0.1
          port: {}"#,
        closed_port()
    );
    let td = workspace(&config(&notifications));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget", "--stages", "notify,build"])
        .assert()
        .code(2)
        .stdout(contains("Stage 'notify' failed"))
        .stdout(contains("Stage 'build' skipped"));
}

#[test]
fn continue_policy_runs_remaining_stages() {
    let notifications = format!(
        r#"      slack:
        enabled: true
        config:
          webhook_url: http://127.0.0.1:{}/hook"#,
        closed_port()
    );
    let td = workspace(&config(&notifications));

    conveyor(td.path())
        .args([
            "run",
            "--repo-name",
            "widget",
            "--stages",
            "notify,build",
            "--on-failure",
            "continue",
        ])
        .assert()
        .code(2)
        .stdout(contains("Stage 'notify' failed"))
        .stdout(contains("Stage 'build' completed successfully"));
}

#[test]
fn validate_reports_valid_configuration() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("widget (2 target(s), 0 channel(s))"))
        .stdout(contains("Configuration is valid"));
}

#[test]
fn products_lists_enabled_destinations() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .arg("products")
        .assert()
        .success()
        .stdout(contains("widget  branch=main  targets=[artifactory,nexus]  channels=[]"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["run", "--repo-name", "widget", "--bogus"])
        .assert()
        .code(1);
}

#[test]
fn json_logs_go_to_stderr() {
    let td = workspace(&config(NO_NOTIFICATIONS));

    conveyor(td.path())
        .args(["--log-json", "run", "--repo-name", "widget", "--stages", "build"])
        .assert()
        .success()
        .stderr(contains("\"level\":\"INFO\""));
}
