//! End-to-end tests for the rw binary

use assert_cmd::Command;
use predicates::prelude::*;

fn rw() -> Command {
    let mut cmd = Command::cargo_bin("rw").unwrap();
    // keep a developer's config out of the run
    cmd.env("XDG_CONFIG_HOME", env!("CARGO_TARGET_TMPDIR"));
    cmd.env("NO_COLOR", "1");
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn test_render_ready_scenario() {
    rw()
        .args(["render", "scenarios/home.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready (200)"));
}

#[test]
fn test_render_redirect_scenario_as_json() {
    rw()
        .args(["render", "scenarios/redirect.yml", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"redirect-url\": \"/login\""));
}

#[test]
fn test_render_stale_scenario_fails() {
    rw()
        .args(["render", "scenarios/stale.yml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("LOAD_POSTS"))
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn test_render_missing_scenario() {
    rw()
        .args(["render", "scenarios/does-not-exist.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read scenario"));
}

#[test]
fn test_config_prints_defaults() {
    rw()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace: SSR/"))
        .stdout(predicate::str::contains("match-rule: exact"));
}
