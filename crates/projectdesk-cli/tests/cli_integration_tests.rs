//! CLI integration tests for projectdesk
//!
//! Runs the binary end-to-end with assert_cmd. Every test gets its own config
//! directory and a zero-latency mock backend; nothing here needs the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config and `.env`
#[allow(deprecated)]
fn projectdesk_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("projectdesk").unwrap();
    cmd.current_dir(config_dir.path());
    cmd.env("PROJECTDESK_CONFIG_DIR", config_dir.path());
    cmd.env("PROJECTDESK_MOCK_LATENCY_MS", "0");
    cmd.env_remove("PROJECTDESK_API_BASE_URL");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("projects"))
        .stdout(predicate::str::contains("tasks"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_projects_list_shows_seed() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["projects", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sistema de E-commerce"))
        .stdout(predicate::str::contains("App Mobile Fitness"));
}

#[test]
fn test_projects_search_fitness() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["projects", "list", "--search", "fitness"])
        .assert()
        .success()
        .stdout(predicate::str::contains("App Mobile Fitness"))
        .stdout(predicate::str::contains("Sistema de E-commerce").not());
}

#[test]
fn test_projects_list_json_filters_status() {
    let dir = TempDir::new().unwrap();
    let output = projectdesk_cmd(&dir)
        .args(["projects", "list", "--status", "planning", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let projects: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let projects = projects.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "App Mobile Fitness");
    assert_eq!(projects[0]["startDate"], "2024-02-01");
}

#[test]
fn test_projects_show_includes_progress() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["projects", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 50%"))
        .stdout(predicate::str::contains("Integrar gateway de pagamento"));
}

#[test]
fn test_projects_show_missing() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["projects", "show", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project 999 not found"));
}

#[test]
fn test_invalid_status_filter() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["projects", "list", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status"));
}

#[test]
fn test_tasks_overdue() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["tasks", "list", "--overdue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrar gateway de pagamento"))
        .stdout(predicate::str::contains("Criar layout responsivo").not());
}

#[test]
fn test_tasks_for_empty_project() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["tasks", "list", "--project", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_stats_json() {
    let dir = TempDir::new().unwrap();
    let output = projectdesk_cmd(&dir)
        .args(["--format", "json", "stats"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["projects"]["total"], 2);
    assert_eq!(stats["projects"]["inProgress"], 1);
    assert_eq!(stats["tasks"]["completed"], 1);
}

#[test]
fn test_config_set_get_reset() {
    let dir = TempDir::new().unwrap();

    projectdesk_cmd(&dir)
        .args(["config", "set", "external.posts_limit", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set external.posts_limit = 4"));
    assert!(dir.path().join("config.toml").exists());

    projectdesk_cmd(&dir)
        .args(["config", "get", "external.posts_limit"])
        .assert()
        .success()
        .stdout(predicate::str::diff("4\n"));

    projectdesk_cmd(&dir)
        .args(["config", "reset"])
        .assert()
        .success();
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["config", "set", "mock.colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_config_path_uses_env_dir() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_unreachable_api_is_network_error() {
    let dir = TempDir::new().unwrap();
    projectdesk_cmd(&dir)
        .args(["config", "set", "external.retry_attempts", "0"])
        .assert()
        .success();

    projectdesk_cmd(&dir)
        .env("PROJECTDESK_API_BASE_URL", "http://127.0.0.1:1")
        .args(["users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network-error"));
}
