#![allow(deprecated)]

//! Command-line integration tests
//!
//! Runs the `docbot` binary with temporary config and state files. Every
//! command strips `DOCBOT_*` variables so the host environment cannot leak
//! into the run.

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
mod common;

use common::{temp_config_file, API_PREFIX};

const VALID_CONFIG: &str = "service:\n  base_url: http://127.0.0.1:9/api/v1\n  timeout_seconds: 5\n";

fn docbot() -> Command {
    let mut cmd = Command::cargo_bin("docbot").unwrap();
    for var in [
        "DOCBOT_API_URL",
        "DOCBOT_CLIENT",
        "DOCBOT_TIMEOUT_SECONDS",
        "DOCBOT_DEFAULT_MODE",
        "DOCBOT_MAX_MESSAGE_CHARS",
        "DOCBOT_STATE_DB",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_version_flag() {
    docbot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docbot"));
}

#[test]
fn test_help_lists_commands() {
    docbot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("session"));
}

#[test]
fn test_session_show_without_persisted_session() {
    let (temp_dir, config_path) = temp_config_file(VALID_CONFIG);
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .arg("session")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No persisted session."));
}

#[test]
fn test_session_reset_persists_new_token() {
    let (temp_dir, config_path) = temp_config_file(VALID_CONFIG);
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .args(["session", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started a new session:"));

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .args(["session", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session:"));
}

#[test]
fn test_invalid_timeout_is_rejected() {
    let (temp_dir, config_path) =
        temp_config_file("service:\n  base_url: http://localhost:8000/api/v1\n  timeout_seconds: 0\n");
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .args(["session", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_seconds"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let (temp_dir, config_path) = temp_config_file("service:\n  base_url: ftp://docs.example\n");
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .arg("health")
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_modes_lists_service_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/chat/modes", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "modes": [
                {"id": "general", "name": "General Q&A", "description": "Ask anything"},
                {"id": "api_reference", "name": "API Reference", "description": "Endpoints"}
            ],
            "modules": []
        })))
        .mount(&server)
        .await;

    let (temp_dir, config_path) = temp_config_file(VALID_CONFIG);
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .arg("--api-url")
        .arg(format!("{}{}", server.uri(), API_PREFIX))
        .arg("modes")
        .assert()
        .success()
        .stdout(predicate::str::contains("api_reference"))
        .stdout(predicate::str::contains("API Reference"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/health", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "service": "DocBot API",
            "client": "Acme"
        })))
        .mount(&server)
        .await;

    let (temp_dir, config_path) = temp_config_file(VALID_CONFIG);
    let state_db = temp_dir.path().join("state.db");

    docbot()
        .arg("--config")
        .arg(&config_path)
        .arg("--state-db")
        .arg(&state_db)
        .arg("--api-url")
        .arg(format!("{}{}", server.uri(), API_PREFIX))
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("healthy"))
        .stdout(predicate::str::contains("Acme"));
}
