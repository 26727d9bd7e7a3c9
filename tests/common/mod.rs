use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use docbot::config::Config;
use docbot::storage::SqliteStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// API prefix the mock server serves under, matching real deployments
#[allow(dead_code)]
pub const API_PREFIX: &str = "/api/v1";

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("state.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointing at a mock server, without a catalog fetch
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.base_url = format!("{}{}", server.uri(), API_PREFIX);
    config.service.timeout_seconds = 5;
    config.chat.default_mode = "general".to_string();
    config.chat.load_modes_from_service = false;
    config
}

/// Mount a `POST chat` responder returning `answer`
#[allow(dead_code)]
pub async fn mount_answer(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{}/chat", API_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": answer,
            "timestamp": "2025-01-15T10:30:00",
            "sources": [{"doc": "readme.md", "section": "Overview"}],
            "suggestions": ["Tell me more"]
        })))
        .mount(server)
        .await;
}
