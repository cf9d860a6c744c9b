use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley::config::Config;

pub const EMBEDDING_DIMENSION: usize = 3;

/// Configuration pointing every provider at the mock server and storage at a temp dir
#[allow(dead_code)]
pub fn mock_config(server: &MockServer) -> (Config, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let mut config = Config::default();
    config.providers.gemini.api_key = Some("test-key".to_string());
    config.providers.gemini.api_base = server.uri();
    config.providers.huggingface.api_key = Some("hf-test".to_string());
    config.providers.huggingface.api_base = server.uri();
    config.memory.embedding_dimension = EMBEDDING_DIMENSION;
    config.storage.path = Some(tmp.path().join("parley.db"));
    (config, tmp)
}

#[allow(dead_code)]
pub fn gemini_path(config: &Config) -> String {
    format!(
        "/v1beta/models/{}:generateContent",
        config.providers.gemini.model
    )
}

#[allow(dead_code)]
pub fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    }))
}

/// Answer reminder-extraction prompts with a fixed JSON payload
///
/// Must be mounted before any catch-all Gemini mock.
#[allow(dead_code)]
pub async fn mount_extraction(server: &MockServer, config: &Config, answer: &str) {
    Mock::given(method("POST"))
        .and(path(gemini_path(config)))
        .and(body_string_contains("isReminder"))
        .respond_with(gemini_reply(answer))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_chat(server: &MockServer, config: &Config, reply: &str) {
    Mock::given(method("POST"))
        .and(path(gemini_path(config)))
        .respond_with(gemini_reply(reply))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_embeddings(server: &MockServer, config: &Config, vector: [f32; EMBEDDING_DIMENSION]) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}",
            config.providers.huggingface.embedding_model
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(vector)))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_image(server: &MockServer, config: &Config, bytes: &[u8]) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}",
            config.providers.huggingface.image_model
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(bytes.to_vec()),
        )
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn temp_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("failed to write file");
    path
}
