//! End-to-end tests for the notewright binary.
//!
//! Nothing here reaches the real model API: runs either stop before the
//! model is called or talk to a local mock server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notewright(vault: &Path) -> Command {
    let mut cmd = Command::cargo_bin("notewright").expect("binary builds");
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--vault")
        .arg(vault)
        .arg("--config")
        .arg(vault.join("config.toml"));
    cmd
}

fn vault_with_prompts() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let prompts = dir.path().join("_prompt");
    fs::create_dir_all(prompts.join("writing")).unwrap();
    fs::write(prompts.join("summarize.md"), "Summarize: {title}").unwrap();
    fs::write(prompts.join("writing").join("outline.md"), "Outline {title}").unwrap();
    fs::write(prompts.join("scratch.txt"), "ignored").unwrap();
    fs::write(dir.path().join("config.toml"), "use_colors = false\n").unwrap();
    dir
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_list_templates() {
    let vault = vault_with_prompts();

    notewright(vault.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("writing/outline"))
        .stdout(predicate::str::contains("scratch").not());
}

#[test]
fn test_list_without_prompt_folder_is_not_fatal() {
    let vault = TempDir::new().unwrap();
    fs::write(vault.path().join("config.toml"), "use_colors = false\n").unwrap();

    notewright(vault.path())
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("Prompt folder not found: _prompt"))
        .stdout(predicate::str::contains("No prompt templates found"));
}

// =============================================================================
// Generate
// =============================================================================

#[test]
fn test_generate_unknown_template() {
    let vault = vault_with_prompts();
    let note = vault.path().join("Notes.md");
    fs::write(&note, "body").unwrap();

    notewright(vault.path())
        .args(["generate", "translate", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prompt file not found: translate"));

    assert_eq!(fs::read_to_string(&note).unwrap(), "body");
}

#[test]
fn test_generate_without_note() {
    let vault = vault_with_prompts();

    notewright(vault.path())
        .args(["generate", "summarize"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active document"));
}

#[test]
fn test_generate_without_api_key_leaves_note_alone() {
    let vault = vault_with_prompts();
    let note = vault.path().join("Notes.md");
    fs::write(&note, "# Notes\n").unwrap();

    notewright(vault.path())
        .args(["generate", "summarize", "--no-stream", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Model invocation failed"))
        .stderr(predicate::str::contains("No API key"));

    assert_eq!(fs::read_to_string(&note).unwrap(), "# Notes\n");
}

#[test]
fn test_generate_rejects_template_outside_prompt_folder() {
    let vault = vault_with_prompts();
    fs::write(vault.path().join("secret.md"), "vault secret").unwrap();
    let note = vault.path().join("Notes.md");
    fs::write(&note, "body").unwrap();

    notewright(vault.path())
        .args(["generate", "../secret", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prompt file not found: ../secret"));
}

#[test]
fn test_generate_rejects_cursor_outside_note() {
    let vault = vault_with_prompts();
    let note = vault.path().join("Notes.md");
    fs::write(&note, "one line").unwrap();

    notewright(vault.path())
        .args(["generate", "summarize", "--at", "4:0", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_generate_with_file_needs_url() {
    let vault = vault_with_prompts();
    let note = vault.path().join("Paper.md");
    fs::write(&note, "---\ntags: [paper]\n---\nbody\n").unwrap();

    notewright(vault.path())
        .args(["generate-with-file", "summarize", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Attachment unavailable"));
}

#[test]
fn test_generate_without_template_when_not_interactive() {
    let vault = vault_with_prompts();

    notewright(vault.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No template given"));
}

// =============================================================================
// Generate against a mock model API
// =============================================================================

fn point_at(vault: &Path, server: &MockServer) {
    fs::write(
        vault.join("config.toml"),
        format!(
            "use_colors = false\napi_key = \"sk-test\"\nbase_url = \"{}/v1/\"\n",
            server.uri()
        ),
    )
    .unwrap();
}

fn sse(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("event: {}\ndata: {}\n\n", event["type"].as_str().unwrap(), event))
        .collect()
}

fn delta(text: &str) -> Value {
    json!({"type": "response.output_text.delta", "delta": text})
}

async fn mount_stream(server: &MockServer, events: &[Value]) {
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"input": "Summarize: Notes", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(events), "text/event-stream"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_streams_into_note() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        &[
            delta("A "),
            delta("short "),
            delta("summary."),
            json!({"type": "response.completed", "response": {}}),
        ],
    )
    .await;

    let vault = vault_with_prompts();
    point_at(vault.path(), &server);
    let note = vault.path().join("Notes.md");
    fs::write(&note, "Intro: ").unwrap();

    notewright(vault.path())
        .args(["generate", "summarize", "--note"])
        .arg(&note)
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 16 characters"));

    assert_eq!(fs::read_to_string(&note).unwrap(), "Intro: A short summary.");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_inserts_at_requested_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({"input": "Summarize: Notes", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [{"type": "message", "content": [
                {"type": "output_text", "text": "Summary. "}
            ]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vault = vault_with_prompts();
    point_at(vault.path(), &server);
    let note = vault.path().join("Notes.md");
    fs::write(&note, "# Notes\nBody\n").unwrap();

    notewright(vault.path())
        .args(["generate", "summarize", "--no-stream", "--at", "1:0", "--note"])
        .arg(&note)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&note).unwrap(), "# Notes\nSummary. Body\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_keeps_partial_text_when_stream_fails() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        &[
            delta("A "),
            delta("short "),
            json!({"type": "error", "message": "overloaded"}),
        ],
    )
    .await;

    let vault = vault_with_prompts();
    point_at(vault.path(), &server);
    let note = vault.path().join("Notes.md");
    fs::write(&note, "Intro: ").unwrap();

    notewright(vault.path())
        .args(["generate", "summarize", "--note"])
        .arg(&note)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overloaded"));

    assert_eq!(fs::read_to_string(&note).unwrap(), "Intro: A short ");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_doctor_reports_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "bad key"}
        })))
        .mount(&server)
        .await;

    let vault = vault_with_prompts();
    point_at(vault.path(), &server);

    notewright(vault.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("API error 401: bad key"))
        .stdout(predicate::str::contains("The API key was rejected"));
}

// =============================================================================
// Config & init
// =============================================================================

#[test]
fn test_config_set_persists_only_that_field() {
    let vault = vault_with_prompts();

    notewright(vault.path())
        .args(["config", "set", "model-name", "gpt-4.1-mini"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated model-name"));

    let saved = fs::read_to_string(vault.path().join("config.toml")).unwrap();
    assert!(saved.contains("model_name = \"gpt-4.1-mini\""));
    assert!(saved.contains("prompt_folder = \"_prompt\""));

    notewright(vault.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Model: gpt-4.1-mini"))
        .stdout(predicate::str::contains("API key: (not set)"));
}

#[test]
fn test_config_set_api_key_is_masked() {
    let vault = vault_with_prompts();

    notewright(vault.path())
        .args(["config", "set", "api-key", "sk-secret-1234"])
        .assert()
        .success();

    notewright(vault.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"))
        .stdout(predicate::str::contains("sk-secret").not());
}

#[test]
fn test_init_creates_config_and_sample_template() {
    let vault = TempDir::new().unwrap();

    notewright(vault.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));

    assert!(vault.path().join("config.toml").exists());
    let sample = fs::read_to_string(vault.path().join("_prompt").join("summarize.md")).unwrap();
    assert!(sample.contains("{title}"));

    notewright(vault.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"));
}
