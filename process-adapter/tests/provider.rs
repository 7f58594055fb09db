//! Integration tests driving `ExternalProcessProvider` against real processes.
//!
//! Fake tools are small shell scripts written to a temporary directory. Every
//! script answers `--version` so that `initialize` succeeds, and provider
//! configs carry a small retry budget so a freshly written script that is
//! briefly busy (`ETXTBSY`) does not fail a test.

#![cfg(unix)]

use futures::StreamExt;
use llm_relay_process::{
    AdapterError, ExternalProcessProvider, Provider, ProviderConfig, Request, Role, StreamEvent,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Writes an executable script that handles `--version` and then runs `body`.
fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo \"{name} 1.0.0\"; exit 0; fi\n{body}\n"
    );
    std::fs::write(&path, script).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn config_for(name: &str, command: &Path) -> ProviderConfig {
    ProviderConfig::new(name, command.display().to_string(), format!("{name}-model"))
        .with_retries(3)
        .with_retry_delay(Duration::from_millis(50))
}

async fn ready(config: ProviderConfig) -> ExternalProcessProvider {
    let mut provider = ExternalProcessProvider::new(config);
    provider.initialize().await.expect("initialize");
    provider
}

#[tokio::test]
async fn test_cat_echoes_serialized_conversation() {
    let provider = ready(ProviderConfig::new("echo", "cat", "echo-model").with_retries(3)).await;

    let response = provider
        .complete(&Request::user("hello world"))
        .await
        .expect("complete");

    assert!(response.content.contains("user: hello world"));
    assert_eq!(response.provider, "echo");
    assert_eq!(response.model, "echo-model");
    assert_eq!(response.usage.total_tokens, 0);
    assert!(response.id.starts_with("extproc-"));
}

#[tokio::test]
async fn test_multi_message_prompt_layout() {
    let provider = ready(ProviderConfig::new("echo", "cat", "echo-model").with_retries(3)).await;
    let request = Request::new(vec![])
        .with_message(Role::System, "be terse")
        .with_message(Role::User, "ping")
        .with_message(Role::Assistant, "pong")
        .with_message(Role::User, "again");

    let response = provider.complete(&request).await.expect("complete");
    assert_eq!(
        response.content,
        "system: be terse\nuser: ping\nassistant: pong\nuser: again"
    );
}

#[tokio::test]
async fn test_model_override_is_reported() {
    let provider = ready(ProviderConfig::new("echo", "cat", "echo-model").with_retries(3)).await;
    let response = provider
        .complete(&Request::user("hi").with_model("other-model"))
        .await
        .expect("complete");
    assert_eq!(response.model, "other-model");
}

#[tokio::test]
async fn test_stderr_on_failure_becomes_external_tool_error() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "boom", "echo boom >&2\nexit 1");
    let provider = ready(config_for("boom", &tool)).await;

    let err = provider
        .complete(&Request::user("anything"))
        .await
        .expect_err("should fail");

    assert_eq!(err.to_string(), "boom");
    match err {
        AdapterError::ExternalTool { exit_code, message } => {
            assert_eq!(exit_code, 1);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_stderr_is_trimmed() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "noisy", "printf '\\n  rate limited  \\n\\n' >&2\nexit 7");
    let provider = ready(config_for("noisy", &tool)).await;

    let err = provider.complete(&Request::user("x")).await.expect_err("should fail");
    assert_eq!(err.to_string(), "rate limited");
}

#[tokio::test]
async fn test_whitespace_only_stderr_still_fails() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "blank", "cat >/dev/null\necho out\nprintf '\\n' >&2\nexit 1");
    let provider = ready(config_for("blank", &tool)).await;

    let err = provider.complete(&Request::user("x")).await.expect_err("should fail");
    match err {
        AdapterError::ExternalTool { exit_code, message } => {
            assert_eq!(exit_code, 1);
            assert_eq!(message, "");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_zero_exit_without_stderr_returns_stdout() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "quiet", "cat >/dev/null\necho '  partial answer  '\nexit 2");
    let provider = ready(config_for("quiet", &tool)).await;

    let response = provider
        .complete(&Request::user("question"))
        .await
        .expect("permissive success");
    assert_eq!(response.content, "partial answer");
}

#[tokio::test]
async fn test_empty_output_is_a_valid_response() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "silent", "cat >/dev/null\nexit 0");
    let provider = ready(config_for("silent", &tool)).await;

    let response = provider.complete(&Request::user("hello")).await.expect("complete");
    assert_eq!(response.content, "");
}

#[tokio::test]
async fn test_empty_request_runs_once_with_empty_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let counter = dir.path().join("runs.log");
    let tool = write_tool(
        dir.path(),
        "counter",
        "echo run >> \"$RUN_LOG\"\nprintf 'bytes=%s' \"$(wc -c | tr -d ' ')\"",
    );
    let mut config = config_for("counter", &tool);
    config
        .env
        .insert("RUN_LOG".to_string(), counter.display().to_string());
    let provider = ready(config).await;

    let response = provider.complete(&Request::default()).await.expect("complete");

    assert_eq!(response.content, "bytes=0");
    let runs = std::fs::read_to_string(&counter).expect("read run log");
    assert_eq!(runs.lines().count(), 1);
}

#[tokio::test]
async fn test_stream_yields_content_then_done() {
    let provider = ready(ProviderConfig::new("echo", "cat", "echo-model").with_retries(3)).await;
    let request = Request::user("stream me");

    let expected = provider.complete(&request).await.expect("complete").content;
    let events: Vec<StreamEvent> = provider
        .stream_complete(&request)
        .await
        .expect("stream")
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        StreamEvent::Content { delta, usage } => {
            assert_eq!(delta, &expected);
            assert_eq!(usage.total_tokens, 0);
        }
        StreamEvent::Done => panic!("content must come first"),
    }
    assert_eq!(events[1], StreamEvent::Done);
}

#[tokio::test]
async fn test_stream_propagates_tool_error() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "boom", "echo boom >&2\nexit 1");
    let provider = ready(config_for("boom", &tool)).await;

    let result = provider.stream_complete(&Request::user("x")).await;
    assert!(matches!(result, Err(AdapterError::ExternalTool { .. })));
}

#[tokio::test]
async fn test_initialize_fails_only_when_probe_cannot_spawn() {
    let mut missing = ExternalProcessProvider::new(ProviderConfig::new(
        "ghost",
        "/nonexistent/llm-relay-tool",
        "ghost-model",
    ));
    let err = missing.initialize().await.expect_err("spawn must fail");
    assert!(matches!(err, AdapterError::HealthCheck { .. }));
    assert!(!missing.is_initialized());

    // `false` exits 1 even for --version; initialization still succeeds.
    let mut failing = ExternalProcessProvider::new(ProviderConfig::new("false", "false", "m"));
    failing.initialize().await.expect("non-zero probe is accepted");
    assert!(failing.is_initialized());
}

#[tokio::test]
async fn test_version_is_recorded_and_reported() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "versioned", "cat");
    let provider = ready(config_for("versioned", &tool)).await;

    assert_eq!(provider.version(), Some("versioned 1.0.0"));
    let health = provider.health_check().await;
    assert!(health.healthy);
    assert_eq!(health.detail.as_deref(), Some("versioned 1.0.0"));
}

#[tokio::test]
async fn test_vanished_binary_surfaces_filesystem_error_after_retries() {
    let dir = TempDir::new().expect("tempdir");
    let tool = write_tool(dir.path(), "vanishing", "cat");
    let config = config_for("vanishing", &tool)
        .with_retries(2)
        .with_retry_delay(Duration::from_millis(10));
    let provider = ready(config).await;

    std::fs::remove_file(&tool).expect("remove tool");

    let err = provider.complete(&Request::user("x")).await.expect_err("spawn fails");
    match err {
        AdapterError::FilesystemTransient { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let provider = ready(ProviderConfig::new("echo", "cat", "echo-model").with_retries(3)).await;

    let requests: Vec<Request> = (0..8).map(|i| Request::user(format!("call {i}"))).collect();
    let responses =
        futures::future::join_all(requests.iter().map(|r| provider.complete(r))).await;

    let mut ids = std::collections::HashSet::new();
    for (i, response) in responses.into_iter().enumerate() {
        let response = response.expect("complete");
        assert_eq!(response.content, format!("user: call {i}"));
        ids.insert(response.id);
    }
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn test_provider_is_usable_as_trait_object() {
    let mut provider: Box<dyn Provider> =
        Box::new(ExternalProcessProvider::new(ProviderConfig::new("echo", "cat", "echo-model")));
    provider.initialize().await.expect("initialize");

    assert_eq!(provider.name(), "echo");
    assert_eq!(provider.list_models(), vec!["echo-model".to_string()]);
    assert_eq!(provider.model_info("echo-model").context_length, 4096);
    let response = provider.complete(&Request::user("dyn")).await.expect("complete");
    assert_eq!(response.content, "user: dyn");
}
