//! End-to-end tests against a real model CLI.
//!
//! These tests need a locally installed tool that reads a prompt on stdin and
//! answers on stdout. They are marked `#[ignore]` so CI without such a tool
//! stays green.
//!
//! ## Running E2E Tests
//!
//! ```bash
//! LLM_RELAY_E2E_COMMAND=my-llm-wrapper LLM_RELAY_E2E_MODEL=llama3 \
//!     cargo test -p llm-relay-process --test e2e_real_cli -- --ignored
//! ```

use futures::StreamExt;
use llm_relay_process::{
    discover_command, ExternalProcessProvider, Provider, ProviderConfig, Request, StreamEvent,
};
use tempfile::TempDir;

const COMMAND_VAR: &str = "LLM_RELAY_E2E_COMMAND";
const MODEL_VAR: &str = "LLM_RELAY_E2E_MODEL";

fn e2e_config() -> ProviderConfig {
    let command = std::env::var(COMMAND_VAR)
        .unwrap_or_else(|_| panic!("{COMMAND_VAR} must name the CLI under test"));
    let model = std::env::var(MODEL_VAR).unwrap_or_else(|_| "default".to_string());
    ProviderConfig::new("e2e", command, model).with_retries(2)
}

#[tokio::test]
#[ignore = "requires a real model CLI named by LLM_RELAY_E2E_COMMAND"]
async fn e2e_discover_and_initialize() {
    let config = e2e_config();
    let path = discover_command(&config.command).expect("CLI must be discoverable");
    assert!(path.exists());

    let mut provider = ExternalProcessProvider::new(config);
    provider.initialize().await.expect("initialize");
    assert!(provider.health_check().await.healthy);
}

#[tokio::test]
#[ignore = "requires a real model CLI named by LLM_RELAY_E2E_COMMAND"]
async fn e2e_complete_returns_text() {
    let mut provider = ExternalProcessProvider::new(e2e_config());
    provider.initialize().await.expect("initialize");

    let response = provider
        .complete(&Request::user("Reply with the single word: pong"))
        .await
        .expect("complete");

    assert!(!response.content.is_empty());
    assert!(response.id.starts_with("extproc-"));
}

#[tokio::test]
#[ignore = "requires a real model CLI named by LLM_RELAY_E2E_COMMAND"]
async fn e2e_stream_ends_with_done() {
    let mut provider = ExternalProcessProvider::new(e2e_config());
    provider.initialize().await.expect("initialize");

    let events: Vec<StreamEvent> = provider
        .stream_complete(&Request::user("Say hello"))
        .await
        .expect("stream")
        .collect()
        .await;

    assert_eq!(events.last(), Some(&StreamEvent::Done));
}

#[tokio::test]
#[ignore = "requires a real model CLI named by LLM_RELAY_E2E_COMMAND"]
async fn e2e_working_directory_is_respected() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = e2e_config();
    config.cwd = Some(dir.path().to_path_buf());

    let mut provider = ExternalProcessProvider::new(config);
    provider.initialize().await.expect("initialize");
    provider
        .complete(&Request::user("Reply with ok"))
        .await
        .expect("complete in temp cwd");
}
