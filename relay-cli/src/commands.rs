//! Subcommand implementations.
//!
//! Every command writes its user-facing output to the supplied writer; logs go
//! through `tracing` to stderr.

use crate::cli::{Cli, Commands, CompleteArgs, ExecArgs};
use crate::config::{Overrides, RelayConfig};
use crate::errors::Error;
use futures::StreamExt;
use llm_relay_process::{
    discover_command, probe_version, run_command, ExecOptions, ExternalProcessProvider, Provider,
    Request, Role, StreamEvent,
};
use std::io::Write;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Runs the parsed command line against stdout.
pub async fn run(cli: Cli) -> Result<(), Error> {
    let config = RelayConfig::load(cli.config.as_deref())?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Complete(args) => {
            let prompt = match args.prompt.clone() {
                Some(prompt) => prompt,
                None => read_stdin().await?,
            };
            complete(&config, &args, &prompt, &mut out).await
        }
        Commands::Models { provider } => models(&config, provider.as_deref(), &mut out),
        Commands::Health => health(&config, &mut out).await,
        Commands::Doctor => doctor(&config, &mut out).await,
        Commands::Exec(args) => exec(&args, &mut out).await,
    }
}

async fn read_stdin() -> Result<String, Error> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf.trim_end().to_string())
}

/// Builds the request for `complete`: optional system message, then the prompt.
#[must_use]
pub fn build_request(system: Option<&str>, prompt: &str, model: Option<&str>) -> Request {
    let mut request = Request::default();
    if let Some(system) = system {
        request = request.with_message(Role::System, system);
    }
    request = request.with_message(Role::User, prompt);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    request
}

/// Sends one prompt through the selected provider.
pub async fn complete(
    config: &RelayConfig,
    args: &CompleteArgs,
    prompt: &str,
    out: &mut impl Write,
) -> Result<(), Error> {
    let overrides = Overrides {
        provider: args.provider.clone(),
        model: args.model.clone(),
        retries: args.retries,
    };
    let provider_config = config.resolve(&overrides)?;
    let mut provider = ExternalProcessProvider::new(provider_config);
    provider.initialize().await?;

    let request = build_request(args.system.as_deref(), prompt, None);

    if args.stream {
        let mut events = provider.stream_complete(&request).await?;
        while let Some(event) = events.next().await {
            if args.json {
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
                continue;
            }
            match event {
                StreamEvent::Content { delta, .. } => write!(out, "{delta}")?,
                StreamEvent::Done => writeln!(out)?,
            }
        }
    } else {
        let response = provider.complete(&request).await?;
        if args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?;
        } else {
            writeln!(out, "{}", response.content)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Prints `provider<TAB>model<TAB>context<TAB>max_output` rows.
pub fn models(config: &RelayConfig, only: Option<&str>, out: &mut impl Write) -> Result<(), Error> {
    let registry = config.build_registry()?;
    let selected: Vec<&dyn Provider> = match only {
        Some(name) => vec![registry.select(Some(name))?],
        None => registry.iter().collect(),
    };

    for provider in selected {
        for model in provider.list_models() {
            let info = provider.model_info(&model);
            let max_output = info
                .max_output_tokens
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                provider.name(),
                info.id,
                info.context_length,
                max_output
            )?;
        }
    }
    Ok(())
}

/// Initializes every provider and prints one status line each.
pub async fn health(config: &RelayConfig, out: &mut impl Write) -> Result<(), Error> {
    let mut registry = config.build_registry()?;
    let failures = registry.initialize_all().await;

    for provider in registry.iter() {
        if let Some((_, err)) = failures.iter().find(|(name, _)| name == provider.name()) {
            writeln!(out, "{}: unavailable ({err})", provider.name())?;
            continue;
        }
        let status = provider.health_check().await;
        let state = if status.healthy { "healthy" } else { "unhealthy" };
        match status.detail {
            Some(detail) => writeln!(out, "{}: {state} ({detail})", provider.name())?,
            None => writeln!(out, "{}: {state}", provider.name())?,
        }
    }
    Ok(())
}

/// Resolves every configured command and probes its version.
pub async fn doctor(config: &RelayConfig, out: &mut impl Write) -> Result<(), Error> {
    for provider in &config.providers {
        match discover_command(&provider.command) {
            Ok(path) => {
                let version = probe_version(&provider.command)
                    .await
                    .unwrap_or_else(|| "version unknown".to_string());
                writeln!(out, "{}: {} ({version})", provider.name, path.display())?;
            }
            Err(e) => writeln!(out, "{}: {e}", provider.name)?,
        }
    }
    Ok(())
}

/// Runs a raw command through the executor and prints the result as JSON.
pub async fn exec(args: &ExecArgs, out: &mut impl Write) -> Result<(), Error> {
    let mut options = ExecOptions::default()
        .with_retries(args.retries)
        .with_retry_delay(Duration::from_millis(args.retry_delay_ms));
    if let Some(ref payload) = args.stdin {
        options = options.with_stdin(payload.clone());
    }

    let result = run_command(&args.command, &args.args, &options).await;
    writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    Ok(())
}
