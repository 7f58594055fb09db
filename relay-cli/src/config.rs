//! Relay configuration: which external tools exist and which one is the default.

use crate::errors::Error;
use anyhow::Context;
use llm_relay_process::{ExternalProcessProvider, ProviderConfig, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "LLM_RELAY_CONFIG";

const DEFAULT_PROVIDER: &str = "echo";

fn default_provider_name() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::new(DEFAULT_PROVIDER, "cat", "echo")]
}

/// Top-level configuration, read from JSON.
///
/// Missing fields fall back to a single `echo` provider backed by `cat`, which
/// is handy for checking the plumbing without any model installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Provider used when none is named on the command line.
    #[serde(default = "default_provider_name")]
    pub default_provider: String,
    /// Every configured provider.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider_name(),
            providers: default_providers(),
        }
    }
}

/// Per-invocation overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Provider to use instead of the default.
    pub provider: Option<String>,
    /// Model label to report instead of the configured one.
    pub model: Option<String>,
    /// Retry budget to use instead of the configured one.
    pub retries: Option<u32>,
}

impl RelayConfig {
    /// `<config_dir>/llm-relay/config.json`, when a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("llm-relay").join("config.json"))
    }

    /// Loads the configuration.
    ///
    /// Resolution order:
    /// 1. `explicit` (must exist).
    /// 2. The path in `LLM_RELAY_CONFIG` (must exist).
    /// 3. [`RelayConfig::default_path`], if the file exists.
    /// 4. Built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Error> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match resolve_path(explicit, from_env, Self::default_path()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                read_config(&path).map_err(|e| Error::Config(format!("{e:#}")))
            }
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks names are unique, commands non-empty and the default exists.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.command.trim().is_empty() {
                return Err(Error::Config(format!(
                    "provider '{}' has an empty command",
                    provider.name
                )));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(Error::Config(format!(
                    "provider '{}' is defined more than once",
                    provider.name
                )));
            }
        }
        if !seen.contains(self.default_provider.as_str()) {
            return Err(Error::Config(format!(
                "default provider '{}' is not defined",
                self.default_provider
            )));
        }
        Ok(())
    }

    /// Looks up a provider config by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Returns the provider config selected by `overrides`, with its model and
    /// retry settings replaced where requested.
    pub fn resolve(&self, overrides: &Overrides) -> Result<ProviderConfig, Error> {
        let name = overrides
            .provider
            .as_deref()
            .unwrap_or(&self.default_provider);
        let mut config = self
            .provider(name)
            .cloned()
            .ok_or_else(|| llm_relay_process::AdapterError::UnknownProvider(name.to_string()))?;

        if let Some(ref model) = overrides.model {
            config.model.clone_from(model);
        }
        if let Some(retries) = overrides.retries {
            config.retries = retries;
        }
        Ok(config)
    }

    /// Builds an uninitialized registry holding every configured provider.
    pub fn build_registry(&self) -> Result<ProviderRegistry, Error> {
        let mut registry = ProviderRegistry::new();
        for provider in &self.providers {
            registry.insert(Box::new(ExternalProcessProvider::new(provider.clone())));
        }
        registry.set_default(&self.default_provider)?;
        Ok(registry)
    }
}

fn resolve_path(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    default_path: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env {
        return Some(path);
    }
    default_path.filter(|path| path.exists())
}

fn read_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    RelayConfig::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
}
