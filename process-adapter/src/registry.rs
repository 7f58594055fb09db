//! Named collection of providers for orchestration layers.

use crate::error::AdapterError;
use crate::provider::Provider;
use std::collections::BTreeMap;

/// Holds providers by name and remembers which one is the default.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Provider>>,
    default: Option<String>,
}

impl ProviderRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider under its own name, replacing any previous entry.
    ///
    /// The first provider inserted becomes the default.
    pub fn insert(&mut self, provider: Box<dyn Provider>) -> Option<Box<dyn Provider>> {
        let name = provider.name().to_string();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.providers.insert(name, provider)
    }

    /// Selects the default provider.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::UnknownProvider` if `name` is not registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), AdapterError> {
        if !self.providers.contains_key(name) {
            return Err(AdapterError::UnknownProvider(name.to_string()));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Looks up a provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(|p| &**p as &dyn Provider)
    }

    /// Looks up a provider by name, or the default when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::UnknownProvider` if nothing matches.
    pub fn select(&self, name: Option<&str>) -> Result<&dyn Provider, AdapterError> {
        let name = name
            .or(self.default.as_deref())
            .ok_or_else(|| AdapterError::UnknownProvider("<none configured>".to_string()))?;
        self.get(name)
            .ok_or_else(|| AdapterError::UnknownProvider(name.to_string()))
    }

    /// The default provider, if any is registered.
    #[must_use]
    pub fn default_provider(&self) -> Option<&dyn Provider> {
        self.default.as_deref().and_then(|name| self.get(name))
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Iterates over every provider.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.values().map(|p| &**p as &dyn Provider)
    }

    /// Initializes every provider.
    ///
    /// A failing provider does not stop the others; failures are returned by
    /// name and the failing providers stay uninitialized.
    pub async fn initialize_all(&mut self) -> Vec<(String, AdapterError)> {
        let mut failures = Vec::new();
        for (name, provider) in &mut self.providers {
            if let Err(e) = provider.initialize().await {
                tracing::warn!(provider = %name, error = %e, "provider failed to initialize");
                failures.push((name.clone(), e));
            }
        }
        failures
    }
}
