//! Static capability metadata attached to each provider.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Context window assumed when a model has no configured ceiling.
pub const DEFAULT_CONTEXT_LENGTH: u32 = 4096;

/// Optional feature a provider may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Incremental token delivery.
    Streaming,
    /// Structured function calls.
    FunctionCalling,
    /// Image inputs.
    Vision,
    /// Tool use.
    Tools,
    /// Constrained JSON output.
    JsonMode,
}

/// Per-model token ceilings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimits {
    /// Context window in tokens.
    pub context_length: Option<u32>,
    /// Output ceiling in tokens.
    pub max_output_tokens: Option<u32>,
}

/// Capability record built once per provider and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    models: Vec<String>,
    limits: BTreeMap<String, ModelLimits>,
    features: BTreeSet<Feature>,
}

impl Capabilities {
    /// Text-only capabilities for a single model.
    #[must_use]
    pub fn for_model(model: impl Into<String>, limits: ModelLimits) -> Self {
        let model = model.into();
        Self {
            models: vec![model.clone()],
            limits: BTreeMap::from([(model, limits)]),
            features: BTreeSet::new(),
        }
    }

    /// Supported model identifiers.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Configured ceilings for `model`, if it is known.
    #[must_use]
    pub fn limits(&self, model: &str) -> Option<ModelLimits> {
        self.limits.get(model).copied()
    }

    /// Returns `true` if the given feature is supported.
    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}
