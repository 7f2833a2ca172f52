//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::Path, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Default model (or Azure deployment) to use.
fn default_model() -> String {
    "gpt-4o".to_string()
}

/// Default sampling temperature; low, so answers stay near-deterministic.
fn default_temperature() -> f32 {
    0.1
}

fn default_send_temperature() -> bool {
    true
}

/// Default system directive for the classifier.
fn default_system_directive() -> String {
    prompts::CLASSIFIER_SYSTEM_DIRECTIVE.to_string()
}

/// Default maximum category tree depth.
fn default_max_category_depth() -> usize {
    32
}

/// Which flavor of the OpenAI API to talk to.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Azure OpenAI; the model identifier is the deployment name.
    #[default]
    Azure,
    /// The OpenAI API (or any compatible endpoint).
    OpenAi,
}

/// Configuration for the ticket classifier.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// API flavor (`PROVIDER`): `azure` or `openai`.
    #[serde(default)]
    pub provider: Provider,
    /// API key (`API_KEY`).
    pub api_key: String,
    /// Endpoint URL (`API_ENDPOINT`); required for Azure, optional API base otherwise.
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// API version (`API_VERSION`); required for Azure.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Model or deployment name (`MODEL`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature (`TEMPERATURE`).
    /// Value between 0 and 2. Lower values make output more focused and deterministic.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Whether to send the temperature at all (`SEND_TEMPERATURE`).
    /// Disable for deployments of models that reject it.
    #[serde(default = "default_send_temperature")]
    pub send_temperature: bool,
    /// Max output tokens (`MAX_TOKENS`); the service default applies when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Optional custom system directive to override the default (`SYSTEM_DIRECTIVE`).
    /// Must contain the `{categories}` placeholder.
    #[serde(default = "default_system_directive")]
    pub system_directive: String,
    /// Deepest category tree accepted (`MAX_CATEGORY_DEPTH`).
    #[serde(default = "default_max_category_depth")]
    pub max_category_depth: usize,
    /// OTLP/HTTP endpoint for span export (`OTLP_ENDPOINT`).
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: String::new(),
            api_endpoint: None,
            api_version: None,
            model: default_model(),
            temperature: default_temperature(),
            send_temperature: default_send_temperature(),
            max_tokens: None,
            system_directive: default_system_directive(),
            max_category_depth: default_max_category_depth(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("TICKET_CLASSIFIER"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check the cross-field constraints that deserialization cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(anyhow::anyhow!("Temperature must be between 0 and 2."));
        }

        if let Some(max_tokens) = self.max_tokens {
            if !(1..=128000).contains(&max_tokens) {
                return Err(anyhow::anyhow!("Max tokens must be between 1 and 128000."));
            }
        }

        if self.max_category_depth == 0 {
            return Err(anyhow::anyhow!("Max category depth must be at least 1."));
        }

        if !self.system_directive.contains(prompts::CATEGORIES_PLACEHOLDER) {
            return Err(anyhow::anyhow!("System directive must contain the `{}` placeholder.", prompts::CATEGORIES_PLACEHOLDER));
        }

        if self.provider == Provider::Azure && (self.api_endpoint.is_none() || self.api_version.is_none()) {
            return Err(anyhow::anyhow!("Azure provider requires both `api_endpoint` and `api_version`."));
        }

        Ok(())
    }

    /// Override the model identifier, e.g. from the command line.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).model = model.into();
        self
    }
}
