//! Backend configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use marksman_core::engine::EngineConfig;
use marksman_core::limiter::Tier;
use marksman_core::scoring::GradeBands;
use marksman_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single language-model backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
        }
    }
}

/// Top-level marksman configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarksmanConfig {
    /// Backend configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default backend to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature. Kept low so marking is stable.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Per-examiner call timeout in seconds.
    #[serde(default = "default_examiner_timeout")]
    pub examiner_timeout_secs: u64,
    /// Token budget per examiner call.
    #[serde(default = "default_examiner_max_tokens")]
    pub examiner_max_tokens: u32,
    /// Summary call timeout in seconds.
    #[serde(default = "default_summary_timeout")]
    pub summary_timeout_secs: u64,
    /// Token budget for the summary call.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
    /// Tier applied to requests with no explicit tier.
    #[serde(default = "default_tier")]
    pub default_tier: Tier,
    /// Grade thresholds; the standard table unless overridden.
    #[serde(default)]
    pub grade_bands: GradeBands,
    /// Output directory for grading reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "anthropic".to_string()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_examiner_timeout() -> u64 {
    45
}
fn default_examiner_max_tokens() -> u32 {
    1024
}
fn default_summary_timeout() -> u64 {
    30
}
fn default_summary_max_tokens() -> u32 {
    768
}
fn default_tier() -> Tier {
    Tier::Free
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./marksman-results")
}

impl Default for MarksmanConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            examiner_timeout_secs: default_examiner_timeout(),
            examiner_max_tokens: default_examiner_max_tokens(),
            summary_timeout_secs: default_summary_timeout(),
            summary_max_tokens: default_summary_max_tokens(),
            default_tier: default_tier(),
            grade_bands: GradeBands::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl MarksmanConfig {
    /// Build the engine configuration this deployment runs with.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            examiner_max_tokens: self.examiner_max_tokens,
            examiner_timeout: Duration::from_secs(self.examiner_timeout_secs),
            summary_max_tokens: self.summary_max_tokens,
            summary_timeout: Duration::from_secs(self.summary_timeout_secs),
            grade_bands: self.grade_bands.clone(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a backend config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `marksman.toml` in the current directory
/// 2. `~/.config/marksman/config.toml`
///
/// Environment variable overrides: `MARKSMAN_ANTHROPIC_KEY`, `MARKSMAN_OPENAI_KEY`.
pub fn load_config() -> Result<MarksmanConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MarksmanConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("marksman.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<MarksmanConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MarksmanConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("MARKSMAN_ANTHROPIC_KEY") {
        config
            .providers
            .entry("anthropic".into())
            .or_insert(ProviderConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
            });
        if let Some(ProviderConfig::Anthropic { api_key, .. }) =
            config.providers.get_mut("anthropic")
        {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("MARKSMAN_OPENAI_KEY") {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
            *api_key = key;
        }
    }

    // Resolve env vars in all backend configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("marksman"))
}

/// Create a backend instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    let _ = name;
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            Ok(Box::new(AnthropicProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Box::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        ))),
    }
}
