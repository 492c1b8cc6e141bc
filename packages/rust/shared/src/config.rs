//! Application configuration for docmodernizer.
//!
//! User config lives at `~/.docmodernizer/docmodernizer.toml`.
//! Environment variables override config file values, and CLI flags override
//! both. API keys are never stored in the file, only the name of the env var
//! that holds them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModernizerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docmodernizer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docmodernizer";

// ---------------------------------------------------------------------------
// Config structs (matching docmodernizer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenAI-compatible provider used by the analyzer and generator.
    #[serde(default = "ProviderConfig::analysis")]
    pub analysis: ProviderConfig,

    /// Anthropic provider used by the researcher and quality checker.
    #[serde(default = "ProviderConfig::review")]
    pub review: ProviderConfig,

    /// Orchestrator behaviour.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Log level used when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Completion token budget sent with every LLM request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for the documentation page fetch.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_tokens: default_max_tokens(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_fetch_timeout() -> u64 {
    30
}

/// `[analysis]` / `[review]` provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    /// Model identifier sent to the provider.
    pub model: String,
    /// Provider base URL.
    pub base_url: String,
}

impl ProviderConfig {
    /// Defaults for the Gemini OpenAI-compatible endpoint.
    pub fn analysis() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".into(),
            model: "gemini-2.0-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".into(),
        }
    }

    /// Defaults for the Anthropic messages endpoint.
    pub fn review() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".into(),
            model: "claude-sonnet-4-20250514".into(),
            base_url: "https://api.anthropic.com".into(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            analysis: ProviderConfig::analysis(),
            review: ProviderConfig::review(),
            pipeline: PipelineSettings::default(),
        }
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// What the orchestrator does after the fetch stage fails.
    #[serde(default)]
    pub on_fetch_error: FetchErrorPolicy,
}

/// Orchestrator policy after a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// Run every downstream stage anyway, on empty content.
    #[default]
    Continue,
    /// Skip the remaining stages; the state keeps its defaults.
    Halt,
}

impl AppConfig {
    /// Apply environment overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(self)
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognized: `LOG_LEVEL`, `MAX_TOKENS`, `GEMINI_MODEL`, `ANTHROPIC_MODEL`
    /// (falling back to `MODEL_NAME`). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(level) = get("LOG_LEVEL") {
            self.defaults.log_level = level.to_ascii_lowercase();
        }
        if let Some(raw) = get("MAX_TOKENS") {
            self.defaults.max_tokens = raw.trim().parse().map_err(|e| {
                ModernizerError::config(format!("MAX_TOKENS must be a positive integer: {e}"))
            })?;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.analysis.model = model;
        }
        if let Some(model) = get("ANTHROPIC_MODEL").or_else(|| get("MODEL_NAME")) {
            self.review.model = model;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docmodernizer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ModernizerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docmodernizer/docmodernizer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModernizerError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ModernizerError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ModernizerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ModernizerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ModernizerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key for a provider from its configured env var.
pub fn resolve_api_key(provider: &ProviderConfig) -> Result<String> {
    let var_name = &provider.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ModernizerError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that both provider API keys are present before the pipeline starts.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    resolve_api_key(&config.analysis)?;
    resolve_api_key(&config.review)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("ANTHROPIC_API_KEY"));
        assert!(toml_str.contains("on_fetch_error = \"continue\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_tokens, 4096);
        assert_eq!(parsed.defaults.fetch_timeout_secs, 30);
        assert_eq!(parsed.review.model, "claude-sonnet-4-20250514");
        assert_eq!(parsed.pipeline.on_fetch_error, FetchErrorPolicy::Continue);
    }

    #[test]
    fn partial_file_keeps_provider_defaults() {
        let toml_str = r#"
[defaults]
log_level = "debug"

[pipeline]
on_fetch_error = "halt"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.log_level, "debug");
        assert_eq!(config.defaults.max_tokens, 4096);
        assert_eq!(config.analysis.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.pipeline.on_fetch_error, FetchErrorPolicy::Halt);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("LOG_LEVEL", "DEBUG"),
                ("MAX_TOKENS", "2048"),
                ("GEMINI_MODEL", "gemini-2.5-pro"),
                ("MODEL_NAME", "claude-opus-4-20250514"),
            ]))
            .unwrap();

        assert_eq!(config.defaults.log_level, "debug");
        assert_eq!(config.defaults.max_tokens, 2048);
        assert_eq!(config.analysis.model, "gemini-2.5-pro");
        assert_eq!(config.review.model, "claude-opus-4-20250514");
    }

    #[test]
    fn anthropic_model_wins_over_model_name() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("ANTHROPIC_MODEL", "claude-a"),
                ("MODEL_NAME", "claude-b"),
            ]))
            .unwrap();
        assert_eq!(config.review.model, "claude-a");
    }

    #[test]
    fn invalid_max_tokens_is_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup(&[("MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.analysis.api_key_env = "DM_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("DM_TEST_NONEXISTENT_KEY_12345"));
    }
}
