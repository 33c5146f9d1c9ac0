//! Configuration loading and API credential resolution
//!
//! Settings come from a TOML file with environment-variable overrides.
//! Credential resolution priority: CLI argument → environment → TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Creator data-provider endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the creator data provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// API key (may also come from BRANDLENS_PROVIDER_API_KEY)
    pub api_key: Option<String>,
    /// Per-request timeout for profile/content sub-fetches
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

/// Classification endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the text-classification API
    #[serde(default = "default_classifier_base_url")]
    pub base_url: String,
    /// API key (may also come from BRANDLENS_CLASSIFIER_API_KEY)
    pub api_key: Option<String>,
    /// Model identifier passed to the classification API
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// Per-request timeout for classification calls
    #[serde(default = "default_classify_timeout_secs")]
    pub timeout_secs: u64,
}

/// Pipeline tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory where result artifacts are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Concurrent enrichment workers per task
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Records per progress-report batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Hard cap on input records, applied from the head
    pub max_records: Option<usize>,
    /// Wall-clock budget for one task, in seconds
    #[serde(default = "default_task_budget_secs")]
    pub task_budget_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_provider_base_url() -> String {
    "https://creator-data.example.com".to_string()
}

fn default_classifier_base_url() -> String {
    "https://classifier.example.com".to_string()
}

fn default_classifier_model() -> String {
    "brand-classify-v1".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_classify_timeout_secs() -> u64 {
    20
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("analyzed_data")
}

fn default_max_workers() -> usize {
    5
}

fn default_batch_size() -> usize {
    35
}

fn default_task_budget_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: None,
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_base_url(),
            api_key: None,
            model: default_classifier_model(),
            timeout_secs: default_classify_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
            max_records: None,
            task_budget_secs: default_task_budget_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load configuration from an explicit TOML file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load configuration from the default location, falling back to defaults
///
/// Resolution order:
/// 1. `BRANDLENS_CONFIG` environment variable (path must exist)
/// 2. `~/.config/brandlens/brandlens.toml` if present
/// 3. Compiled defaults
pub fn load_config() -> Result<TomlConfig> {
    if let Ok(path) = std::env::var("BRANDLENS_CONFIG") {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::Config(format!(
                "BRANDLENS_CONFIG points to missing file: {}",
                path.display()
            )));
        }
        info!(path = %path.display(), "Loading configuration from BRANDLENS_CONFIG");
        return load_toml_config(&path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("brandlens").join("brandlens.toml");
        if path.exists() {
            info!(path = %path.display(), "Loading configuration file");
            return load_toml_config(&path);
        }
    }

    Ok(TomlConfig::default())
}

/// Resolve the data-provider API key
///
/// Priority: CLI argument → `BRANDLENS_PROVIDER_API_KEY` → TOML.
pub fn resolve_provider_api_key(cli_arg: Option<&str>, config: &TomlConfig) -> Result<String> {
    resolve_api_key(
        cli_arg,
        "BRANDLENS_PROVIDER_API_KEY",
        config.provider.api_key.as_deref(),
        "data provider",
    )
}

/// Resolve the classifier API key
///
/// Priority: CLI argument → `BRANDLENS_CLASSIFIER_API_KEY` → TOML.
pub fn resolve_classifier_api_key(cli_arg: Option<&str>, config: &TomlConfig) -> Result<String> {
    resolve_api_key(
        cli_arg,
        "BRANDLENS_CLASSIFIER_API_KEY",
        config.classifier.api_key.as_deref(),
        "classifier",
    )
}

fn resolve_api_key(
    cli_arg: Option<&str>,
    env_var: &str,
    toml_key: Option<&str>,
    purpose: &str,
) -> Result<String> {
    let env_key = std::env::var(env_var).ok();

    let mut sources = Vec::new();
    if cli_arg.map(is_valid_key).unwrap_or(false) {
        sources.push("CLI");
    }
    if env_key.as_deref().map(is_valid_key).unwrap_or(false) {
        sources.push("environment");
    }
    if toml_key.map(is_valid_key).unwrap_or(false) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "{} API key found in multiple sources: {}. Using {} (highest priority).",
            purpose,
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = cli_arg {
        if is_valid_key(key) {
            return Ok(key.to_string());
        }
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("{} API key loaded from {}", purpose, env_var);
            return Ok(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("{} API key loaded from TOML config", purpose);
            return Ok(key.to_string());
        }
    }

    Err(Error::Config(format!(
        "{} API key not configured. Provide it via:\n\
         1. CLI flag\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: ~/.config/brandlens/brandlens.toml",
        purpose, env_var
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = TomlConfig::default();
        assert_eq!(config.pipeline.max_workers, 5);
        assert_eq!(config.pipeline.batch_size, 35);
        assert_eq!(config.pipeline.task_budget_secs, 300);
        assert!(config.pipeline.max_records.is_none());
        assert_eq!(config.provider.timeout_secs, 15);
        assert_eq!(config.classifier.timeout_secs, 20);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: TomlConfig = toml::from_str(
            r#"
            [pipeline]
            max_workers = 3

            [provider]
            api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.pipeline.max_workers, 3);
        assert_eq!(parsed.pipeline.batch_size, 35);
        assert_eq!(parsed.provider.api_key.as_deref(), Some("k"));
        assert_eq!(parsed.provider.timeout_secs, 15);
    }

    #[test]
    fn cli_key_wins_over_toml() {
        let mut config = TomlConfig::default();
        config.provider.api_key = Some("from-toml".to_string());
        let key = resolve_provider_api_key(Some("from-cli"), &config).unwrap();
        assert_eq!(key, "from-cli");
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = TomlConfig::default();
        let err = resolve_classifier_api_key(None, &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn blank_keys_are_rejected() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
        assert!(is_valid_key("abc"));
    }
}
