// src/config/mod.rs
pub mod sentinel;

pub use sentinel::{
    ExtractionConfig, HistoryConfig, KeywordGroupConfig, KeywordsConfig, MetricsConfig,
    NotifyConfig, SentinelConfig, SourceConfig, StrategyConfig,
};

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/sentinel.toml";
pub const DEFAULT_JSON_PATH: &str = "config/sentinel.json";

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<SentinelConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg.sanitize())
}

/// Load config using env var + fallbacks:
/// 1) $SENTINEL_CONFIG_PATH
/// 2) config/sentinel.toml
/// 3) config/sentinel.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<SentinelConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    tracing::info!("no config file found, using built-in defaults");
    Ok(SentinelConfig::default().sanitize())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<SentinelConfig> {
    match hint_ext {
        "json" => serde_json::from_str(s).context("invalid JSON config"),
        "toml" => toml::from_str(s).context("invalid TOML config"),
        // Unknown extension: JSON if it looks like an object, TOML otherwise.
        _ if s.trim_start().starts_with('{') => {
            serde_json::from_str(s).context("invalid JSON config")
        }
        _ => toml::from_str(s).context("invalid TOML config"),
    }
}
