// Detector configuration: a flat record resolved in order
// constructor argument -> environment variable -> config file -> default
// (spec §6, §9). dotenvy loads a local .env in main.rs for dev convenience
// only; it does not itself participate in the resolution chain below — env
// vars it sets are simply read back by `apply_env` like any other env var.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub embedding_threshold: f64,
    pub embedding_timeout: Duration,
    pub layer3_timeout: Duration,
    pub layer3_confidence_threshold: f64,
    pub max_input_length: usize,
    pub cache_ttl: Duration,
    pub cache_prefix: String,
    pub embedding_model: String,
    pub judge_model: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub cache_db_path: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            embedding_threshold: 0.55,
            embedding_timeout: Duration::from_secs(10),
            layer3_timeout: Duration::from_secs_f64(3.0),
            layer3_confidence_threshold: 0.70,
            max_input_length: 10_000,
            cache_ttl: Duration::from_secs(3600),
            cache_prefix: "detect".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            judge_model: "claude-3-haiku-20240307".to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            cache_db_path: None,
        }
    }
}

/// Sparse overlay applied on top of the running config. The same shape is
/// used for the config file (deserialized via `toml`), for environment
/// variables (built field by field), and for the constructor argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectorConfigOverrides {
    pub embedding_threshold: Option<f64>,
    pub embedding_timeout_secs: Option<f64>,
    pub layer3_timeout_secs: Option<f64>,
    pub layer3_confidence_threshold: Option<f64>,
    pub max_input_length: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_prefix: Option<String>,
    pub embedding_model: Option<String>,
    pub judge_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub cache_db_path: Option<String>,
}

impl DetectorConfig {
    /// Resolve a config, applying (in increasing precedence) the built-in
    /// default, the config file (if present), environment variables, and
    /// finally `overrides` (the constructor argument).
    pub fn load(overrides: DetectorConfigOverrides) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(file) = load_config_file()? {
            cfg.apply(file);
        }
        cfg.apply(env_overrides());
        cfg.apply(overrides);
        Ok(cfg)
    }

    fn apply(&mut self, o: DetectorConfigOverrides) {
        if let Some(v) = o.embedding_threshold {
            self.embedding_threshold = v;
        }
        if let Some(v) = o.embedding_timeout_secs {
            self.embedding_timeout = Duration::from_secs_f64(v);
        }
        if let Some(v) = o.layer3_timeout_secs {
            self.layer3_timeout = Duration::from_secs_f64(v);
        }
        if let Some(v) = o.layer3_confidence_threshold {
            self.layer3_confidence_threshold = v;
        }
        if let Some(v) = o.max_input_length {
            self.max_input_length = v;
        }
        if let Some(v) = o.cache_ttl_secs {
            self.cache_ttl = Duration::from_secs(v);
        }
        if let Some(v) = o.cache_prefix {
            self.cache_prefix = v;
        }
        if let Some(v) = o.embedding_model {
            self.embedding_model = v;
        }
        if let Some(v) = o.judge_model {
            self.judge_model = v;
        }
        if let Some(v) = o.openai_api_key {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = o.anthropic_api_key {
            self.anthropic_api_key = Some(v);
        }
        if let Some(v) = o.cache_db_path {
            self.cache_db_path = Some(v);
        }
    }
}

/// Load `./warden.toml`, or the path named by `WARDEN_CONFIG_PATH`, if it exists.
fn load_config_file() -> Result<Option<DetectorConfigOverrides>> {
    let path = env::var("WARDEN_CONFIG_PATH").unwrap_or_else(|_| "warden.toml".to_string());
    if !Path::new(&path).exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {path}"))?;
    let overrides: DetectorConfigOverrides =
        toml::from_str(&text).with_context(|| format!("failed to parse config file {path}"))?;
    Ok(Some(overrides))
}

fn env_overrides() -> DetectorConfigOverrides {
    DetectorConfigOverrides {
        embedding_threshold: env_parsed("WARDEN_EMBEDDING_THRESHOLD"),
        embedding_timeout_secs: env_parsed("WARDEN_EMBEDDING_TIMEOUT_SECS"),
        layer3_timeout_secs: env_parsed("WARDEN_LAYER3_TIMEOUT_SECS"),
        layer3_confidence_threshold: env_parsed("WARDEN_LAYER3_CONFIDENCE_THRESHOLD"),
        max_input_length: env_parsed("WARDEN_MAX_INPUT_LENGTH"),
        cache_ttl_secs: env_parsed("WARDEN_CACHE_TTL_SECS"),
        cache_prefix: env::var("WARDEN_CACHE_PREFIX").ok(),
        embedding_model: env::var("WARDEN_EMBEDDING_MODEL").ok(),
        judge_model: env::var("WARDEN_JUDGE_MODEL").ok(),
        openai_api_key: env::var("OPENAI_API_KEY").ok(),
        anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
        cache_db_path: env::var("WARDEN_CACHE_DB_PATH").ok(),
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.embedding_threshold, 0.55);
        assert_eq!(cfg.layer3_timeout, Duration::from_secs_f64(3.0));
        assert_eq!(cfg.layer3_confidence_threshold, 0.70);
        assert_eq!(cfg.max_input_length, 10_000);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.cache_prefix, "detect");
        assert_eq!(cfg.embedding_model, "text-embedding-3-small");
        assert_eq!(cfg.judge_model, "claude-3-haiku-20240307");
    }

    #[test]
    fn constructor_argument_wins_over_default() {
        let cfg = DetectorConfig::load(DetectorConfigOverrides {
            embedding_threshold: Some(0.8),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.embedding_threshold, 0.8);
    }
}
