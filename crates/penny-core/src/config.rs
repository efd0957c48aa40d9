//! Advisor configuration
//!
//! Configuration is resolved in three layers:
//! 1. Built-in defaults
//! 2. Optional TOML override (~/.local/share/penny/config/advisor.toml or an explicit path)
//! 3. Environment variables (`PENNY_MODEL_TOKEN`, `PENNY_MODEL`, `PENNY_MODEL_HOST`)
//!
//! The model credential is only ever read from the environment.
//!
//! ```toml
//! [model]
//! id = "mistralai/Mistral-7B-Instruct-v0.2"
//! host = "https://api-inference.huggingface.co"
//!
//! [generation]
//! timeout_secs = 20
//! max_new_tokens = 600
//! temperature = 0.3
//! top_p = 0.9
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding the text-generation bearer token
pub const MODEL_TOKEN_ENV: &str = "PENNY_MODEL_TOKEN";
/// Environment variable selecting the model identifier
pub const MODEL_ID_ENV: &str = "PENNY_MODEL";
/// Environment variable overriding the provider base URL
pub const MODEL_HOST_ENV: &str = "PENNY_MODEL_HOST";

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
pub const DEFAULT_HOST: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Fixed sampling parameters sent with every generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 600,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

/// Resolved advisor configuration
#[derive(Clone, PartialEq)]
pub struct AdvisorConfig {
    /// Model identifier, used as the response label and to pick the endpoint
    pub model: String,
    /// Provider base URL
    pub host: String,
    /// Bearer token; its presence enables the generative tier
    pub credential: Option<String>,
    /// Upper bound for the single generation call
    pub timeout: Duration,
    pub params: GenerationParams,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            credential: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            params: GenerationParams::default(),
        }
    }
}

// Keeps the credential out of logs
impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("model", &self.model)
            .field("host", &self.host)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("params", &self.params)
            .finish()
    }
}

impl AdvisorConfig {
    /// Resolve defaults, the override file, and the process environment
    pub fn resolve(override_path: Option<&Path>) -> Result<Self> {
        Ok(Self::load(override_path)?.with_env(|key| std::env::var(key).ok()))
    }

    /// Defaults plus the TOML override, without consulting the environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        match path {
            Some(p) if p.exists() => {
                let content = fs::read_to_string(&p).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", p.display(), e))
                })?;
                parse_config(&content)
            }
            Some(p) if override_path.is_some() => Err(Error::Config(format!(
                "Config file not found: {}",
                p.display()
            ))),
            _ => Ok(Self::default()),
        }
    }

    /// Apply environment overrides from a lookup function
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(MODEL_TOKEN_ENV) {
            self.credential = Some(token.trim().to_string());
        }
        if let Some(model) = non_empty(MODEL_ID_ENV) {
            self.model = model.trim().to_string();
        }
        if let Some(host) = non_empty(MODEL_HOST_ENV) {
            self.host = host.trim().trim_end_matches('/').to_string();
        }
        self
    }

    /// Set the credential explicitly; a blank token clears it
    pub fn with_credential(mut self, token: &str) -> Self {
        let token = token.trim();
        self.credential = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// Whether the generative tier can be attempted
    pub fn has_credential(&self) -> bool {
        self.credential
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Full URL of the generation endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.host.trim_end_matches('/'), self.model)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("penny").join("config").join("advisor.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    model: Option<RawModel>,
    generation: Option<RawGeneration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    id: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGeneration {
    timeout_secs: Option<u64>,
    max_new_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AdvisorConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AdvisorConfig::default();

    if let Some(model) = raw.model {
        if let Some(id) = model.id {
            config.model = id;
        }
        if let Some(host) = model.host {
            config.host = host.trim_end_matches('/').to_string();
        }
    }

    if let Some(generation) = raw.generation {
        if let Some(secs) = generation.timeout_secs {
            if secs == 0 {
                return Err(Error::Config("timeout_secs must be positive".into()));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(tokens) = generation.max_new_tokens {
            config.params.max_new_tokens = tokens;
        }
        if let Some(temperature) = generation.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::Config(format!(
                    "temperature must be within 0..=2, got {}",
                    temperature
                )));
            }
            config.params.temperature = temperature;
        }
        if let Some(top_p) = generation.top_p {
            if !(0.0..=1.0).contains(&top_p) || top_p == 0.0 {
                return Err(Error::Config(format!(
                    "top_p must be within (0, 1], got {}",
                    top_p
                )));
            }
            config.params.top_p = top_p;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(!config.has_credential());
    }

    #[test]
    fn test_parse_override() {
        let config = parse_config(
            r#"
            [model]
            id = "acme/finance-7b"
            host = "http://localhost:8080/"

            [generation]
            timeout_secs = 5
            temperature = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.model, "acme/finance-7b");
        assert_eq!(config.host, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.params.temperature, 0.1);
        assert_eq!(config.params.max_new_tokens, 600);
    }

    #[test]
    fn test_credential_not_accepted_from_file() {
        let result = parse_config(
            r#"
            [model]
            token = "secret"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[generation]\ntimeout_secs = 0").is_err());
        assert!(parse_config("[generation]\ntop_p = 1.5").is_err());
        assert!(parse_config("[generation]\ntemperature = -1.0").is_err());
    }

    #[test]
    fn test_env_layer() {
        let config = AdvisorConfig::default().with_env(env(&[
            (MODEL_TOKEN_ENV, " hf_abc "),
            (MODEL_ID_ENV, "acme/finance-7b"),
            (MODEL_HOST_ENV, "http://127.0.0.1:9000/"),
        ]));

        assert_eq!(config.credential.as_deref(), Some("hf_abc"));
        assert_eq!(config.model, "acme/finance-7b");
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000/models/acme/finance-7b");
    }

    #[test]
    fn test_blank_token_is_no_credential() {
        let config = AdvisorConfig::default().with_env(env(&[(MODEL_TOKEN_ENV, "   ")]));
        assert!(!config.has_credential());
    }

    #[test]
    fn test_blank_explicit_credential_is_ignored() {
        assert!(!AdvisorConfig::default().with_credential("").has_credential());
        assert!(!AdvisorConfig::default().with_credential("  ").has_credential());

        let config = AdvisorConfig {
            credential: Some(" \t".to_string()),
            ..AdvisorConfig::default()
        };
        assert!(!config.has_credential());
        assert!(crate::ai::AIClient::from_config(&config).is_none());

        let config = AdvisorConfig::default().with_credential(" hf_abc ");
        assert_eq!(config.credential.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = AdvisorConfig::default().with_credential("hf_secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hf_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let result = AdvisorConfig::load(Some(Path::new("/nonexistent/penny/advisor.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
