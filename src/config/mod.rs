//! Configuration management module
//!
//! Configuration is assembled in layers: built-in defaults, an optional
//! JSON config file, then environment variable overrides. The resulting
//! [`MirrorConfig`] is validated once at startup and passed explicitly into
//! the engine; there is no ambient process-wide state.

use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One registry namespace the mirror reads from or writes to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEndpoint {
    /// Registry host, e.g. `quay-registry.apps.prod.example.com`
    pub host: String,
    /// Namespace (organization) holding the repositories
    pub namespace: String,
    /// API token for catalog/listing calls
    #[serde(default)]
    pub api_token: Option<String>,
}

impl RegistryEndpoint {
    pub fn new(host: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            namespace: namespace.into(),
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn validate(&self, role: &str) -> Result<()> {
        if self.host.is_empty() {
            return Err(MirrorError::Config(format!(
                "{} registry host cannot be empty",
                role
            )));
        }
        if self.host.contains("://") {
            return Err(MirrorError::Config(format!(
                "{} registry host must be a bare hostname, not a URL: {}",
                role, self.host
            )));
        }
        // Catches embedded whitespace, slashes and other junk early
        url::Url::parse(&format!("https://{}", self.host)).map_err(|e| {
            MirrorError::Config(format!("{} registry host is malformed: {}", role, e))
        })?;
        if self.namespace.is_empty() {
            return Err(MirrorError::Config(format!(
                "{} registry namespace cannot be empty",
                role
            )));
        }
        Ok(())
    }
}

/// Bounded fixed-delay retry parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Full application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub source: RegistryEndpoint,
    pub destination: RegistryEndpoint,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Timeout for catalog API requests, seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,
    /// Timeout for a single transfer command (pull/push), seconds
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,
    /// Extra existence re-checks after a publish reports success
    #[serde(default = "default_verify_retries")]
    pub verify_retries: usize,
    /// Delay before each verify re-check, seconds
    #[serde(default = "default_verify_delay")]
    pub verify_delay_secs: u64,
    #[serde(default)]
    pub verbose: bool,
}

fn default_api_timeout() -> u64 {
    30
}

fn default_transfer_timeout() -> u64 {
    300
}

fn default_verify_retries() -> usize {
    1
}

fn default_verify_delay() -> u64 {
    2
}

impl MirrorConfig {
    pub fn new(source: RegistryEndpoint, destination: RegistryEndpoint) -> Self {
        Self {
            source,
            destination,
            retry: RetryConfig::default(),
            api_timeout_secs: default_api_timeout(),
            transfer_timeout_secs: default_transfer_timeout(),
            verify_retries: default_verify_retries(),
            verify_delay_secs: default_verify_delay(),
            verbose: false,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MirrorError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config: MirrorConfig = serde_json::from_str(&content).map_err(|e| {
            MirrorError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(mut self) -> Self {
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_SOURCE_HOST") {
            self.source.host = val;
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_SOURCE_NAMESPACE") {
            self.source.namespace = val;
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_SOURCE_TOKEN") {
            self.source.api_token = Some(val);
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_DEST_HOST") {
            self.destination.host = val;
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_DEST_NAMESPACE") {
            self.destination.namespace = val;
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_DEST_TOKEN") {
            self.destination.api_token = Some(val);
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                self.retry.max_attempts = n;
            }
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_RETRY_DELAY") {
            if let Ok(n) = val.parse() {
                self.retry.delay_secs = n;
            }
        }
        if let Ok(val) = std::env::var("REGISTRY_MIRROR_VERBOSE") {
            self.verbose = val.to_lowercase() == "true" || val == "1";
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.source.validate("source")?;
        self.destination.validate("destination")?;
        if self.retry.max_attempts == 0 {
            return Err(MirrorError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(MirrorError::Config(
                "api_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.transfer_timeout_secs == 0 {
            return Err(MirrorError::Config(
                "transfer_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.source.host == self.destination.host
            && self.source.namespace == self.destination.namespace
        {
            return Err(MirrorError::Config(
                "source and destination must not be the same namespace".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_secs(self.verify_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MirrorConfig {
        MirrorConfig::new(
            RegistryEndpoint::new("quay.prod.example.com", "apps"),
            RegistryEndpoint::new("quay.dr.example.com", "apps"),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut config = sample();
        config.source.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_host_rejected() {
        let mut config = sample();
        config.destination.host = "https://quay.dr.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_namespace_rejected() {
        let mut config = sample();
        config.destination = config.source.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = sample();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let config = sample();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MirrorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source.host, config.source.host);
        assert_eq!(parsed.retry.max_attempts, 3);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{
            "source": {"host": "a.example.com", "namespace": "ns"},
            "destination": {"host": "b.example.com", "namespace": "ns"}
        }"#;
        let parsed: MirrorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.retry.delay_secs, 5);
        assert_eq!(parsed.api_timeout_secs, 30);
        assert_eq!(parsed.verify_retries, 1);
    }
}
