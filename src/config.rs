//! Configuration management for the edge range cache

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the edge cache proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Cache namespace epoch (default: "1")
    ///
    /// Bumping this value makes every previously derived cache key
    /// unreachable, which is the only cache invalidation mechanism. It is
    /// a runtime setting so operators can bump it without a rebuild.
    #[serde(default = "default_cache_id")]
    pub cache_id: String,

    /// Scheme used in derived cache keys (default: "https")
    #[serde(default = "default_key_scheme")]
    pub key_scheme: String,

    /// Fixed authority used in derived cache keys (default: "edge-cache.internal")
    ///
    /// Never dialed; it only namespaces keys away from real request URLs.
    #[serde(default = "default_key_authority")]
    pub key_authority: String,

    /// Lifetime of cached object responses in seconds (default: 604800 = 7 days)
    #[serde(default = "default_positive_ttl")]
    pub positive_ttl_secs: u64,

    /// Lifetime of cached not-found responses in seconds (default: 600 = 10 minutes)
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,

    /// Address the HTTP server binds to (default: "127.0.0.1:8080")
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Root directory of the filesystem object store (default: "/var/lib/edge-range-cache")
    #[serde(default = "default_store_root")]
    pub store_root: String,

    /// Hostnames the access gate accepts; empty list accepts any host
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Referer prefixes the access gate accepts; empty list accepts any referer
    #[serde(default)]
    pub referer_prefixes: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            cache_id: default_cache_id(),
            key_scheme: default_key_scheme(),
            key_authority: default_key_authority(),
            positive_ttl_secs: default_positive_ttl(),
            negative_ttl_secs: default_negative_ttl(),
            listen_address: default_listen_address(),
            store_root: default_store_root(),
            allowed_hosts: Vec::new(),
            referer_prefixes: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    /// * `Ok(ProxyConfig)` if the file loads, parses and validates
    /// * `Err(ProxyError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::ConfigError(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: ProxyConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ProxyError::ConfigError(format!("failed to parse YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Validation Rules
    /// - `cache_id` must not be empty and must not contain `_` (the key
    ///   field separator)
    /// - `key_scheme` must be "http" or "https"
    /// - `key_authority` must not be empty
    /// - both TTLs must be non-zero
    /// - `listen_address` must parse as a socket address
    pub fn validate(&self) -> Result<()> {
        if self.cache_id.is_empty() {
            return Err(ProxyError::ConfigError(
                "cache_id must not be empty".to_string(),
            ));
        }
        if self.cache_id.contains('_') {
            return Err(ProxyError::ConfigError(format!(
                "cache_id must not contain '_', got: {}",
                self.cache_id
            )));
        }

        if self.key_scheme != "http" && self.key_scheme != "https" {
            return Err(ProxyError::ConfigError(format!(
                "key_scheme must be \"http\" or \"https\", got: {}",
                self.key_scheme
            )));
        }

        if self.key_authority.is_empty() {
            return Err(ProxyError::ConfigError(
                "key_authority must not be empty".to_string(),
            ));
        }

        if self.positive_ttl_secs == 0 {
            return Err(ProxyError::ConfigError(
                "positive_ttl_secs must be greater than 0".to_string(),
            ));
        }
        if self.negative_ttl_secs == 0 {
            return Err(ProxyError::ConfigError(
                "negative_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.listen_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ProxyError::ConfigError(format!(
                "listen_address is not a valid socket address: {}",
                self.listen_address
            )));
        }

        Ok(())
    }
}

// Default value functions for serde

fn default_cache_id() -> String {
    "1".to_string()
}

fn default_key_scheme() -> String {
    "https".to_string()
}

fn default_key_authority() -> String {
    "edge-cache.internal".to_string()
}

fn default_positive_ttl() -> u64 {
    604800 // 7 days
}

fn default_negative_ttl() -> u64 {
    600 // 10 minutes
}

fn default_listen_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_store_root() -> String {
    "/var/lib/edge-range-cache".to_string()
}
