//! Configuration for the JWT mock server.
//!
//! Values are layered, lowest precedence first: built-in defaults, an
//! optional YAML file, `JWT_MOCK_*` environment variables, then CLI flags
//! (applied by the binary).

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Default values.
pub mod defaults {
    /// HTTP port.
    pub const PORT: u16 = 8080;

    /// RSA modulus size in bits.
    pub const KEY_LENGTH: usize = 2048;

    /// Certificate lifetime in days.
    pub const CERT_LIFE_DAYS: u32 = 365;

    /// Log filter directive.
    pub const LOG_LEVEL: &str = "info";

    /// Upper bound on request handling, including key generation on rotate.
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "JWT_MOCK";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP port to listen on.
    pub port: u16,

    /// RSA key size in bits.
    pub key_length: usize,

    /// Lifetime of the certificates published in the key set, in days.
    pub cert_life_days: u32,

    /// Log filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    /// Request timeout applied by the HTTP layer.
    pub request_timeout: Duration,
}

/// Partial configuration as read from YAML.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<u16>,
    key_length: Option<usize>,
    cert_life_days: Option<u32>,
    log_level: Option<String>,
}

impl Config {
    /// Certificate lifetime as a duration.
    #[must_use]
    pub fn certificate_lifetime(&self) -> Duration {
        Duration::from_secs(u64::from(self.cert_life_days) * 24 * 3600)
    }

    /// Small keys and a short certificate lifetime, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            key_length: 2048,
            cert_life_days: 1,
            log_level: "debug".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            config.apply_yaml(&contents)?;
        }

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay values present in a YAML document.
    pub fn apply_yaml(&mut self, contents: &str) -> anyhow::Result<()> {
        let file: Option<ConfigFile> =
            serde_yaml::from_str(contents).context("parse config yaml")?;
        let file = file.unwrap_or_default();

        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(key_length) = file.key_length {
            self.key_length = key_length;
        }
        if let Some(days) = file.cert_life_days {
            self.cert_life_days = days;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        Ok(())
    }

    /// Overlay `JWT_MOCK_*` variables read through `lookup`.
    ///
    /// Empty values are ignored, as are numeric values that fail to parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}")).filter(|v| !v.is_empty());

        if let Some(port) = var("PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(key_length) = var("KEY_LENGTH").and_then(|v| v.parse().ok()) {
            self.key_length = key_length;
        }
        if let Some(days) = var("CERT_LIFE_DAYS").and_then(|v| v.parse().ok()) {
            self.cert_life_days = days;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            key_length: defaults::KEY_LENGTH,
            cert_life_days: defaults::CERT_LIFE_DAYS,
            log_level: defaults::LOG_LEVEL.to_string(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "port={} key-length={} cert-life={}d",
            self.port, self.key_length, self.cert_life_days
        )
    }
}
