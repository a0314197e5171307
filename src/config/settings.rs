//! Configuration settings
//!
//! Settings are loaded from a TOML file and environment variables, with
//! defaults matching the behaviour documented for the session manager:
//! one hour session TTL, five minute cleanup sweep and ten second
//! outbound timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Helper functions for serde defaults
fn default_session_ttl() -> u64 {
    3600
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("source-auth/{}", crate::utils::version::VERSION)
}

fn default_master_key_env() -> String {
    "SOURCE_AUTH_MASTER_KEY".to_string()
}

/// Main configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Session lifetime configuration
    #[serde(default)]
    pub session: SessionSettings,
    /// Outbound network configuration
    #[serde(default)]
    pub network: NetworkSettings,
    /// Credential vault configuration
    #[serde(default)]
    pub vault: VaultSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Session lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session TTL in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Interval between expired-session sweeps, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    /// Upper bound on total session lifetime across refreshes, in seconds
    #[serde(default)]
    pub max_lifetime_secs: Option<u64>,
}

/// Outbound network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// HTTPS proxy URL
    #[serde(default)]
    pub https_proxy: Option<String>,
    /// HTTP proxy URL
    #[serde(default)]
    pub http_proxy: Option<String>,
    /// All protocols proxy URL
    #[serde(default)]
    pub all_proxy: Option<String>,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Total request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Credential vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Name of the environment variable holding the master secret
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            cleanup_interval_secs: default_cleanup_interval(),
            max_lifetime_secs: None,
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            https_proxy: None,
            http_proxy: None,
            all_proxy: None,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            master_key_env: default_master_key_env(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
            format: default_log_format(),
        }
    }
}

impl SessionSettings {
    /// Session TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Cleanup interval as a duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Maximum lifetime as a duration
    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_secs.map(Duration::from_secs)
    }
}

impl NetworkSettings {
    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> crate::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::config(name, &format!("Invalid value '{}': {}", raw, e))),
        Err(_) => Ok(None),
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Load settings from configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config("file", &format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            crate::Error::config("file", &format!("Failed to parse config file: {}", e))
        })?;

        Ok(settings)
    }

    /// Merge settings with environment variable overrides
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> crate::Result<()> {
        if let Some(ttl) = parse_env("SESSION_TTL")? {
            self.session.ttl_secs = ttl;
        }
        if let Some(interval) = parse_env("SESSION_CLEANUP_INTERVAL")? {
            self.session.cleanup_interval_secs = interval;
        }
        if let Some(max_lifetime) = parse_env("SESSION_MAX_LIFETIME")? {
            self.session.max_lifetime_secs = Some(max_lifetime);
        }
        if let Some(timeout) = parse_env("AUTH_REQUEST_TIMEOUT")? {
            self.network.request_timeout = timeout;
        }

        // Proxy settings always override if present
        if let Ok(proxy) = std::env::var("HTTPS_PROXY") {
            self.network.https_proxy = Some(proxy);
        }
        if let Ok(proxy) = std::env::var("HTTP_PROXY") {
            self.network.http_proxy = Some(proxy);
        }
        if let Ok(proxy) = std::env::var("ALL_PROXY") {
            self.network.all_proxy = Some(proxy);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(verbose) = std::env::var("VERBOSE") {
            self.logging.verbose = verbose.parse().unwrap_or(false);
        }

        Ok(())
    }

    /// Get effective proxy URL based on priority
    pub fn get_proxy_url(&self) -> Option<String> {
        self.network
            .https_proxy
            .as_ref()
            .or(self.network.http_proxy.as_ref())
            .or(self.network.all_proxy.as_ref())
            .cloned()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.session.ttl_secs == 0 {
            return Err(crate::Error::config(
                "session.ttl_secs",
                "Invalid session TTL: cannot be 0",
            ));
        }

        if self.session.cleanup_interval_secs == 0 {
            return Err(crate::Error::config(
                "session.cleanup_interval_secs",
                "Invalid cleanup interval: cannot be 0",
            ));
        }

        if let Some(max_lifetime) = self.session.max_lifetime_secs
            && max_lifetime < self.session.ttl_secs
        {
            return Err(crate::Error::config(
                "session.max_lifetime_secs",
                "Maximum lifetime cannot be shorter than the session TTL",
            ));
        }

        if self.network.request_timeout == 0 || self.network.connect_timeout == 0 {
            return Err(crate::Error::config(
                "network",
                "Invalid timeout: cannot be 0",
            ));
        }

        if self.vault.master_key_env.trim().is_empty() {
            return Err(crate::Error::config(
                "vault.master_key_env",
                "Master key variable name cannot be empty",
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(
                    "logging.level",
                    &format!("Invalid log level: {}", self.logging.level),
                ));
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => {}
            _ => {
                return Err(crate::Error::config(
                    "logging.format",
                    &format!("Invalid log format: {}", self.logging.format),
                ));
            }
        }

        for (name, proxy_url) in [
            ("network.https_proxy", &self.network.https_proxy),
            ("network.http_proxy", &self.network.http_proxy),
            ("network.all_proxy", &self.network.all_proxy),
        ]
        .iter()
        {
            if let Some(url_str) = proxy_url
                && let Err(e) = url::Url::parse(url_str)
            {
                return Err(crate::Error::config(
                    *name,
                    &format!("Invalid proxy URL '{}': {}", url_str, e),
                ));
            }
        }

        Ok(())
    }
}
