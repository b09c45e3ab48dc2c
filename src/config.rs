//! Configuration file handling.
//!
//! This module provides loading and saving of nvd-client configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/nvd-client/config.toml`
//! - macOS: `~/Library/Application Support/nvd-client/config.toml`
//! - Windows: `%APPDATA%\nvd-client\config.toml`
//!
//! # Environment Overrides
//!
//! `NVD_API_KEY` and `NVD_PROXY` replace the corresponding file values when
//! set and non-empty.
//!
//! # Example Configuration
//!
//! ```toml
//! api_key = "00000000-0000-0000-0000-000000000000"
//! proxy = "socks5://127.0.0.1:9050"
//! cve_url = "https://services.nvd.nist.gov/rest/json/cves/2.0"
//! cpe_match_url = "https://services.nvd.nist.gov/rest/json/cpematch/2.0"
//! default_format = "table"
//! log_file = "/var/log/nvd-client.log"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{DEFAULT_CPE_MATCH_URL, DEFAULT_CVE_URL};

/// Environment variable holding the NVD API key.
pub const API_KEY_ENV: &str = "NVD_API_KEY";

/// Environment variable holding the default proxy URL.
pub const PROXY_ENV: &str = "NVD_PROXY";

/// Client and CLI configuration.
///
/// # Example
///
/// ```no_run
/// use nvd_client::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("CVE endpoint: {}", config.cve_url);
/// println!("API key set: {}", config.api_key.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NVD API key sent in the `apiKey` header.
    ///
    /// Default: none (anonymous, lower rate limits)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Proxy for every request (`http://`, `https://` or `socks5://`).
    ///
    /// Default: none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Base URL of the CVE search endpoint.
    pub cve_url: String,

    /// Base URL of the CPE-match search endpoint.
    pub cpe_match_url: String,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// File that receives log lines in addition to the console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            proxy: None,
            cve_url: DEFAULT_CVE_URL.to_string(),
            cpe_match_url: DEFAULT_CPE_MATCH_URL.to_string(),
            default_format: "table".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Loads configuration from the config file and applies environment
    /// overrides.
    ///
    /// If the config file doesn't exist, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(&Self::config_path(), |name| std::env::var(name).ok())
    }

    /// Loads `path` and applies overrides from `lookup`. A file that fails to
    /// parse is an error even when the overrides are set.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Loads configuration from `path` without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Replaces the API key and proxy with values from `lookup` (normally the
    /// process environment). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(proxy) = non_empty(PROXY_ENV) {
            self.proxy = Some(proxy);
        }
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use nvd_client::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("nvd-client/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nvd-client")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
