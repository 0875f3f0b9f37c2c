//! Configuration for the consent gateway.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Inbound SMS configuration
    #[serde(default)]
    pub sms: SmsConfig,

    /// Keyword vocabularies
    #[serde(default)]
    pub keywords: KeywordConfig,

    /// Registry and export storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin surface configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Default region for local-format sender numbers
    #[serde(default = "default_region")]
    pub default_region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordConfig {
    /// Tokens that subscribe a sender
    #[serde(default = "default_opt_in")]
    pub opt_in: Vec<String>,

    /// Tokens that unsubscribe a sender
    #[serde(default = "default_opt_out")]
    pub opt_out: Vec<String>,

    /// Tokens that request the instruction reply
    #[serde(default = "default_help")]
    pub help: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the registry snapshot file
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, the registry is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Opted-in export consumed by the bulk sender
    #[serde(default = "default_contacts_csv")]
    pub contacts_csv: PathBuf,

    /// Opted-out export consumed by the bulk sender
    #[serde(default = "default_optout_file")]
    pub optout_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Actor recorded when a request does not attribute one
    #[serde(default = "default_actor")]
    pub default_actor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            default_region: default_region(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            opt_in: default_opt_in(),
            opt_out: default_opt_out(),
            help: default_help(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            persist: true,
            contacts_csv: default_contacts_csv(),
            optout_file: default_optout_file(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            default_actor: default_actor(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_region() -> String {
    "US".into()
}

fn default_opt_in() -> Vec<String> {
    ["JOIN", "START", "SUBSCRIBE"].map(String::from).to_vec()
}

fn default_opt_out() -> Vec<String> {
    [
        "STOP", "STOPALL", "UNSUBSCRIBE", "CANCEL", "END", "QUIT", "STOPA", "STOP1", "STOP2",
    ]
    .map(String::from)
    .to_vec()
}

fn default_help() -> Vec<String> {
    ["HELP", "INFO"].map(String::from).to_vec()
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("data/contacts.json")
}

fn default_true() -> bool {
    true
}

fn default_contacts_csv() -> PathBuf {
    PathBuf::from("data/contacts.csv")
}

fn default_optout_file() -> PathBuf {
    PathBuf::from("data/optouts.txt")
}

fn default_actor() -> String {
    "admin".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sms.default_region, "US");
        assert!(config.keywords.opt_in.contains(&"JOIN".to_string()));
        assert!(config.keywords.opt_out.contains(&"STOPALL".to_string()));
        assert!(config.storage.persist);
        assert_eq!(config.admin.default_actor, "admin");
        assert_eq!(config.log.level, "info");
    }
}
