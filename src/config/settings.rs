//! Service settings loaded from `config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! A few values can be overridden from the environment (`BIND_ADDR`,
//! `PUBLIC_BASE_URL`) after the file is read.

use crate::errors::{Error, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Business rules shared by the reconciler, search and audit views
    pub rules: Rules,
    /// Rows inserted into an empty database on first start
    pub seed: SeedConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API binds to
    pub bind_addr: String,
    /// Base URL used when the chat bot links back to the web UI
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            public_base_url: "http://localhost:5000".to_string(),
        }
    }
}

/// Business rules. Cheap to clone; handed to every core operation that needs it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Named zone defining the local calendar day (e.g., `"Asia/Taipei"`)
    pub timezone: Tz,
    /// Wallet credit for the first submission of a triple per day
    pub bonus_amount: i64,
    /// Look-back window for the historical-low flag
    pub history_low_days: i64,
    /// Units displayed as price per 100 units
    pub per_hundred_units: Vec<String>,
    /// max/min ratio above which a product's price spread is flagged
    pub outlier_ratio: f64,
    /// Products without a snapshot update for this long are reported as stale
    pub stale_after_days: i64,
    /// Admin session lifetime
    pub session_ttl_hours: i64,
    /// Chat passphrase used when no admin record exists
    pub default_audit_code: String,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Taipei,
            bonus_amount: 5,
            history_low_days: 30,
            per_hundred_units: ["ml", "g", "cc", "cm"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            outlier_ratio: 1.5,
            stale_after_days: 30,
            session_ttl_hours: 12,
            default_audit_code: "8888".to_string(),
        }
    }
}

/// Rows inserted into an empty database on first start
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Chain names created when the chains table is empty
    pub chains: Vec<String>,
    /// Bootstrap admin login
    pub admin_username: String,
    /// Bootstrap admin password
    pub admin_password: String,
    /// Initial chat passphrase
    pub audit_code: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            chains: Vec::new(),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            audit_code: "8888".to_string(),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type (e.g., an unknown time zone name)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `./config.toml` when present, otherwise the defaults, then applies
/// environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    let mut config = if path.exists() {
        load_config(path)?
    } else {
        tracing::info!("No config.toml found, using default settings");
        AppConfig::default()
    };

    if let Ok(addr) = std::env::var("BIND_ADDR") {
        config.server.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
        config.server.public_base_url = url;
    }

    tracing::debug!(timezone = %config.rules.timezone, bonus = config.rules.bonus_amount, "Loaded rules");
    Ok(config)
}
