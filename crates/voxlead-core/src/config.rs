//! Voxlead configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, VoxleadError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VoxleadConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl VoxleadConfig {
    /// Load config from the default path (~/.voxlead/config.toml), falling
    /// back to defaults when no file exists. Secret env overrides are
    /// applied either way.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VoxleadError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| VoxleadError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| VoxleadError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Voxlead home directory (~/.voxlead).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".voxlead")
    }

    /// Secrets are preferred from the environment so the config file can
    /// stay checked into provisioning without credentials.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VOXLEAD_SMTP_USER") {
            self.smtp.user = v;
        }
        if let Ok(v) = std::env::var("VOXLEAD_SMTP_PASSWORD") {
            self.smtp.password = v;
        }
        if let Ok(v) = std::env::var("VOXLEAD_VOICE_API_KEY") {
            self.voice.api_key = v;
        }
        if let Ok(v) = std::env::var("VOXLEAD_CRON_SECRET") {
            self.dispatch.cron_secret = v;
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.voxlead/voxlead.db".into() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// SMTP (follow-up and notification email) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Ops inbox that receives contact-form inquiries.
    #[serde(default)]
    pub contact_inbox: String,
}

fn default_smtp_host() -> String { "smtp.gmail.com".into() }
fn default_smtp_port() -> u16 { 587 }
fn default_from_name() -> String { "Voxlead".into() }

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            password: String::new(),
            from_name: default_from_name(),
            contact_inbox: String::new(),
        }
    }
}

/// Outbound-call vendor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Vendor outbound-call endpoint.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Voice agent that places the call.
    #[serde(default)]
    pub agent_id: String,
    /// Vendor-side phone number the call originates from.
    #[serde(default)]
    pub agent_phone_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Metadata tag identifying this deployment as the call source.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

fn default_language() -> String { "en-IN".into() }
fn default_source_tag() -> String { "voxlead-site".into() }

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            agent_id: String::new(),
            agent_phone_id: String::new(),
            language: default_language(),
            source_tag: default_source_tag(),
        }
    }
}

/// Dispatch job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Delay between a booking and its follow-up email.
    #[serde(default = "default_follow_up_delay")]
    pub follow_up_delay_secs: u64,
    /// In-process dispatch interval. 0 disables the loop (external cron
    /// hits the trigger endpoint instead).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Bearer secret required by the trigger endpoint. Empty = open
    /// (local testing).
    #[serde(default)]
    pub cron_secret: String,
}

fn default_follow_up_delay() -> u64 { 300 }
fn default_interval() -> u64 { 60 }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            follow_up_delay_secs: default_follow_up_delay(),
            interval_secs: default_interval(),
            cron_secret: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VoxleadConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.dispatch.follow_up_delay_secs, 300);
        assert_eq!(config.dispatch.interval_secs, 60);
        assert!(config.dispatch.cron_secret.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: VoxleadConfig = toml::from_str(
            r#"
            [server]
            port = 3000

            [dispatch]
            follow_up_delay_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.dispatch.follow_up_delay_secs, 120);
        assert_eq!(config.dispatch.interval_secs, 60);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = VoxleadConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: VoxleadConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.server.port, config.server.port);
        assert_eq!(back.database.path, config.database.path);
    }
}
