use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default days-since threshold for "newest" queries
const DEFAULT_NEWEST_DAYS: i64 = 7;

/// Connection settings for one remote device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Display name of the device record
    pub name: String,
    pub host: String,
    pub tcp_port: u16,
    pub http_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "Kodi".to_string(),
            host: "localhost".to_string(),
            tcp_port: 9090,
            http_port: 8080,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Devices
    pub devices: Vec<DeviceConfig>,

    // Library queries
    #[serde(default = "default_newest_days", deserialize_with = "de_days")]
    pub newest_days: i64,
    pub fuzzy_threshold: f64,

    // Timing
    pub reconnect_interval_ms: u64,
    pub call_timeout_ms: u64,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: vec![DeviceConfig::default()],
            newest_days: DEFAULT_NEWEST_DAYS,
            fuzzy_threshold: 0.4,
            reconnect_interval_ms: 10_000,
            call_timeout_ms: 30_000,
            log_level: "INFO".to_string(),
        }
    }
}

fn default_newest_days() -> i64 {
    DEFAULT_NEWEST_DAYS
}

/// The days-since setting arrives from settings storage as whatever the user
/// typed; anything non-numeric falls back to the default.
fn de_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(DEFAULT_NEWEST_DAYS),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(DEFAULT_NEWEST_DAYS),
        _ => DEFAULT_NEWEST_DAYS,
    })
}

impl Config {
    /// Load config from file or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kodilink")
        .join("config.json")
}
