use super::defaults::*;
use branchkey_commons::DialectKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Resource-manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmConfig {
    /// Logical resource identifier (usually the datasource URL); part of every cache key
    #[serde(default = "default_resource_id")]
    pub resource_id: String,
    /// Database dialect, resolved once at startup
    pub dialect: DialectKind,
    #[serde(default)]
    pub schema_cache: SchemaCacheSettings,
    #[serde(default)]
    pub generated_keys: GeneratedKeySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl RmConfig {
    /// Configuration with defaults for everything but the dialect
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            resource_id: default_resource_id(),
            dialect,
            schema_cache: SchemaCacheSettings::default(),
            generated_keys: GeneratedKeySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Schema metadata cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCacheSettings {
    /// Maximum cached tables before least-recently-used eviction (0 = unlimited)
    #[serde(default = "default_schema_cache_max_entries")]
    pub max_entries: usize,
    /// Per-fetch timeout for catalog queries in milliseconds (0 = none)
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for SchemaCacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_schema_cache_max_entries(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl SchemaCacheSettings {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_ms > 0).then(|| Duration::from_millis(self.fetch_timeout_ms))
    }
}

/// Generated-key retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKeySettings {
    /// Run the dialect fallback query when the driver's generated keys are unusable
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    /// Timeout for each retrieval attempt in milliseconds (0 = none)
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeneratedKeySettings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl GeneratedKeySettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file_path")]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Per-target level overrides, e.g. `branchkey_core::schema_registry = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_file_path(),
            log_to_console: true,
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}
