use super::types::RmConfig;
use branchkey_commons::DialectKind;
use std::env;
use std::fs;
use std::path::Path;

impl RmConfig {
    /// Load configuration from a TOML file
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: RmConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.finalize()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - BRANCHKEY_RESOURCE_ID: Override resource_id
    /// - BRANCHKEY_DIALECT: Override dialect
    /// - BRANCHKEY_LOG_LEVEL: Override logging.level
    /// - BRANCHKEY_SCHEMA_CACHE_MAX_ENTRIES: Override schema_cache.max_entries
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(resource_id) = env::var("BRANCHKEY_RESOURCE_ID") {
            self.resource_id = resource_id;
        }

        if let Ok(dialect) = env::var("BRANCHKEY_DIALECT") {
            self.dialect = dialect
                .parse::<DialectKind>()
                .map_err(|e| anyhow::anyhow!("Invalid BRANCHKEY_DIALECT value: {}", e))?;
        }

        if let Ok(level) = env::var("BRANCHKEY_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Ok(max_str) = env::var("BRANCHKEY_SCHEMA_CACHE_MAX_ENTRIES") {
            self.schema_cache.max_entries = max_str.parse().map_err(|_| {
                anyhow::anyhow!("Invalid BRANCHKEY_SCHEMA_CACHE_MAX_ENTRIES value: {}", max_str)
            })?;
        }

        Ok(())
    }

    /// Validate configuration. Call this after applying environment overrides.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        self.resource_id = self.resource_id.trim().to_string();
        self.logging.level = self.logging.level.to_lowercase();

        self.validate()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resource_id.is_empty() {
            return Err(anyhow::anyhow!("resource_id cannot be empty"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        for (target, level) in &self.logging.targets {
            if !valid_levels.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    valid_levels.join(", ")
                ));
            }
        }

        Ok(())
    }
}
