// Logging module, powered by tracing-subscriber
//
// Library crates log through the `log` macros. A compatibility bridge
// (`tracing_log::LogTracer`) routes those records through the tracing
// subscriber installed here.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::Path;

use branchkey_configs::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Build the filter directive string from the base level, the driver-side
/// crates we keep quiet, and per-target overrides from config.
///
/// Overrides are sorted by target so the result is stable.
pub fn filter_directives(level: &str, target_levels: &HashMap<String, String>) -> String {
    let mut directives = vec![level.to_string()];

    let noisy: &[(&str, &str)] = &[("tokio", "warn"), ("runtime", "warn"), ("tracing", "warn")];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let mut overrides: Vec<(&String, &String)> = target_levels.iter().collect();
    overrides.sort();
    for (target, lvl) in overrides {
        directives.push(format!("{}={}", target, lvl));
    }

    directives.join(",")
}

fn build_env_filter(level: &str, target_levels: &HashMap<String, String>) -> anyhow::Result<EnvFilter> {
    let filter_str = filter_directives(level, target_levels);
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Initialize logging from the `[logging]` config section.
///
/// Sets up `tracing-subscriber` with:
///  - Colored console layer (when `log_to_console` is true)
///  - File layer (compact text or JSON lines)
///  - `tracing_log::LogTracer` bridge so that all `log::*` calls are captured
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let log_format = LogFormat::parse(&settings.format);
    let file_path = settings.file_path.as_str();

    if let Some(parent) = Path::new(file_path).parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(file_path)?;

    tracing_log::LogTracer::init().ok(); // ok() in case already initialized

    let console_layer = if settings.log_to_console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(true)
                .with_thread_names(true)
                .with_filter(build_env_filter(&settings.level, &settings.targets)?),
        )
    } else {
        None
    };

    let file_layer = if log_format == LogFormat::Json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(log_file)
            .with_target(true)
            .with_thread_names(true)
            .with_filter(build_env_filter(&settings.level, &settings.targets)?)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(log_file)
            .with_target(true)
            .with_thread_names(true)
            .with_filter(build_env_filter(&settings.level, &settings.targets)?)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::trace!(
        "Logging initialized: level={}, console={}, file={}",
        settings.level,
        settings.log_to_console,
        file_path
    );

    Ok(())
}

/// Console-only logging for tools and tests
pub fn init_simple_logging() -> anyhow::Result<()> {
    tracing_log::LogTracer::init().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("jsonl"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Compact);
    }

    #[test]
    fn test_filter_directives_include_overrides() {
        let mut targets = HashMap::new();
        targets.insert("branchkey_core::schema_registry".to_string(), "trace".to_string());
        targets.insert("branchkey_core::pk".to_string(), "debug".to_string());

        let directives = filter_directives("info", &targets);

        assert!(directives.starts_with("info,"));
        assert!(directives.ends_with(
            "branchkey_core::pk=debug,branchkey_core::schema_registry=trace"
        ));
        assert!(build_env_filter("info", &targets).is_ok());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let mut targets = HashMap::new();
        targets.insert("branchkey_core".to_string(), "loud".to_string());
        assert!(build_env_filter("info", &targets).is_err());
    }
}
