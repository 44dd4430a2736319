//! Configuration management.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. A missing or empty `REDIS_URL` is not an error; it
//! selects the in-memory backend.

use crate::observability::LogFormat;
use crate::storage::RetryPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration for todolist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    /// Redis connection string. `None` runs in memory.
    pub redis_url: Option<String>,
    /// Redis connection behavior.
    pub redis: RedisSettings,
    /// HTTP bind address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Whether to install the Prometheus recorder.
    pub metrics_enabled: bool,
}

/// Redis connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    /// Timeout for establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Read/write timeout for each command.
    pub command_timeout: Duration,
    /// Retry policy for the startup connection.
    pub retry: RetryPolicy,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            command_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: None,
        }
    }
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis: RedisSettings::default(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            logging: LoggingSettings::default(),
            metrics_enabled: false,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Redis connection string.
    pub redis_url: Option<String>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Redis section.
    pub redis: Option<ConfigFileRedis>,
    /// Observability section.
    pub observability: Option<ConfigFileObservability>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileServer {
    /// Bind address.
    pub host: Option<String>,
    /// Port.
    pub port: Option<u16>,
}

/// Redis section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileRedis {
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Command timeout in milliseconds.
    pub command_timeout_ms: Option<u64>,
    /// Maximum connection attempts at startup.
    pub max_attempts: Option<u32>,
    /// Initial retry backoff in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Backoff cap in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Total retry budget in milliseconds.
    pub max_elapsed_ms: Option<u64>,
}

/// Observability section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileObservability {
    /// `pretty` or `json`.
    pub log_format: Option<String>,
    /// `EnvFilter` directive.
    pub log_filter: Option<String>,
    /// Install the Prometheus recorder.
    pub metrics_enabled: Option<bool>,
}

impl TodoConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Loads configuration from a file path, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Ok(Self::parse_toml(&contents)?.with_env_overrides())
    }

    /// Parses TOML config contents on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not valid config TOML.
    pub fn parse_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Uses `<config dir>/todolist/config.toml` if present, otherwise defaults.
    /// Environment overrides are applied in both cases.
    #[must_use]
    pub fn load_default() -> Self {
        let from_file = directories::ProjectDirs::from("", "", "todolist")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Ignoring unreadable config file"
                    );
                    None
                },
            });

        from_file.unwrap_or_else(Self::from_env)
    }

    /// Converts a `ConfigFile` to `TodoConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        config.redis_url = file.redis_url.filter(|url| !url.trim().is_empty());

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }
        if let Some(redis) = file.redis {
            let settings = &mut config.redis;
            if let Some(ms) = redis.connect_timeout_ms {
                settings.connect_timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = redis.command_timeout_ms {
                settings.command_timeout = Duration::from_millis(ms);
            }
            if let Some(attempts) = redis.max_attempts {
                settings.retry.max_attempts = attempts.max(1);
            }
            if let Some(ms) = redis.initial_backoff_ms {
                settings.retry.initial_backoff = Duration::from_millis(ms);
            }
            if let Some(ms) = redis.max_backoff_ms {
                settings.retry.max_backoff = Duration::from_millis(ms);
            }
            if let Some(ms) = redis.max_elapsed_ms {
                settings.retry.max_elapsed = Duration::from_millis(ms);
            }
        }
        if let Some(observability) = file.observability {
            if let Some(format) = observability.log_format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.filter = observability.log_filter;
            if let Some(enabled) = observability.metrics_enabled {
                config.metrics_enabled = enabled;
            }
        }

        config
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored and keep the current setting.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("REDIS_URL") {
            self.redis_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(host) = lookup("TODO_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse().ok()) {
            self.port = port;
        }
        if let Some(ms) = parse_millis(lookup("TODO_REDIS_CONNECT_TIMEOUT_MS")) {
            self.redis.connect_timeout = ms;
        }
        if let Some(ms) = parse_millis(lookup("TODO_REDIS_COMMAND_TIMEOUT_MS")) {
            self.redis.command_timeout = ms;
        }
        if let Some(attempts) =
            lookup("TODO_REDIS_MAX_ATTEMPTS").and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.redis.retry.max_attempts = attempts.max(1);
        }
        if let Some(format) = lookup("TODO_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(enabled) = lookup("TODO_METRICS_ENABLED").and_then(|v| parse_bool(&v)) {
            self.metrics_enabled = enabled;
        }
        self
    }

    /// Sets the Redis URL.
    #[must_use]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Sets the Redis connection settings.
    #[must_use]
    pub fn with_redis_settings(mut self, settings: RedisSettings) -> Self {
        self.redis = settings;
        self
    }

    /// Returns the `host:port` bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_millis(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TodoConfig::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.redis.retry, RetryPolicy::default());
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let config = TodoConfig::default().with_overrides(lookup(&[
            ("REDIS_URL", "redis://cache:6379"),
            ("PORT", "8080"),
            ("TODO_HOST", "127.0.0.1"),
            ("TODO_REDIS_MAX_ATTEMPTS", "2"),
            ("TODO_REDIS_CONNECT_TIMEOUT_MS", "250"),
            ("TODO_LOG_FORMAT", "json"),
            ("TODO_METRICS_ENABLED", "yes"),
        ]));

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.redis.retry.max_attempts, 2);
        assert_eq!(config.redis.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_empty_redis_url_means_in_memory() {
        let config = TodoConfig::default()
            .with_redis_url("redis://x")
            .with_overrides(lookup(&[("REDIS_URL", "  ")]));
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let config = TodoConfig::default().with_overrides(lookup(&[
            ("PORT", "eighty"),
            ("TODO_REDIS_MAX_ATTEMPTS", "-1"),
            ("TODO_METRICS_ENABLED", "maybe"),
        ]));
        assert_eq!(config, TodoConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = TodoConfig::parse_toml(
            r#"
            redis_url = "redis://localhost:6379"

            [server]
            port = 4000

            [redis]
            max_attempts = 3
            max_elapsed_ms = 1500

            [observability]
            log_format = "json"
            metrics_enabled = true
            "#,
        )
        .expect("valid config");

        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.redis.retry.max_attempts, 3);
        assert_eq!(config.redis.retry.max_elapsed, Duration::from_millis(1500));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_parse_toml_rejects_unknown_keys() {
        assert!(TodoConfig::parse_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[server]\nhost = \"127.0.0.1\"").expect("write");

        let config = TodoConfig::load_from_file(file.path()).expect("load");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = TodoConfig::load_from_file(Path::new("/nonexistent/todolist.toml"));
        assert!(result.is_err());
    }
}
