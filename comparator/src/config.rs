use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::prelude::*;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Weekly,
    Never,
}

impl LogRotation {
    pub fn to_rotation(self) -> Rotation {
        match self {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Weekly => Rotation::WEEKLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_max_log_files() -> usize {
    7
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub server: Server,
    pub logging: Logging,
    pub debug: bool,
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Database {
    /// Report database file, relative to the working directory.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    pub level: Option<String>,
    /// Also write rolling log files here when set.
    pub dir: Option<String>,
    pub rotation: LogRotation,
    pub max_log_files: usize,
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: None,
            dir: None,
            rotation: LogRotation::default(),
            max_log_files: default_max_log_files(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("DB_NAME environment variable is not set")]
    MissingDatabaseName,
    #[error("Invalid port: {0}")]
    InvalidPort(String),
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("Failed to setup logging: {0}")]
    LoggingSetup(tracing_appender::rolling::InitError),
}

/// Maps a configured level name onto a tracing filter directive.
fn filter_level(raw: &str) -> Result<&'static str, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" => Ok("error"),
        _ => Err(ConfigError::InvalidLogLevel(raw.to_string())),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config_file = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&config_file)?;
        Ok(cfg)
    }

    /// File settings (if any), overridden by the process environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::new(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("DB_NAME") {
            self.database.name = Some(name);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = split_origins(&origins);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = Some(level);
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = debug.trim().eq_ignore_ascii_case("true");
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.secret_key = Some(secret);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.database.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingDatabaseName),
        }
        if let Some(level) = &self.logging.level {
            filter_level(level)?;
        }
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        self.db_path_in(&std::env::current_dir()?)
    }

    /// Resolves the database file under `base`, creating its parent directory.
    pub fn db_path_in(&self, base: &Path) -> Result<PathBuf, ConfigError> {
        let name = self
            .database
            .name
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseName)?;
        let path = base.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn default_level(&self) -> &'static str {
        match self.logging.level.as_deref().map(filter_level) {
            Some(Ok(level)) => level,
            Some(Err(_)) => "info",
            None if self.debug => "debug",
            None => "info",
        }
    }

    pub fn init_logger(&self) -> Result<Vec<WorkerGuard>, ConfigError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level()));

        let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
        let mut guards = vec![stdout_guard];

        let file_layer = match &self.logging.dir {
            Some(dir) => {
                let file_appender = Builder::new()
                    .rotation(self.logging.rotation.to_rotation())
                    .filename_prefix("comparator")
                    .filename_suffix("log")
                    .max_log_files(self.logging.max_log_files)
                    .build(dir)
                    .map_err(ConfigError::LoggingSetup)?;
                let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
                guards.push(file_guard);

                match self.logging.format {
                    LogFormat::Text => Some(tracing_fmt::layer().with_writer(file_nb).boxed()),
                    LogFormat::Json => {
                        Some(tracing_fmt::layer().json().with_writer(file_nb).boxed())
                    }
                }
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(file_layer)
            .with(env_filter)
            .with(tracing_fmt::layer().with_writer(stdout_nb))
            .init();

        Ok(guards)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.database.name.is_none());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.logging.max_log_files, 7);
        assert_eq!(config.logging.rotation, LogRotation::Daily);
        assert!(!config.debug);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_new_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let config_content = r#"
debug = true

[database]
name = "data/reports.sqlite3"

[server]
host = "127.0.0.1"
port = 9000
allowed_origins = ["http://localhost:3000"]

[logging]
level = "WARNING"
dir = "/var/log/comparator"
rotation = "weekly"
format = "json"
"#;

        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::new(temp_file.path().to_str().unwrap()).unwrap();

        assert!(config.debug);
        assert_eq!(config.database.name.as_deref(), Some("data/reports.sqlite3"));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.logging.dir.as_deref(), Some("/var/log/comparator"));
        assert_eq!(config.logging.rotation, LogRotation::Weekly);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.default_level(), "warn");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_new_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[server\nport = 80").unwrap();

        match Config::new(temp_file.path().to_str().unwrap()) {
            Err(ConfigError::Toml(_)) => {}
            other => panic!("Expected TOML parsing error, got {other:?}"),
        }
    }

    #[test]
    fn test_config_new_missing_file() {
        assert!(matches!(
            Config::new("/nonexistent/comparator.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("DB_NAME", "db.sqlite3"),
                ("HOST", "localhost"),
                ("PORT", "5000"),
                ("ALLOWED_ORIGINS", "http://a.example, ,http://b.example ,"),
                ("LOG_LEVEL", "CRITICAL"),
                ("DEBUG", "True"),
                ("SECRET_KEY", "hunter2"),
            ]))
            .unwrap();

        assert_eq!(config.database.name.as_deref(), Some("db.sqlite3"));
        assert_eq!(config.bind_addr(), "localhost:5000");
        assert_eq!(
            config.server.allowed_origins,
            vec!["http://a.example", "http://b.example"]
        );
        assert_eq!(config.default_level(), "error");
        assert!(config.debug);
        assert_eq!(config.secret_key.as_deref(), Some("hunter2"));
        config.validate().unwrap();
    }

    #[test]
    fn test_env_debug_only_true_enables() {
        let mut config = Config::default();
        config.apply_env(env(&[("DEBUG", "1")])).unwrap();
        assert!(!config.debug);
        assert_eq!(config.default_level(), "info");

        config.apply_env(env(&[("DEBUG", "true")])).unwrap();
        assert_eq!(config.default_level(), "debug");
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[("PORT", "http")])),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config.apply_env(env(&[("PORT", "70000")])),
            Err(ConfigError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_validate_requires_database_name() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDatabaseName)
        ));

        let mut config = Config::default();
        config.apply_env(env(&[("DB_NAME", "  ")])).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDatabaseName)
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("DB_NAME", "db.sqlite3"), ("LOG_LEVEL", "verbose")]))
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_filter_level_aliases() {
        assert_eq!(filter_level("INFO").unwrap(), "info");
        assert_eq!(filter_level("Warning").unwrap(), "warn");
        assert_eq!(filter_level("critical").unwrap(), "error");
        assert!(filter_level("").is_err());
    }

    #[test]
    fn test_db_path_creates_parent() {
        let base = TempDir::new().unwrap();
        let mut config = Config::default();
        config
            .apply_env(env(&[("DB_NAME", "nested/dir/reports.sqlite3")]))
            .unwrap();

        let path = config.db_path_in(base.path()).unwrap();
        assert_eq!(path, base.path().join("nested/dir/reports.sqlite3"));
        assert!(base.path().join("nested/dir").is_dir());
        assert!(!path.exists());
    }
}
