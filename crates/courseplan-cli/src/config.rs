use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use courseplan_store::PostgresOptions;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "courseplan.toml";

/// Environment variable that overrides `database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config encoding error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("no database url: pass --database-url, set {DATABASE_URL_ENV}, or add database_url to the config file")]
    MissingDatabaseUrl,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub log_format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: String,
    /// Append logs here instead of writing them to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let pool = PostgresOptions::default();
        Self {
            database_url: None,
            max_connections: pool.max_connections,
            acquire_timeout_secs: pool.acquire_timeout.as_secs(),
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Pick the connection string: flag, then environment, then file.
    pub fn database_url(&self, flag: Option<&str>) -> ConfigResult<String> {
        let env = std::env::var(DATABASE_URL_ENV).ok();
        resolve_database_url(flag, env.as_deref(), self.database_url.as_deref())
    }

    pub fn postgres_options(&self) -> PostgresOptions {
        PostgresOptions {
            max_connections: self.max_connections.max(1),
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

fn resolve_database_url(
    flag: Option<&str>,
    env: Option<&str>,
    file: Option<&str>,
) -> ConfigResult<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingDatabaseUrl)
}

/// Read settings from `path`, writing the defaults there first if it is missing.
pub fn load_or_create_settings(path: &Path) -> ConfigResult<Settings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        return Ok(settings);
    }

    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let encoded = toml::to_string_pretty(settings)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("courseplan-{}", uuid::Uuid::new_v4()))
            .join(DEFAULT_CONFIG_PATH)
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = toml::from_str("log_format = \"json\"\n").expect("parse");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.acquire_timeout_secs, 10);
        assert_eq!(settings.log_filter, "info");
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn creates_default_file_once() {
        let path = scratch_path();
        let created = load_or_create_settings(&path).expect("create");
        assert_eq!(created, Settings::default());
        assert!(path.exists());

        std::fs::write(&path, "max_connections = 9\n").expect("edit");
        let loaded = load_or_create_settings(&path).expect("load");
        assert_eq!(loaded.max_connections, 9);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(toml::from_str::<Settings>("log_format = \"xml\"\n").is_err());
    }

    #[test]
    fn database_url_precedence() {
        let file = Some("postgres://file/db");
        let env = Some("postgres://env/db");
        assert_eq!(
            resolve_database_url(Some("postgres://flag/db"), env, file).unwrap(),
            "postgres://flag/db"
        );
        assert_eq!(
            resolve_database_url(None, env, file).unwrap(),
            "postgres://env/db"
        );
        assert_eq!(
            resolve_database_url(None, Some("  "), file).unwrap(),
            "postgres://file/db"
        );
        assert!(matches!(
            resolve_database_url(None, None, None),
            Err(ConfigError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn pool_options_follow_settings() {
        let settings = Settings {
            max_connections: 0,
            acquire_timeout_secs: 3,
            ..Settings::default()
        };
        let options = settings.postgres_options();
        assert_eq!(options.max_connections, 1);
        assert_eq!(options.acquire_timeout, Duration::from_secs(3));
    }
}
