//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.

use chrono::Duration;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::session::SessionConfig;

/// Configuration file read from the working directory
pub const CONFIG_FILE: &str = "config.toml";

// ==================== Database Configuration ====================

/// Default SQLite database path
pub const DEFAULT_DATABASE_PATH: &str = "db/deeds.db";

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

// ==================== Session Configuration ====================

/// Idle minutes after which a session expires
pub const SESSION_MAX_IDLE_MINUTES: i64 = 15;

/// Largest accepted idle window, in minutes (one week)
pub const SESSION_MAX_IDLE_MINUTES_LIMIT: i64 = 7 * 24 * 60;

/// Session lookups between sweeps of expired sessions
pub const SESSION_CLEANUP_PERIOD: u32 = 10;

/// Max-Age of the session cookie in hours
pub const SESSION_COOKIE_MAX_AGE_HOURS: i64 = 24;

// ==================== Auth Configuration ====================

/// Shared password used when none is configured
pub const DEFAULT_PASSWORD: &str = "changeme";

/// Structure of config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    server: Option<ServerSection>,
    auth: Option<AuthSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionSection {
    max_idle_minutes: Option<i64>,
    cleanup_period: Option<u32>,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub port: u16,
    pub password: String,
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from config.toml, .env and the process environment
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = read_config_file(Path::new(CONFIG_FILE));
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = match file.database.and_then(|db| db.path) {
            Some(path) => {
                tracing::info!("Using database from {}: {}", CONFIG_FILE, path);
                PathBuf::from(path)
            }
            None => match env("DATABASE_PATH") {
                Some(path) => {
                    tracing::info!("Using database from DATABASE_PATH env: {}", path);
                    PathBuf::from(path)
                }
                None => PathBuf::from(DEFAULT_DATABASE_PATH),
            },
        };

        let port = file
            .server
            .and_then(|server| server.port)
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(SERVER_PORT);

        let password = file
            .auth
            .and_then(|auth| auth.password)
            .or_else(|| env("DEEDS_PASSWORD"))
            .unwrap_or_else(|| {
                tracing::warn!("No password configured, using the built-in default");
                DEFAULT_PASSWORD.to_string()
            });

        let mut session = SessionConfig::default();
        let session_file = file.session.unwrap_or_default();
        if let Some(minutes) = session_file.max_idle_minutes {
            match max_idle(minutes) {
                Some(max_idle) => session.max_idle = max_idle,
                None => tracing::warn!(
                    "Ignoring session max_idle_minutes = {} (allowed 1..={}), using {}",
                    minutes,
                    SESSION_MAX_IDLE_MINUTES_LIMIT,
                    SESSION_MAX_IDLE_MINUTES
                ),
            }
        }
        if let Some(period) = session_file.cleanup_period {
            session.cleanup_period = period;
        }

        Self {
            database_path,
            port,
            password,
            session,
        }
    }

    /// Full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

fn max_idle(minutes: i64) -> Option<Duration> {
    if (1..=SESSION_MAX_IDLE_MINUTES_LIMIT).contains(&minutes) {
        Duration::try_minutes(minutes)
    } else {
        None
    }
}

fn read_config_file(path: &Path) -> FileConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return FileConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(FileConfig::default(), env_of(&[]));
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.port, SERVER_PORT);
        assert_eq!(config.password, DEFAULT_PASSWORD);
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let env = env_of(&[
            ("DATABASE_PATH", "/tmp/x.db"),
            ("PORT", "8080"),
            ("DEEDS_PASSWORD", "secret"),
        ]);
        let config = Config::resolve(FileConfig::default(), env);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_file_overrides_env() {
        let file: FileConfig = toml::from_str(
            r#"
            [database]
            path = "data/mine.db"

            [server]
            port = 9000

            [auth]
            password = "from-file"

            [session]
            max_idle_minutes = 30
            cleanup_period = 5
            "#,
        )
        .unwrap();
        let env = env_of(&[("DATABASE_PATH", "/tmp/x.db"), ("DEEDS_PASSWORD", "secret")]);
        let config = Config::resolve(file, env);
        assert_eq!(config.database_path, PathBuf::from("data/mine.db"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.password, "from-file");
        assert_eq!(config.session.max_idle, Duration::minutes(30));
        assert_eq!(config.session.cleanup_period, 5);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::resolve(FileConfig::default(), env_of(&[("PORT", "eighty")]));
        assert_eq!(config.port, SERVER_PORT);
    }

    fn with_max_idle(minutes: i64) -> FileConfig {
        FileConfig {
            session: Some(SessionSection {
                max_idle_minutes: Some(minutes),
                cleanup_period: None,
            }),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_out_of_range_max_idle_falls_back() {
        let default = SessionConfig::default().max_idle;
        let out_of_range = [
            0,
            -5,
            SESSION_MAX_IDLE_MINUTES_LIMIT + 1,
            200_000_000_000,
            i64::MAX,
            i64::MIN,
        ];
        for minutes in out_of_range {
            let config = Config::resolve(with_max_idle(minutes), env_of(&[]));
            assert_eq!(config.session.max_idle, default, "max_idle_minutes = {}", minutes);
        }
    }

    #[test]
    fn test_max_idle_limit_is_accepted() {
        let config = Config::resolve(with_max_idle(SESSION_MAX_IDLE_MINUTES_LIMIT), env_of(&[]));
        assert_eq!(config.session.max_idle, Duration::weeks(1));

        let store = crate::session::SessionStore::new(config.session);
        assert_eq!(store.expire(), 0);
    }
}
