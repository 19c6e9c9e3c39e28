//! Server configuration loading from file and environment variables.
//!
//! All three backends share one configuration shape; each binary passes
//! its own [`AppDefaults`] (port, database file, env prefix) so the
//! services can run side by side on one host without colliding.

use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Per-binary defaults and environment namespace.
#[derive(Debug, Clone, Copy)]
pub struct AppDefaults {
    /// Port to listen on when neither file nor env specifies one.
    pub port: u16,
    /// Default SQLite database file.
    pub db_path: &'static str,
    /// Environment variable prefix, e.g. `MEDLEY_TRIVIA`.
    pub env_prefix: &'static str,
}

/// Defaults for the venues backend.
pub const VENUES_DEFAULTS: AppDefaults = AppDefaults {
    port: 5000,
    db_path: "venues.db",
    env_prefix: "MEDLEY_VENUES",
};

/// Defaults for the trivia backend.
pub const TRIVIA_DEFAULTS: AppDefaults = AppDefaults {
    port: 5100,
    db_path: "trivia.db",
    env_prefix: "MEDLEY_TRIVIA",
};

/// Defaults for the menu backend.
pub const MENU_DEFAULTS: AppDefaults = AppDefaults {
    port: 5200,
    db_path: "menu.db",
    env_prefix: "MEDLEY_MENU",
};

/// Top-level resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "medley_server=debug,info").
    pub level: String,
    /// Whether to output logs in JSON format.
    pub json: bool,
}

/// Token verification configuration (used by the menu backend).
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Signing keys: key id -> hex-encoded secret.
    pub keys: HashMap<String, String>,
    /// Expiry leeway in seconds.
    pub leeway_secs: u64,
}

/// The raw TOML shape: everything optional, resolved against
/// [`AppDefaults`] after parsing.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: FileServerConfig,
    #[serde(default)]
    database: FileDatabaseConfig,
    #[serde(default)]
    logging: FileLoggingConfig,
    #[serde(default)]
    auth: FileAuthConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileServerConfig {
    host: Option<IpAddr>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct FileDatabaseConfig {
    path: Option<String>,
    busy_timeout_ms: Option<u64>,
    pool_max_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLoggingConfig {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileAuthConfig {
    #[serde(default)]
    keys: HashMap<String, String>,
    leeway_secs: Option<u64>,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to `defaults`.
///
/// Environment variable overrides, namespaced by `defaults.env_prefix`
/// (shown here for `MEDLEY_TRIVIA`):
/// - `MEDLEY_TRIVIA_HOST` overrides `server.host`
/// - `MEDLEY_TRIVIA_PORT` overrides `server.port`
/// - `MEDLEY_TRIVIA_DB_PATH` overrides `database.path`
/// - `MEDLEY_TRIVIA_LOG_LEVEL` overrides `logging.level`
/// - `MEDLEY_TRIVIA_LOG_JSON` overrides `logging.json` ("true"/"1")
/// - `MEDLEY_TRIVIA_AUTH_KEY` adds a signing key, formatted `kid:hexsecret`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>, defaults: &AppDefaults) -> Result<Config, ConfigError> {
    let file: FileConfig = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                FileConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => FileConfig::default(),
    };

    let mut config = Config {
        server: ServerConfig {
            host: file
                .server
                .host
                .unwrap_or(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: file.server.port.unwrap_or(defaults.port),
        },
        database: DatabaseConfig {
            path: file
                .database
                .path
                .unwrap_or_else(|| defaults.db_path.to_string()),
            busy_timeout_ms: file.database.busy_timeout_ms.unwrap_or(5_000),
            pool_max_size: file.database.pool_max_size.unwrap_or(8),
        },
        logging: LoggingConfig {
            level: file.logging.level.unwrap_or_else(|| "info".to_string()),
            json: file.logging.json.unwrap_or(false),
        },
        auth: AuthConfig {
            keys: file.auth.keys,
            leeway_secs: file
                .auth
                .leeway_secs
                .unwrap_or(medley_auth::DEFAULT_LEEWAY_SECS),
        },
    };

    apply_env_overrides(&mut config, defaults.env_prefix);
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, prefix: &str) {
    if let Ok(host) = std::env::var(format!("{prefix}_HOST")) {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var(format!("{prefix}_PORT")) {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var(format!("{prefix}_DB_PATH")) {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var(format!("{prefix}_LOG_LEVEL")) {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var(format!("{prefix}_LOG_JSON")) {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(key) = std::env::var(format!("{prefix}_AUTH_KEY")) {
        if let Some((kid, secret)) = key.split_once(':') {
            config
                .auth
                .keys
                .insert(kid.to_string(), secret.to_string());
        } else {
            tracing::warn!("{prefix}_AUTH_KEY is not in kid:hexsecret form, ignoring");
        }
    }
}
