use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use utils::assets::asset_dir;

pub const DATABASE_URL_ENV: &str = "BITACORA_DATABASE_URL";
pub const SECRET_ENV: &str = "BITACORA_SECRET";
pub const USERNAME_ENV: &str = "BITACORA_USERNAME";
pub const PASSWORD_ENV: &str = "BITACORA_PASSWORD";
pub const MEDIA_ROOT_ENV: &str = "BITACORA_MEDIA_ROOT";
pub const CORS_ORIGINS_ENV: &str = "BITACORA_CORS_ORIGINS";
pub const EXPORT_DIR_ENV: &str = "BITACORA_EXPORT_DIR";
pub const API_BASE_URL_ENV: &str = "BITACORA_API_BASE_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "BITACORA_REQUEST_TIMEOUT_SECS";
pub const ACCESS_TTL_ENV: &str = "BITACORA_ACCESS_TTL_SECS";
pub const REFRESH_TTL_ENV: &str = "BITACORA_REFRESH_TTL_SECS";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 30;
const DEFAULT_REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Credentials and token lifetimes for the single configured API user.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub username: String,
    pub password: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub media_root: PathBuf,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

/// Configuration for the desktop client, passed into each view component
/// at construction instead of read from module globals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub export_dir: PathBuf,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = require_var(SECRET_ENV)?;
        let username = require_var(USERNAME_ENV)?;
        let password = require_var(PASSWORD_ENV)?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .unwrap_or(8000);

        let database_url = std::env::var(DATABASE_URL_ENV).unwrap_or_else(|_| {
            format!(
                "sqlite://{}?mode=rwc",
                asset_dir().join("db.sqlite").to_string_lossy()
            )
        });

        let media_root = std::env::var(MEDIA_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| asset_dir().join("media"));

        let cors_origins = std::env::var(CORS_ORIGINS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ServerConfig {
            host,
            port,
            database_url,
            media_root,
            cors_origins,
            auth: AuthConfig {
                secret,
                username,
                password,
                access_ttl_secs: read_ttl_secs(ACCESS_TTL_ENV, DEFAULT_ACCESS_TTL_SECS),
                refresh_ttl_secs: read_ttl_secs(REFRESH_TTL_ENV, DEFAULT_REFRESH_TTL_SECS),
            },
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_base_url = std::env::var(API_BASE_URL_ENV)
            .ok()
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let export_dir = std::env::var(EXPORT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| asset_dir().join("exportaciones_markdown"));

        let timeout_secs = std::env::var(REQUEST_TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        ClientConfig {
            api_base_url,
            export_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn read_ttl_secs(name: &str, default: i64) -> i64 {
    let raw = match std::env::var(name) {
        Ok(value) => value,
        Err(_) => return default,
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => value,
        Ok(_) => {
            tracing::warn!("{name} must be positive; using default");
            default
        }
        Err(err) => {
            tracing::warn!(value = raw.trim(), error = %err, "Invalid {name}; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults_are_sensible() {
        // Do not rely on ambient env in CI; only assert the fallback shape.
        let config = ClientConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            export_dir: PathBuf::from("exportaciones_markdown"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        assert!(config.api_base_url.starts_with("http://"));
        assert!(!config.api_base_url.ends_with('/'));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(matches!(
            require_var("BITACORA_TEST_UNSET_VAR"),
            Err(ConfigError::MissingVar(_))
        ));
    }
}
