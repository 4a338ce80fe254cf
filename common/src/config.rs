// common/src/config.rs
use crate::auth::AuthSettings;
use crate::models::DEFAULT_SESSION_KEY;
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for the dashboard host
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    /// One of trace, debug, info, warn, error
    pub log_level: String,
    pub static_files: StaticFilesConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub path: String,
    pub enable_compression: bool,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age: u32,
    pub immutable: bool,
    pub must_revalidate: bool,
}

impl CacheConfig {
    /// Value for the Cache-Control header on static assets
    pub fn header_value(&self) -> String {
        let mut value = format!("public, max-age={}", self.max_age);
        if self.immutable {
            value.push_str(", immutable");
        }
        if self.must_revalidate {
            value.push_str(", must-revalidate");
        }
        value
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Simulated delay before each credential check
    pub login_latency_ms: u64,
    /// Simulated delay before a password reset request is acknowledged
    pub reset_latency_ms: u64,
    /// Password enrolled for every demo account
    pub demo_password: String,
    pub session_key: String,
    /// JSON file holding the persisted session. Unset keeps it in memory.
    pub storage_path: Option<String>,
}

impl AuthConfig {
    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            login_latency: Duration::from_millis(self.login_latency_ms),
        }
    }

    pub fn reset_latency(&self) -> Duration {
        Duration::from_millis(self.reset_latency_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_attempts: usize,
    pub window_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8081".to_string(),
            log_level: "info".to_string(),
            static_files: StaticFilesConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            enable_compression: true,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: 3600,
            immutable: false,
            must_revalidate: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_latency_ms: 1000,
            reset_latency_ms: 1500,
            demo_password: "password".to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            storage_path: Some("./data/session.json".to_string()),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 60,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // APP__AUTH__LOGIN_LATENCY_MS=0 and friends
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env(|key| env::var(key).ok())
            }
        }
    }

    fn from_plain_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or(defaults.server_addr),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            static_files: StaticFilesConfig {
                path: lookup("STATIC_FILES_PATH").unwrap_or(defaults.static_files.path),
                enable_compression: flag("ENABLE_COMPRESSION", defaults.static_files.enable_compression),
                cache: CacheConfig {
                    max_age: lookup("CACHE_MAX_AGE")
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(defaults.static_files.cache.max_age),
                    immutable: flag("CACHE_IMMUTABLE", defaults.static_files.cache.immutable),
                    must_revalidate: flag("CACHE_MUST_REVALIDATE", defaults.static_files.cache.must_revalidate),
                },
            },
            auth: AuthConfig {
                login_latency_ms: number("LOGIN_LATENCY_MS", defaults.auth.login_latency_ms),
                reset_latency_ms: number("RESET_LATENCY_MS", defaults.auth.reset_latency_ms),
                demo_password: lookup("DEMO_PASSWORD").unwrap_or(defaults.auth.demo_password),
                session_key: lookup("SESSION_KEY").unwrap_or(defaults.auth.session_key),
                storage_path: lookup("SESSION_STORAGE_PATH").or(defaults.auth.storage_path),
            },
            rate_limit: RateLimitConfig {
                max_attempts: number("LOGIN_MAX_ATTEMPTS", defaults.rate_limit.max_attempts as u64) as usize,
                window_seconds: number("LOGIN_WINDOW_SECONDS", defaults.rate_limit.window_seconds),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth.settings().login_latency, Duration::from_millis(1000));
        assert_eq!(config.auth.reset_latency(), Duration::from_millis(1500));
        assert_eq!(config.auth.session_key, "sms_user");
        assert_eq!(config.static_files.cache.header_value(), "public, max-age=3600, must-revalidate");
    }

    #[test]
    fn test_plain_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SERVER_ADDR", "0.0.0.0:9000"),
            ("LOGIN_LATENCY_MS", "0"),
            ("CACHE_IMMUTABLE", "TRUE"),
            ("LOGIN_MAX_ATTEMPTS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_plain_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.server_addr, "0.0.0.0:9000");
        assert_eq!(config.auth.login_latency_ms, 0);
        assert!(config.static_files.cache.immutable);
        assert_eq!(config.rate_limit.max_attempts, 5);
        assert_eq!(config.auth.demo_password, "password");
    }

    #[test]
    fn test_out_of_range_cache_age_keeps_default() {
        let config = Config::from_plain_env(|key| match key {
            "CACHE_MAX_AGE" => Some("4294967296".to_string()),
            _ => None,
        });
        assert_eq!(config.static_files.cache.max_age, 3600);

        let config = Config::from_plain_env(|key| (key == "CACHE_MAX_AGE").then(|| "86400".to_string()));
        assert_eq!(config.static_files.cache.max_age, 86400);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        std::fs::write(&path, "log_level = \"debug\"\n[auth]\nlogin_latency_ms = 250\n").unwrap();

        let config: Config = ConfigFile::builder()
            .add_source(File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.auth.login_latency_ms, 250);
        assert_eq!(config.auth.reset_latency_ms, 1500);
        assert_eq!(config.rate_limit.window_seconds, 60);
    }
}
