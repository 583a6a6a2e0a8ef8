use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Pool acquire timeout, seconds
    pub connection_timeout: u64,
    /// Replaces the database name in DATABASE_URL
    pub name: Option<String>,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

/// Partial config read from YAML; present keys replace the profile defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    database: Option<FileDatabase>,
    api: Option<FileApi>,
    security: Option<FileSecurity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileDatabase {
    max_connections: Option<u32>,
    connection_timeout: Option<u64>,
    name: Option<String>,
    auto_migrate: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileApi {
    host: Option<String>,
    port: Option<u16>,
    enable_request_logging: Option<bool>,
    max_request_size_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSecurity {
    cors_origins: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::for_environment(Environment::from_env()).with_env_overrides()
    }

    /// Profile defaults, then the YAML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_environment(Environment::from_env());
        if let Some(path) = path {
            config = config.with_file(path)?;
        }
        Ok(config.with_env_overrides())
    }

    fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_file(self, path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        self.with_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    fn with_yaml(mut self, raw: &str) -> Result<Self, serde_yaml::Error> {
        let file: FileConfig = serde_yaml::from_str(raw)?;

        if let Some(db) = file.database {
            self.database.max_connections =
                db.max_connections.unwrap_or(self.database.max_connections);
            self.database.connection_timeout =
                db.connection_timeout.unwrap_or(self.database.connection_timeout);
            self.database.name = db.name.or(self.database.name);
            self.database.auto_migrate = db.auto_migrate.unwrap_or(self.database.auto_migrate);
        }
        if let Some(api) = file.api {
            self.api.host = api.host.unwrap_or(self.api.host);
            self.api.port = api.port.unwrap_or(self.api.port);
            self.api.enable_request_logging =
                api.enable_request_logging.unwrap_or(self.api.enable_request_logging);
            self.api.max_request_size_bytes =
                api.max_request_size_bytes.unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(security) = file.security {
            self.security.cors_origins =
                security.cors_origins.unwrap_or(self.security.cors_origins);
        }

        Ok(self)
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_NAME") {
            self.database.name = Some(v).filter(|name| !name.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }

        // API overrides
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Ok(v) = env::var("CTF_ADMIN_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                name: None,
                auto_migrate: true,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8888,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:8888".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                name: None,
                auto_migrate: true,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8888,
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                name: None,
                auto_migrate: false,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8888,
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://ctf.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - set once at startup, falls back to the environment
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Install the startup config; only the first call wins
pub fn init(config: AppConfig) -> Result<&'static AppConfig, ConfigError> {
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(config_ref())
}

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    config_ref()
}

fn config_ref() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::from_env)
}

#[macro_export]
macro_rules! is_development {
    () => {
        $crate::config::config().environment == $crate::config::Environment::Development
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.auto_migrate);
        assert_eq!(config.api.host, "127.0.0.1");
        assert!(config.api.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.auto_migrate);
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn yaml_overrides_only_present_keys() {
        let config = AppConfig::development()
            .with_yaml(
                "database:\n  name: ctf_test\napi:\n  port: 9000\nsecurity:\n  cors_origins: [\"https://scoreboard.local\"]\n",
            )
            .unwrap();
        assert_eq!(config.database.name.as_deref(), Some("ctf_test"));
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.security.cors_origins, vec!["https://scoreboard.local"]);
    }

    #[test]
    fn empty_yaml_keeps_profile() {
        let config = AppConfig::staging().with_yaml("{}").unwrap();
        assert_eq!(config.database.max_connections, 20);
        assert!(AppConfig::staging().with_yaml("api: [").is_err());
    }
}
