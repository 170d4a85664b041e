use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub persons: PersonsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_per_page: u32,
    /// Upper bound for client supplied `per_page`. `None` disables the cap.
    pub max_per_page: Option<u32>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub bootstrap_schema: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonsConfig {
    /// Reply to a failed single delete with the success wording (HTTP 500 either way).
    pub legacy_delete_failure_message: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        }
    }

    /// Per-field overrides. Unparseable values keep the preset.
    fn with_env_overrides(mut self) -> Self {
        env_override("CRM_API_HOST", &mut self.server.host);
        env_override("PORT", &mut self.server.port);
        env_override("CRM_API_PORT", &mut self.server.port);

        env_override("PAGINATION_DEFAULT_PER_PAGE", &mut self.pagination.default_per_page);
        if let Ok(v) = env::var("PAGINATION_MAX_PER_PAGE") {
            // "none" (or any non-number) lifts the cap
            self.pagination.max_per_page = v.parse().ok();
        }
        env_override("PAGINATION_DEBUG_LOGGING", &mut self.pagination.debug_logging);

        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        env_override("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        env_override("DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        env_override("DATABASE_ENABLE_QUERY_LOGGING", &mut self.database.enable_query_logging);
        env_override("DATABASE_BOOTSTRAP_SCHEMA", &mut self.database.bootstrap_schema);

        env_override("SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        env_override("JWT_SECRET", &mut self.security.jwt_secret);
        env_override("SECURITY_JWT_EXPIRY_HOURS", &mut self.security.jwt_expiry_hours);
        env_override("SECURITY_ENABLE_AUDIT_LOGGING", &mut self.security.enable_audit_logging);

        env_override(
            "PERSONS_LEGACY_DELETE_FAILURE_MESSAGE",
            &mut self.persons.legacy_delete_failure_message,
        );

        self
    }

    /// Local defaults: permissive paging, query logging, schema bootstrap and
    /// a fixed JWT secret.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            pagination: PaginationConfig {
                default_per_page: 15,
                max_per_page: Some(1000),
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                bootstrap_schema: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7,
                enable_audit_logging: true,
            },
            persons: PersonsConfig {
                legacy_delete_failure_message: false,
            },
        }
    }

    /// Deployed presets start without a JWT secret; the server refuses to start until one is set.
    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.pagination.max_per_page = Some(500);
        config.pagination.debug_logging = false;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.database.bootstrap_schema = false;
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.server.port = 8080;
        config.pagination.max_per_page = Some(100);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.enable_query_logging = false;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.jwt_expiry_hours = 4;
        config
    }
}

fn env_override<T: FromStr>(key: &str, slot: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.parse().ok()) {
        *slot = value;
    }
}

impl PaginationConfig {
    /// Resolve a client supplied page size against the default and the cap.
    pub fn resolve_per_page(&self, requested: Option<u32>) -> u32 {
        let requested = match requested {
            Some(0) | None => self.default_per_page,
            Some(n) => n,
        };
        match self.max_per_page {
            Some(max) if requested > max => {
                if self.debug_logging {
                    tracing::warn!("per_page {} exceeds max {}, capping to max", requested, max);
                }
                max
            }
            _ => requested,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.default_per_page, 15);
        assert_eq!(config.pagination.max_per_page, Some(1000));
        assert!(!config.persons.legacy_delete_failure_message);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.pagination.max_per_page, Some(100));
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn staging_sits_between_presets() {
        let config = AppConfig::for_environment(Environment::Staging);
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.pagination.max_per_page, Some(500));
        assert!(!config.database.bootstrap_schema);
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn per_page_defaults_and_caps() {
        let pagination = AppConfig::production().pagination;
        assert_eq!(pagination.resolve_per_page(None), 15);
        assert_eq!(pagination.resolve_per_page(Some(0)), 15);
        assert_eq!(pagination.resolve_per_page(Some(40)), 40);
        assert_eq!(pagination.resolve_per_page(Some(5000)), 100);
    }

    #[test]
    fn per_page_uncapped_when_max_disabled() {
        let mut pagination = AppConfig::development().pagination;
        pagination.max_per_page = None;
        assert_eq!(pagination.resolve_per_page(Some(5000)), 5000);
    }
}
