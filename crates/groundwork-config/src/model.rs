use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime mode. Development relaxes CORS and enriches error responses;
/// Production does neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse an environment-variable value, treating anything that is not
    /// explicitly production as development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS. In development any localhost origin is
    /// additionally accepted.
    pub frontend_url: String,
    /// Directory served under `/uploads`.
    pub uploads_dir: PathBuf,
    pub body_limit_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long to wait for a pooled connection before giving up.
    pub acquire_timeout_secs: u64,
    /// Per-statement timeout applied inside the migration transaction.
    /// Unset means statements may run indefinitely.
    pub statement_timeout_ms: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/groundwork".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            statement_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory scanned (non-recursively) for `.sql` migration scripts.
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("migrations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development_localhost() {
        let config = AppConfig::default();
        assert!(config.environment.is_development());
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.frontend_url, "http://localhost:3000");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.migrations.dir, PathBuf::from("migrations"));
        assert!(config.database.statement_timeout_ms.is_none());
    }

    #[test]
    fn environment_parse_accepts_common_spellings() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_sections() {
        let config: AppConfig = serde_yaml::from_str("gateway:\n  port: 9000\n").unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.database.url, "postgres://localhost/groundwork");
    }
}
