use std::path::Path;

use groundwork_common::{Error, Result};
use tracing::info;

use crate::model::{AppConfig, Environment};

/// Loads an `AppConfig` from defaults, an optional config file, and
/// environment variable overrides, in that order.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration. `path` may point at a YAML or TOML file; when it
    /// is `None` the built-in defaults are used. Environment variables
    /// (`DATABASE_URL`, `PORT`, `FRONTEND_URL`, `GROUNDWORK_ENV`) win over
    /// both.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => AppConfig::default(),
        };
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file, dispatching on its extension.
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display())))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display())))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Apply environment overrides through a lookup function so tests don't have
/// to mutate the process environment.
fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(port) = lookup("PORT") {
        config.gateway.port = port
            .parse()
            .map_err(|_| Error::Config(format!("PORT is not a valid port number: {port}")))?;
    }
    if let Some(url) = lookup("FRONTEND_URL") {
        config.gateway.frontend_url = url;
    }
    if let Some(mode) = lookup("GROUNDWORK_ENV") {
        config.environment = Environment::parse(&mode);
    }
    Ok(())
}
