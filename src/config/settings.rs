//! TOML-based configuration for scimql.
//!
//! Supports a config file (scimql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [query]
//! dialect = "postgres"   # postgres | mysql | sqlite | tsql
//! default_count = 100
//! max_results = 1000
//!
//! [database]
//! path = "${SCIMQL_DB}"
//!
//! [catalog]
//! path = "./catalog.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub query: QuerySettings,
    pub database: DatabaseSettings,
    pub catalog: CatalogSettings,
}

/// Query generation and paging limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// SQL dialect for rendered statements.
    pub dialect: Dialect,

    /// Page size when the request has no `count`.
    pub default_count: u64,

    /// Upper bound for `count` (SCIM `filter.maxResults`).
    pub max_results: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            default_count: 100,
            max_results: 1000,
        }
    }
}

impl QuerySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_results == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.max_results must be at least 1".into(),
            ));
        }
        if self.default_count > self.max_results {
            return Err(SettingsError::InvalidConfig(format!(
                "query.default_count ({}) exceeds query.max_results ({})",
                self.default_count, self.max_results
            )));
        }
        Ok(())
    }
}

/// Database used by the CLI `query` command.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl DatabaseSettings {
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Resource catalog override.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// TOML catalog replacing the built-in Keycloak mappings.
    pub path: Option<String>,
}

impl CatalogSettings {
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.query.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCIMQL_CONFIG`
    /// 2. `./scimql.toml`
    /// 3. `~/.config/scimql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCIMQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("scimql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scimql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
