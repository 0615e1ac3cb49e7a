//! Configuration module for scimql.
//!
//! Handles query limits, the CLI database location and catalog overrides.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, DatabaseSettings, QuerySettings, Settings, SettingsError,
};
