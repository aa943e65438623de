//! Shared domain types and configuration for hotelcheck.
//!
//! Holds the hotel catalog (hotels and their reviews) and the environment-driven
//! [`AppConfig`] consumed by the analysis crate, the server, and the CLI.

pub mod app_config;
pub mod catalog;
pub mod config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, Catalog, CatalogFile, Hotel, Review};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
