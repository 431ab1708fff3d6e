//! Domain types, configuration and pure catalog rules shared by the
//! database layer, the HTTP server and the CLI.

pub mod app_config;
pub mod config;
pub mod payload;
pub mod pricing;
pub mod seed;
pub mod slug;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use payload::{BatchField, FormFields, KitInput, ProductInput, VariantSpec};
pub use pricing::{parse_price, passes_price_bounds, PriceBounds};
pub use seed::{load_catalog_seed, CatalogSeed, CategorySeed, CompanySeed};
pub use slug::{slugify, SlugScope};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),
    #[error("invalid seed file: {0}")]
    Validation(String),
}

/// Rejections raised while decoding a write payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("request body must be a JSON object")]
    NotAnObject,
}
