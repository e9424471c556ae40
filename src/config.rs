//! Storefront configuration

use std::path::PathBuf;

use clap::Args;

use crate::{
    cart::{DEFAULT_CART_KEY, FileStore, JsonCartStorage},
    catalog::{Catalog, CatalogError},
};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

/// Where the storefront keeps its cart and which catalog it serves.
#[derive(Debug, Clone, Args)]
pub struct StorefrontConfig {
    /// Directory holding persisted carts
    #[arg(long, env = "FESTOON_STORAGE_DIR", default_value = ".festoon")]
    pub storage_dir: PathBuf,

    /// Storage key the cart is saved under
    #[arg(long, env = "FESTOON_CART_KEY", default_value = DEFAULT_CART_KEY)]
    pub cart_key: String,

    /// Catalog YAML file; the bundled catalog is used when unset
    #[arg(long, env = "FESTOON_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Loads the configured catalog, or the bundled one.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or is invalid.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
    }

    /// File-backed cart storage under the configured directory and key.
    pub fn cart_storage(&self) -> JsonCartStorage<FileStore> {
        JsonCartStorage::with_key(FileStore::new(&self.storage_dir), self.cart_key.clone())
    }
}
