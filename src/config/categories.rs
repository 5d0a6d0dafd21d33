//! Default category seeds, with an optional `config.toml` override.
//!
//! On first run the store is seeded with a fixed list of category names. A
//! deployment can replace that list by shipping a `config.toml` next to the
//! database with `[[categories]]` entries.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Category names seeded on first run when no config file overrides them.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Groceries",
    "Household",
    "Transport",
    "Health",
    "Leisure",
    "Clothing",
    "Other",
];

/// Configuration structure representing the seed portion of config.toml
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// List of category seeds to insert on first run
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// A single category to seed
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Name of the category
    pub name: String,
    /// Optional icon tag
    #[serde(default)]
    pub icon: Option<String>,
    /// Optional color tag
    #[serde(default)]
    pub color: Option<String>,
}

/// The built-in seed list as `CategorySeed`s (no icon or color tags).
#[must_use]
pub fn default_seed() -> Vec<CategorySeed> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|name| CategorySeed {
            name: (*name).to_string(),
            icon: None,
            color: None,
        })
        .collect()
}

/// Loads category seeds from a TOML file.
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or parsed.
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}
