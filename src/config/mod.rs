/// Default category seed list and its optional config.toml override
pub mod categories;

/// User preferences persisted as a small TOML key-value file
pub mod preferences;
