//! The application root.
//!
//! Owns the store handle and the preferences for the whole process lifetime
//! and hands them to the sessions; nothing below this level locates state
//! through a global.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::categories::{default_seed, load_seed_config};
use crate::config::preferences::Preferences;
use crate::errors::Result;
use crate::session::expenses::ExpenseFilterSession;
use crate::session::shopping::ShoppingTripSession;
use crate::store::Store;

const DB_FILE: &str = "spendtrack.sqlite";
const PREFERENCES_FILE: &str = "preferences.toml";
const SEED_FILE: &str = "config.toml";

/// The wired-up application: store, preferences, session factories.
pub struct App {
    store: Arc<Store>,
    preferences: Preferences,
    preferences_path: Option<PathBuf>,
}

impl App {
    /// Opens (or creates) the application state under `data_dir`: loads the
    /// preferences, opens and migrates the database, and seeds the default
    /// categories on first run.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let preferences_path = data_dir.join(PREFERENCES_FILE);
        let preferences = Preferences::load(&preferences_path)?;

        let db_path = data_dir.join(DB_FILE);
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let store = Store::open(&url).await?;

        let seed_path = data_dir.join(SEED_FILE);
        let seeds = if seed_path.exists() {
            load_seed_config(&seed_path)?.categories
        } else {
            default_seed()
        };
        store.seed_categories(&seeds).await?;

        info!("Application opened at {}", data_dir.display());
        Ok(Self {
            store: Arc::new(store),
            preferences,
            preferences_path: Some(preferences_path),
        })
    }

    /// A fully in-memory application with default preferences. Nothing is
    /// persisted; used by tests and previews.
    pub async fn open_in_memory() -> Result<Self> {
        let store = Store::open_in_memory().await?;
        store.seed_categories(&default_seed()).await?;
        Ok(Self {
            store: Arc::new(store),
            preferences: Preferences::default(),
            preferences_path: None,
        })
    }

    /// A clone of the shared store handle.
    #[must_use]
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// The current preferences.
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Applies a change to the preferences and persists them.
    pub fn update_preferences(&mut self, update: impl FnOnce(&mut Preferences)) -> Result<()> {
        update(&mut self.preferences);
        if let Some(path) = &self.preferences_path {
            self.preferences.save(path)?;
        }
        Ok(())
    }

    /// Starts an expense filter session with the persisted default preset.
    #[must_use]
    pub fn expenses(&self) -> ExpenseFilterSession {
        ExpenseFilterSession::with_preferences(self.store(), &self.preferences)
    }

    /// Starts a shopping trip session.
    #[must_use]
    pub fn shopping(&self) -> ShoppingTripSession {
        ShoppingTripSession::new(self.store())
    }
}
