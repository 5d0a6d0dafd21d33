//! The store handle owning the database connection and the change stream.
//!
//! The handle is constructed once by the application root and passed down to
//! repositories and sessions by reference (or inside an `Arc`); nothing in
//! the crate reaches for a global.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::config::categories::CategorySeed;
use crate::entities::{Category, category};
use crate::errors::Result;
use crate::migration::{Migrator, MigratorTrait};
use crate::observe::{ChangeNotifier, Table};

/// Handle to the local relational store.
#[derive(Debug)]
pub struct Store {
    db: DatabaseConnection,
    changes: ChangeNotifier,
}

impl Store {
    /// Opens (creating if necessary) the database at `url` and brings the
    /// schema up to date.
    #[instrument]
    pub async fn open(url: &str) -> Result<Self> {
        debug!("Opening database connection to: {url}");
        let mut options = ConnectOptions::new(url.to_owned());
        // A single connection: SQLite serializes writers anyway, and the
        // foreign-key pragma below is per-connection.
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await?;

        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        info!("Database connection opened. Running migrations...");
        Migrator::up(&db, None).await?;

        Ok(Self {
            db,
            changes: ChangeNotifier::new(),
        })
    }

    /// Opens a fresh in-memory store. Used by tests and throwaway sessions.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open("sqlite::memory:").await
    }

    /// The underlying SeaORM connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The store's change stream.
    pub fn changes(&self) -> &ChangeNotifier {
        &self.changes
    }

    /// First-run seeding: inserts every seed category whose name is not
    /// already present. Existing categories are left untouched, so calling
    /// this on every startup is safe. Returns the number of rows inserted.
    #[instrument(skip(self, seeds))]
    pub async fn seed_categories(&self, seeds: &[CategorySeed]) -> Result<usize> {
        let txn = self.db.begin().await?;
        let mut inserted = 0;

        for seed in seeds {
            let existing = Category::find()
                .filter(category::Column::Name.eq(seed.name.as_str()))
                .one(&txn)
                .await?;
            if existing.is_some() {
                debug!("Category '{}' already present, skipping", seed.name);
                continue;
            }

            category::ActiveModel {
                name: Set(seed.name.clone()),
                icon: Set(seed.icon.clone()),
                color: Set(seed.color.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }

        txn.commit().await?;

        if inserted > 0 {
            info!("Seeded {inserted} default categories");
            self.changes.notify(Table::Categories);
        }
        Ok(inserted)
    }
}
