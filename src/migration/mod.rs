//! Embedded schema migrator.
//!
//! Migrations are versioned and forward-only. SQLite cannot alter a column's
//! type in place, so the two `shopping_list_items` column rewrites are done
//! as create-copy-drop-rename table rebuilds.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_init;
mod m20250412_000001_quantity_to_real;
mod m20250503_000001_split_quantity;

/// Applies all pending migrations in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_init::Migration),
            Box::new(m20250412_000001_quantity_to_real::Migration),
            Box::new(m20250503_000001_split_quantity::Migration),
        ]
    }
}
