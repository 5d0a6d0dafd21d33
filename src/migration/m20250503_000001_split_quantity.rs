//! Splits the single `quantity` column into `planned_quantity` and
//! `purchased_quantity`, and adds the nullable `unit_price` used when a
//! purchase is recorded.
//!
//! Pre-existing rows keep their quantity as the planned amount and start with
//! nothing purchased.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE shopping_list_items_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                product_id BIGINT NOT NULL,
                unit TEXT,
                planned_quantity REAL NOT NULL DEFAULT 1,
                purchased_quantity REAL NOT NULL DEFAULT 0,
                unit_price REAL,
                supplier_id BIGINT,
                shopping_date TEXT NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id) ON DELETE CASCADE,
                FOREIGN KEY (supplier_id) REFERENCES suppliers (id) ON DELETE SET NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "INSERT INTO shopping_list_items_new
                (id, product_id, unit, planned_quantity, purchased_quantity,
                 unit_price, supplier_id, shopping_date)
             SELECT id, product_id, unit, quantity, 0, NULL, supplier_id, shopping_date
             FROM shopping_list_items",
        )
        .await?;

        db.execute_unprepared("DROP TABLE shopping_list_items").await?;

        db.execute_unprepared(
            "ALTER TABLE shopping_list_items_new RENAME TO shopping_list_items",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE shopping_list_items_old (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                product_id BIGINT NOT NULL,
                unit TEXT,
                quantity REAL NOT NULL DEFAULT 1,
                supplier_id BIGINT,
                shopping_date TEXT NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id) ON DELETE CASCADE,
                FOREIGN KEY (supplier_id) REFERENCES suppliers (id) ON DELETE SET NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "INSERT INTO shopping_list_items_old
                (id, product_id, unit, quantity, supplier_id, shopping_date)
             SELECT id, product_id, unit, planned_quantity, supplier_id, shopping_date
             FROM shopping_list_items",
        )
        .await?;

        db.execute_unprepared("DROP TABLE shopping_list_items").await?;

        db.execute_unprepared(
            "ALTER TABLE shopping_list_items_old RENAME TO shopping_list_items",
        )
        .await?;

        Ok(())
    }
}
