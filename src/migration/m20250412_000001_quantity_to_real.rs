//! Widens `shopping_list_items.quantity` from INTEGER to REAL so fractional
//! quantities (1.5 kg) can be planned.
//!
//! SQLite cannot change a column's type, so the table is rebuilt and the rows
//! copied across.

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
                quantity REAL NOT NULL DEFAULT 1,
                supplier_id BIGINT,
                shopping_date TEXT NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id) ON DELETE CASCADE,
                FOREIGN KEY (supplier_id) REFERENCES suppliers (id) ON DELETE SET NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "INSERT INTO shopping_list_items_new
                (id, product_id, unit, quantity, supplier_id, shopping_date)
             SELECT id, product_id, unit, CAST(quantity AS REAL), supplier_id, shopping_date
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
                quantity INTEGER NOT NULL DEFAULT 1,
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
             SELECT id, product_id, unit, CAST(quantity AS INTEGER), supplier_id, shopping_date
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
