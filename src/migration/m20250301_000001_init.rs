//! Initial schema: categories, suppliers, products, expenses, the shopping
//! list and the category-supplier link table.
//!
//! `shopping_list_items.quantity` starts out as an INTEGER column; later
//! migrations widen and split it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    Icon,
    Color,
}

#[derive(Iden)]
enum Suppliers {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    CategoryId,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    Amount,
    ProductId,
    SupplierId,
    Timestamp,
}

#[derive(Iden)]
enum ShoppingListItems {
    Table,
    Id,
    ProductId,
    Unit,
    Quantity,
    SupplierId,
    ShoppingDate,
}

#[derive(Iden)]
enum CategorySuppliers {
    Table,
    CategoryId,
    SupplierId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::Color).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-name-unique")
                    .table(Categories::Table)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-suppliers-name-unique")
                    .table(Suppliers::Table)
                    .col(Suppliers::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::CategoryId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-name-unique")
                    .table(Products::Table)
                    .col(Products::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::Amount).double().not_null())
                    .col(ColumnDef::new(Expenses::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::SupplierId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Expenses::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-product_id")
                            .from(Expenses::Table, Expenses::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-supplier_id")
                            .from(Expenses::Table, Expenses::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-timestamp")
                    .table(Expenses::Table)
                    .col(Expenses::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShoppingListItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShoppingListItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShoppingListItems::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShoppingListItems::Unit).string())
                    .col(
                        ColumnDef::new(ShoppingListItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(ShoppingListItems::SupplierId).big_integer())
                    .col(
                        ColumnDef::new(ShoppingListItems::ShoppingDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shopping_list_items-product_id")
                            .from(ShoppingListItems::Table, ShoppingListItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shopping_list_items-supplier_id")
                            .from(ShoppingListItems::Table, ShoppingListItems::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CategorySuppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategorySuppliers::CategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategorySuppliers::SupplierId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CategorySuppliers::CategoryId)
                            .col(CategorySuppliers::SupplierId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_suppliers-category_id")
                            .from(CategorySuppliers::Table, CategorySuppliers::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_suppliers-supplier_id")
                            .from(CategorySuppliers::Table, CategorySuppliers::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CategorySuppliers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingListItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}
