//! Supplier business logic.
//!
//! Suppliers have two distinct deletion paths: the default one is guarded and
//! refuses while expenses reference the supplier, and an explicit cascading
//! one removes the supplier together with all of its expenses. The cascade is
//! never implicit; the caller chooses it.

use crate::{
    core::InsertOutcome,
    entities::{Expense, Supplier, expense, supplier},
    errors::{Error, Result},
    observe::Table,
    store::Store,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

/// Retrieves all suppliers ordered alphabetically by name.
pub async fn get_all_suppliers(store: &Store) -> Result<Vec<supplier::Model>> {
    Supplier::find()
        .order_by_asc(supplier::Column::Name)
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a supplier by its unique ID.
pub async fn get_supplier_by_id(store: &Store, id: i64) -> Result<Option<supplier::Model>> {
    Supplier::find_by_id(id)
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a supplier by name (case-sensitive equality).
pub async fn get_supplier_by_name(store: &Store, name: &str) -> Result<Option<supplier::Model>> {
    Supplier::find()
        .filter(supplier::Column::Name.eq(name))
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Creates a new supplier, or reports the existing one with the same name.
/// Used directly by the inline "new supplier" flow on the expense form.
pub async fn create_supplier(store: &Store, name: &str) -> Result<InsertOutcome<supplier::Model>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Supplier name cannot be empty".to_string(),
        });
    }

    if let Some(existing) = get_supplier_by_name(store, name).await? {
        return Ok(InsertOutcome::AlreadyExists(existing));
    }

    let model = supplier::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(store.connection())
    .await?;

    store.changes().notify(Table::Suppliers);
    Ok(InsertOutcome::Created(model))
}

/// Renames a supplier.
pub async fn update_supplier(store: &Store, id: i64, name: &str) -> Result<supplier::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Supplier name cannot be empty".to_string(),
        });
    }

    let existing = get_supplier_by_id(store, id)
        .await?
        .ok_or(Error::SupplierNotFound { id })?;

    let mut active: supplier::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::Suppliers);
    Ok(updated)
}

/// Number of expenses recorded against the supplier.
pub async fn expense_count_for_supplier(store: &Store, supplier_id: i64) -> Result<u64> {
    Expense::find()
        .filter(expense::Column::SupplierId.eq(supplier_id))
        .count(store.connection())
        .await
        .map_err(Into::into)
}

/// Deletes a supplier the default way: rejected with [`Error::SupplierInUse`]
/// while any expense references it. Shopping list items pointing at the
/// supplier are detached (nulled) by the store.
pub async fn delete_supplier(store: &Store, id: i64) -> Result<()> {
    let supplier = get_supplier_by_id(store, id)
        .await?
        .ok_or(Error::SupplierNotFound { id })?;

    let expense_count = expense_count_for_supplier(store, id).await?;
    if expense_count > 0 {
        return Err(Error::SupplierInUse {
            name: supplier.name,
            expense_count,
        });
    }

    Supplier::delete_by_id(id).exec(store.connection()).await?;
    store.changes().notify(Table::Suppliers);
    store.changes().notify(Table::ShoppingListItems);
    store.changes().notify(Table::CategorySuppliers);
    Ok(())
}

/// Deletes a supplier together with every expense recorded against it.
/// The two deletes commit atomically.
pub async fn delete_supplier_cascading(store: &Store, id: i64) -> Result<()> {
    let supplier = get_supplier_by_id(store, id)
        .await?
        .ok_or(Error::SupplierNotFound { id })?;

    let txn = store.connection().begin().await?;

    let deleted = Expense::delete_many()
        .filter(expense::Column::SupplierId.eq(id))
        .exec(&txn)
        .await?;
    Supplier::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted supplier '{}' and {} dependent expenses",
        supplier.name, deleted.rows_affected
    );
    store.changes().notify(Table::Expenses);
    store.changes().notify(Table::Suppliers);
    store.changes().notify(Table::ShoppingListItems);
    store.changes().notify(Table::CategorySuppliers);
    Ok(())
}
