//! Category business logic - Handles all category-related operations.
//!
//! Provides functions for creating, retrieving, updating, and deleting
//! categories. Deletion is guarded: a category that still has products must
//! be emptied (or its products reassigned) first.

use crate::{
    core::InsertOutcome,
    entities::{Category, Product, category, product},
    errors::{Error, Result},
    observe::Table,
    store::Store,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

/// Retrieves all categories ordered alphabetically by name.
pub async fn get_all_categories(store: &Store) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a category by its unique ID.
pub async fn get_category_by_id(store: &Store, id: i64) -> Result<Option<category::Model>> {
    Category::find_by_id(id)
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a category by name. The lookup is a case-sensitive equality match,
/// which is what the find-or-create call sites rely on.
pub async fn get_category_by_name(store: &Store, name: &str) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Name.eq(name))
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Creates a new category, or reports the existing one with the same name.
pub async fn create_category(
    store: &Store,
    name: &str,
    icon: Option<String>,
    color: Option<String>,
) -> Result<InsertOutcome<category::Model>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }

    if let Some(existing) = get_category_by_name(store, name).await? {
        return Ok(InsertOutcome::AlreadyExists(existing));
    }

    let model = category::ActiveModel {
        name: Set(name.to_string()),
        icon: Set(icon),
        color: Set(color),
        ..Default::default()
    }
    .insert(store.connection())
    .await?;

    store.changes().notify(Table::Categories);
    Ok(InsertOutcome::Created(model))
}

/// Updates a category's name and presentation tags.
pub async fn update_category(
    store: &Store,
    id: i64,
    name: &str,
    icon: Option<String>,
    color: Option<String>,
) -> Result<category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let existing = get_category_by_id(store, id)
        .await?
        .ok_or(Error::CategoryNotFound { id })?;

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.icon = Set(icon);
    active.color = Set(color);
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::Categories);
    Ok(updated)
}

/// Number of products currently assigned to the category.
pub async fn product_count_in_category(store: &Store, category_id: i64) -> Result<u64> {
    Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .count(store.connection())
        .await
        .map_err(Into::into)
}

/// Deletes a category.
///
/// Rejected with [`Error::CategoryInUse`] while any product references it;
/// callers surface that as a warning instead of attempting the delete. Link
/// rows in the category-supplier table are removed by the store's cascade.
pub async fn delete_category(store: &Store, id: i64) -> Result<()> {
    let category = get_category_by_id(store, id)
        .await?
        .ok_or(Error::CategoryNotFound { id })?;

    let product_count = product_count_in_category(store, id).await?;
    if product_count > 0 {
        return Err(Error::CategoryInUse {
            name: category.name,
            product_count,
        });
    }

    Category::delete_by_id(id).exec(store.connection()).await?;
    store.changes().notify(Table::Categories);
    store.changes().notify(Table::CategorySuppliers);
    Ok(())
}
