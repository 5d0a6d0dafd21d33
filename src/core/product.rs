//! Product business logic.
//!
//! Every product lives in exactly one category. Deletion is guarded the same
//! way categories are: while any expense references the product the delete is
//! refused with a typed error. Shopping list entries for the product are
//! removed by the store's cascade.

use crate::{
    core::InsertOutcome,
    entities::{Expense, Product, category, expense, product},
    errors::{Error, Result},
    observe::Table,
    store::Store,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

/// A product row joined with its category name, for list screens.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ProductWithCategory {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub category_name: String,
}

/// Retrieves all products with their category names, ordered by name.
pub async fn get_all_products(store: &Store) -> Result<Vec<ProductWithCategory>> {
    Product::find()
        .select_only()
        .column(product::Column::Id)
        .column(product::Column::Name)
        .column(product::Column::CategoryId)
        .column_as(category::Column::Name, "category_name")
        .join(JoinType::InnerJoin, product::Relation::Category.def())
        .order_by_asc(product::Column::Name)
        .into_model::<ProductWithCategory>()
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a product by its unique ID.
pub async fn get_product_by_id(store: &Store, id: i64) -> Result<Option<product::Model>> {
    Product::find_by_id(id)
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Finds a product by name (case-sensitive equality).
pub async fn get_product_by_name(store: &Store, name: &str) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Creates a new product in the given category, or reports the existing one
/// with the same name.
pub async fn create_product(
    store: &Store,
    name: &str,
    category_id: i64,
) -> Result<InsertOutcome<product::Model>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    crate::core::category::get_category_by_id(store, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    if let Some(existing) = get_product_by_name(store, name).await? {
        return Ok(InsertOutcome::AlreadyExists(existing));
    }

    let model = product::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(store.connection())
    .await?;

    store.changes().notify(Table::Products);
    Ok(InsertOutcome::Created(model))
}

/// Updates a product's name and category.
pub async fn update_product(
    store: &Store,
    id: i64,
    name: &str,
    category_id: i64,
) -> Result<product::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    let existing = get_product_by_id(store, id)
        .await?
        .ok_or(Error::ProductNotFound { id })?;

    crate::core::category::get_category_by_id(store, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.category_id = Set(category_id);
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::Products);
    Ok(updated)
}

/// Number of expenses recorded against the product.
pub async fn expense_count_for_product(store: &Store, product_id: i64) -> Result<u64> {
    Expense::find()
        .filter(expense::Column::ProductId.eq(product_id))
        .count(store.connection())
        .await
        .map_err(Into::into)
}

/// Deletes a product. Rejected with [`Error::ProductInUse`] while any expense
/// references it.
pub async fn delete_product(store: &Store, id: i64) -> Result<()> {
    let product = get_product_by_id(store, id)
        .await?
        .ok_or(Error::ProductNotFound { id })?;

    let expense_count = expense_count_for_product(store, id).await?;
    if expense_count > 0 {
        return Err(Error::ProductInUse {
            name: product.name,
            expense_count,
        });
    }

    Product::delete_by_id(id).exec(store.connection()).await?;
    store.changes().notify(Table::Products);
    store.changes().notify(Table::ShoppingListItems);
    Ok(())
}
