//! Category-supplier association.
//!
//! The link set for one side is always replaced wholesale: callers pass the
//! complete desired set of ids, and the old rows are deleted and the new ones
//! inserted inside a single transaction. There is no diffing or merging.

use std::collections::BTreeSet;

use crate::{
    entities::{CategorySupplier, Supplier, category, category_supplier, supplier},
    errors::{Error, Result},
    observe::Table,
    store::Store,
};
use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// The suppliers linked to a category, ordered by name.
pub async fn suppliers_for_category(
    store: &Store,
    category_id: i64,
) -> Result<Vec<supplier::Model>> {
    let category = crate::core::category::get_category_by_id(store, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    category
        .find_related(Supplier)
        .order_by_asc(supplier::Column::Name)
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// The categories linked to a supplier, ordered by name.
pub async fn categories_for_supplier(
    store: &Store,
    supplier_id: i64,
) -> Result<Vec<category::Model>> {
    let supplier = crate::core::supplier::get_supplier_by_id(store, supplier_id)
        .await?
        .ok_or(Error::SupplierNotFound { id: supplier_id })?;

    supplier
        .find_related(crate::entities::Category)
        .order_by_asc(category::Column::Name)
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Replaces the full set of suppliers linked to a category.
pub async fn replace_suppliers_for_category(
    store: &Store,
    category_id: i64,
    supplier_ids: &[i64],
) -> Result<()> {
    crate::core::category::get_category_by_id(store, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    // Duplicate ids in the input would collide on the composite key.
    let supplier_ids: BTreeSet<i64> = supplier_ids.iter().copied().collect();
    for &supplier_id in &supplier_ids {
        crate::core::supplier::get_supplier_by_id(store, supplier_id)
            .await?
            .ok_or(Error::SupplierNotFound { id: supplier_id })?;
    }

    let txn = store.connection().begin().await?;

    CategorySupplier::delete_many()
        .filter(category_supplier::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;

    if !supplier_ids.is_empty() {
        let rows = supplier_ids.iter().map(|&supplier_id| {
            category_supplier::ActiveModel {
                category_id: Set(category_id),
                supplier_id: Set(supplier_id),
            }
        });
        // exec_without_returning: the composite key has no rowid to fetch.
        CategorySupplier::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    store.changes().notify(Table::CategorySuppliers);
    Ok(())
}

/// Replaces the full set of categories linked to a supplier.
pub async fn replace_categories_for_supplier(
    store: &Store,
    supplier_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    crate::core::supplier::get_supplier_by_id(store, supplier_id)
        .await?
        .ok_or(Error::SupplierNotFound { id: supplier_id })?;

    let category_ids: BTreeSet<i64> = category_ids.iter().copied().collect();
    for &category_id in &category_ids {
        crate::core::category::get_category_by_id(store, category_id)
            .await?
            .ok_or(Error::CategoryNotFound { id: category_id })?;
    }

    let txn = store.connection().begin().await?;

    CategorySupplier::delete_many()
        .filter(category_supplier::Column::SupplierId.eq(supplier_id))
        .exec(&txn)
        .await?;

    if !category_ids.is_empty() {
        let rows = category_ids.iter().map(|&category_id| {
            category_supplier::ActiveModel {
                category_id: Set(category_id),
                supplier_id: Set(supplier_id),
            }
        });
        CategorySupplier::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    store.changes().notify(Table::CategorySuppliers);
    Ok(())
}

/// Number of link rows in total; used by tests to observe the replacement.
pub async fn link_count(store: &Store) -> Result<u64> {
    CategorySupplier::find()
        .count(store.connection())
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_replace_is_total_not_incremental() -> Result<()> {
        let store = setup_test_store().await?;
        let category = create_test_category(&store, "Groceries").await?;
        let a = create_test_supplier(&store, "FreshMart").await?;
        let b = create_test_supplier(&store, "CornerShop").await?;
        let c = create_test_supplier(&store, "MegaStore").await?;

        replace_suppliers_for_category(&store, category.id, &[a.id, b.id]).await?;
        let linked = suppliers_for_category(&store, category.id).await?;
        assert_eq!(linked.len(), 2);

        // The new set fully replaces the old one; b drops out.
        replace_suppliers_for_category(&store, category.id, &[a.id, c.id]).await?;
        let linked = suppliers_for_category(&store, category.id).await?;
        let names: Vec<&str> = linked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["FreshMart", "MegaStore"]);

        // An empty set clears the links.
        replace_suppliers_for_category(&store, category.id, &[]).await?;
        assert!(suppliers_for_category(&store, category.id).await?.is_empty());
        assert_eq!(link_count(&store).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_rejects_unknown_ids() -> Result<()> {
        let store = setup_test_store().await?;
        let category = create_test_category(&store, "Groceries").await?;

        let err = replace_suppliers_for_category(&store, category.id, &[123])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SupplierNotFound { id: 123 }));

        let err = replace_categories_for_supplier(&store, 77, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SupplierNotFound { id: 77 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_links_visible_from_both_sides() -> Result<()> {
        let store = setup_test_store().await?;
        let groceries = create_test_category(&store, "Groceries").await?;
        let household = create_test_category(&store, "Household").await?;
        let shop = create_test_supplier(&store, "FreshMart").await?;

        replace_categories_for_supplier(&store, shop.id, &[groceries.id, household.id]).await?;

        let categories = categories_for_supplier(&store, shop.id).await?;
        assert_eq!(categories.len(), 2);
        let suppliers = suppliers_for_category(&store, groceries.id).await?;
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].name, "FreshMart");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapse() -> Result<()> {
        let store = setup_test_store().await?;
        let category = create_test_category(&store, "Groceries").await?;
        let shop = create_test_supplier(&store, "FreshMart").await?;

        replace_suppliers_for_category(&store, category.id, &[shop.id, shop.id]).await?;
        assert_eq!(link_count(&store).await?, 1);
        Ok(())
    }
}
