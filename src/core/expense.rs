//! Expense business logic: CRUD, the filter contract, and live queries.
//!
//! `ExpenseFilter` is the four-dimension tuple the whole reporting stack is
//! driven by. Every dimension is optional; a `None` means "no constraint on
//! this dimension", and the date bounds are inclusive. Query results are
//! ordered newest first.

use std::sync::Arc;

use crate::{
    entities::{Expense, category, expense, product, supplier},
    errors::{Error, Result},
    observe::{LiveQuery, Table},
    store::Store,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set, prelude::DateTimeUtc,
};

/// Tables whose changes can affect a filtered expense query.
pub const EXPENSE_TABLES: &[Table] = &[
    Table::Expenses,
    Table::Products,
    Table::Categories,
    Table::Suppliers,
];

/// The current filter selection. `None` in any dimension means that
/// dimension is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Inclusive lower bound on the expense timestamp
    pub start: Option<DateTimeUtc>,
    /// Inclusive upper bound on the expense timestamp
    pub end: Option<DateTimeUtc>,
    /// Restrict to products in this category
    pub category_id: Option<i64>,
    /// Restrict to this supplier
    pub supplier_id: Option<i64>,
}

/// An expense joined with its product, category and supplier names.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ExpenseDetail {
    pub id: i64,
    pub amount: f64,
    pub timestamp: DateTimeUtc,
    pub product_id: i64,
    pub product_name: String,
    pub category_id: i64,
    pub category_name: String,
    pub supplier_id: i64,
    pub supplier_name: String,
}

/// Partial update for an expense; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub product_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub timestamp: Option<DateTimeUtc>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Applies the filter to a select that already joins the product table
/// (the category dimension constrains `products.category_id`).
fn apply_filter(mut query: Select<Expense>, filter: ExpenseFilter) -> Select<Expense> {
    if let Some(start) = filter.start {
        query = query.filter(expense::Column::Timestamp.gte(start));
    }
    if let Some(end) = filter.end {
        query = query.filter(expense::Column::Timestamp.lte(end));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(supplier_id) = filter.supplier_id {
        query = query.filter(expense::Column::SupplierId.eq(supplier_id));
    }
    query
}

/// Records a new expense. The timestamp defaults to now when not supplied.
pub async fn create_expense(
    store: &Store,
    product_id: i64,
    supplier_id: i64,
    amount: f64,
    timestamp: Option<DateTimeUtc>,
) -> Result<expense::Model> {
    validate_amount(amount)?;

    crate::core::product::get_product_by_id(store, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    crate::core::supplier::get_supplier_by_id(store, supplier_id)
        .await?
        .ok_or(Error::SupplierNotFound { id: supplier_id })?;

    let model = expense::ActiveModel {
        amount: Set(amount),
        product_id: Set(product_id),
        supplier_id: Set(supplier_id),
        timestamp: Set(timestamp.unwrap_or_else(Utc::now)),
        ..Default::default()
    }
    .insert(store.connection())
    .await?;

    store.changes().notify(Table::Expenses);
    Ok(model)
}

/// Finds an expense by its unique ID.
pub async fn get_expense_by_id(store: &Store, id: i64) -> Result<Option<expense::Model>> {
    Expense::find_by_id(id)
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Applies a partial update to an expense. Amount, date, product and
/// supplier stay editable after creation; the identity does not.
pub async fn update_expense(
    store: &Store,
    id: i64,
    update: ExpenseUpdate,
) -> Result<expense::Model> {
    let existing = get_expense_by_id(store, id)
        .await?
        .ok_or(Error::ExpenseNotFound { id })?;

    if let Some(amount) = update.amount {
        validate_amount(amount)?;
    }
    if let Some(product_id) = update.product_id {
        crate::core::product::get_product_by_id(store, product_id)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;
    }
    if let Some(supplier_id) = update.supplier_id {
        crate::core::supplier::get_supplier_by_id(store, supplier_id)
            .await?
            .ok_or(Error::SupplierNotFound { id: supplier_id })?;
    }

    let mut active: expense::ActiveModel = existing.into();
    if let Some(amount) = update.amount {
        active.amount = Set(amount);
    }
    if let Some(product_id) = update.product_id {
        active.product_id = Set(product_id);
    }
    if let Some(supplier_id) = update.supplier_id {
        active.supplier_id = Set(supplier_id);
    }
    if let Some(timestamp) = update.timestamp {
        active.timestamp = Set(timestamp);
    }
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::Expenses);
    Ok(updated)
}

/// Deletes an expense. Unrestricted; deleting an already-absent row is a
/// no-op. Returns whether a row was removed.
pub async fn delete_expense(store: &Store, id: i64) -> Result<bool> {
    let result = Expense::delete_by_id(id).exec(store.connection()).await?;
    let deleted = result.rows_affected > 0;
    if deleted {
        store.changes().notify(Table::Expenses);
    }
    Ok(deleted)
}

/// Returns the expenses matching `filter`, joined with product, category and
/// supplier names, newest first.
pub async fn filtered_expenses(store: &Store, filter: ExpenseFilter) -> Result<Vec<ExpenseDetail>> {
    let query = Expense::find()
        .select_only()
        .column(expense::Column::Id)
        .column(expense::Column::Amount)
        .column(expense::Column::Timestamp)
        .column(expense::Column::ProductId)
        .column_as(product::Column::Name, "product_name")
        .column_as(product::Column::CategoryId, "category_id")
        .column_as(category::Column::Name, "category_name")
        .column(expense::Column::SupplierId)
        .column_as(supplier::Column::Name, "supplier_name")
        .join(JoinType::InnerJoin, expense::Relation::Product.def())
        .join(JoinType::InnerJoin, product::Relation::Category.def())
        .join(JoinType::InnerJoin, expense::Relation::Supplier.def())
        .order_by_desc(expense::Column::Timestamp)
        .order_by_desc(expense::Column::Id);

    apply_filter(query, filter)
        .into_model::<ExpenseDetail>()
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Sum of `amount` over the expenses matching `filter`; 0.0 when none match.
pub async fn total_filtered_expenses(store: &Store, filter: ExpenseFilter) -> Result<f64> {
    let query = Expense::find()
        .select_only()
        .column_as(expense::Column::Amount.sum(), "total")
        .join(JoinType::InnerJoin, expense::Relation::Product.def());

    let total: Option<Option<f64>> = apply_filter(query, filter)
        .into_tuple()
        .one(store.connection())
        .await?;

    Ok(total.flatten().unwrap_or(0.0))
}

/// Timestamp of the earliest recorded expense, if any. Feeds the all-time
/// spending averages.
pub async fn first_expense_timestamp(store: &Store) -> Result<Option<DateTimeUtc>> {
    let first: Option<Option<DateTimeUtc>> = Expense::find()
        .select_only()
        .column_as(expense::Column::Timestamp.min(), "first")
        .into_tuple()
        .one(store.connection())
        .await?;

    Ok(first.flatten())
}

/// Live variant of [`filtered_expenses`] for a fixed filter: re-emits the
/// full result set whenever any underlying row changes.
pub fn watch_filtered(store: &Arc<Store>, filter: ExpenseFilter) -> LiveQuery<Vec<ExpenseDetail>> {
    LiveQuery::spawn(
        Arc::clone(store),
        EXPENSE_TABLES.to_vec(),
        Vec::new(),
        move |store| async move { filtered_expenses(&store, filter).await },
    )
}

/// Live variant of [`total_filtered_expenses`] for a fixed filter.
pub fn watch_total(store: &Arc<Store>, filter: ExpenseFilter) -> LiveQuery<f64> {
    LiveQuery::spawn(
        Arc::clone(store),
        EXPENSE_TABLES.to_vec(),
        0.0,
        move |store| async move { total_filtered_expenses(&store, filter).await },
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_create_expense_validation() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;

        for bad in [0.0, -3.5, f64::NAN, f64::INFINITY] {
            let result =
                create_expense(&store, fixture.product.id, fixture.supplier.id, bad, None).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        }

        let missing_product = create_expense(&store, 999, fixture.supplier.id, 1.0, None).await;
        assert!(matches!(
            missing_product.unwrap_err(),
            Error::ProductNotFound { id: 999 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_expense_round_trip() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;

        let before = Utc::now();
        let defaulted =
            create_expense(&store, fixture.product.id, fixture.supplier.id, 3.5, None).await?;
        let after = Utc::now();

        let read = get_expense_by_id(&store, defaulted.id).await?.unwrap();
        assert_eq!(read.amount, 3.5);
        assert_eq!(read.product_id, fixture.product.id);
        assert_eq!(read.supplier_id, fixture.supplier.id);
        assert!(read.timestamp >= before && read.timestamp <= after);

        let explicit_ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let explicit = create_expense(
            &store,
            fixture.product.id,
            fixture.supplier.id,
            9.99,
            Some(explicit_ts),
        )
        .await?;
        let read = get_expense_by_id(&store, explicit.id).await?.unwrap();
        assert_eq!(read.timestamp, explicit_ts);
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_dimensions() -> Result<()> {
        let store = setup_test_store().await?;
        let scenario = seed_report_scenario(&store).await?;

        // Unconstrained: everything, newest first.
        let all = filtered_expenses(&store, ExpenseFilter::default()).await?;
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        // Category dimension (via the product join).
        let groceries = filtered_expenses(
            &store,
            ExpenseFilter {
                category_id: Some(scenario.groceries.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(groceries.len(), 3);
        assert!(groceries.iter().all(|e| e.category_id == scenario.groceries.id));

        // Supplier dimension.
        let fresh_mart = filtered_expenses(
            &store,
            ExpenseFilter {
                supplier_id: Some(scenario.fresh_mart.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(fresh_mart.len(), 3);

        // Date bounds are inclusive on both ends.
        let ranged = filtered_expenses(
            &store,
            ExpenseFilter {
                start: Some(scenario.day2),
                end: Some(scenario.day3),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(ranged.len(), 2);

        // All dimensions combined.
        let narrow = filtered_expenses(
            &store,
            ExpenseFilter {
                start: Some(scenario.day1),
                end: Some(scenario.day3),
                category_id: Some(scenario.groceries.id),
                supplier_id: Some(scenario.fresh_mart.id),
            },
        )
        .await?;
        assert_eq!(narrow.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_matches_filter() -> Result<()> {
        let store = setup_test_store().await?;
        let scenario = seed_report_scenario(&store).await?;

        let total = total_filtered_expenses(&store, ExpenseFilter::default()).await?;
        assert!((total - 21.0).abs() < 1e-9);

        let by_supplier = total_filtered_expenses(
            &store,
            ExpenseFilter {
                supplier_id: Some(scenario.fresh_mart.id),
                ..Default::default()
            },
        )
        .await?;
        assert!((by_supplier - 10.5).abs() < 1e-9);

        // Empty result sets sum to zero, not null.
        let empty = total_filtered_expenses(
            &store,
            ExpenseFilter {
                supplier_id: Some(9999),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(empty, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_expense() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;
        let other_supplier = create_test_supplier(&store, "Corner Shop").await?;
        let expense =
            create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let updated = update_expense(
            &store,
            expense.id,
            ExpenseUpdate {
                amount: Some(4.25),
                supplier_id: Some(other_supplier.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.amount, 4.25);
        assert_eq!(updated.supplier_id, other_supplier.id);
        // Untouched fields survive.
        assert_eq!(updated.product_id, expense.product_id);
        assert_eq!(updated.timestamp, expense.timestamp);

        assert!(delete_expense(&store, expense.id).await?);
        assert!(!delete_expense(&store, expense.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_expense_scenario() -> Result<()> {
        // Category "Groceries", product "Milk", supplier "FreshMart",
        // one expense of 3.50.
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;
        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let by_category = filtered_expenses(
            &store,
            ExpenseFilter {
                category_id: Some(fixture.category.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].product_name, "Milk");
        assert_eq!(by_category[0].supplier_name, "FreshMart");

        let total = total_filtered_expenses(
            &store,
            ExpenseFilter {
                category_id: Some(fixture.category.id),
                ..Default::default()
            },
        )
        .await?;
        assert!((total - 3.5).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_filtered_re_emits_on_insert() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let live_rows = watch_filtered(&store, ExpenseFilter::default());
        let live_total = watch_total(&store, ExpenseFilter::default());
        let mut rows = live_rows.subscribe();
        let mut total = live_total.subscribe();

        create_test_expense(&store, fixture.product.id, fixture.supplier.id, 3.5).await?;

        let rows = wait_for(&mut rows, |rows| rows.len() == 1).await;
        assert_eq!(rows[0].amount, 3.5);
        wait_for(&mut total, |total| (*total - 3.5).abs() < 1e-9).await;
        Ok(())
    }
}
