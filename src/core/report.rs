//! Report generation business logic.
//!
//! The grouped sums run as SQL aggregate queries; trend buckets and the
//! per-product price report are pure functions over an already-fetched row
//! set, since the chart layer consumes the same filtered rows anyway. The
//! spending averages are deliberately all-time: they describe the user's
//! overall habit, not the currently viewed slice.

use crate::{
    core::expense::{self, ExpenseDetail, ExpenseFilter},
    entities::{Expense, category, expense as expense_entity, product, supplier},
    errors::Result,
    store::Store,
};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, prelude::DateTimeUtc,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Total spending for one category within the filtered set.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub total: f64,
}

/// Total spending at one supplier within the filtered set.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct SupplierSpending {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub total: f64,
}

/// Granularity of the trend chart buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendInterval {
    #[default]
    Day,
    /// ISO weeks, starting Monday
    Week,
    Month,
}

/// One point of the spending trend: the bucket's first local day and the
/// summed amount.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub bucket: NaiveDate,
    pub total: f64,
}

/// Per-product report row: total spend plus the single cheapest purchase
/// and the supplier that charged it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpending {
    pub product_id: i64,
    pub product_name: String,
    pub category_name: String,
    pub total: f64,
    pub expense_count: usize,
    pub lowest_price: f64,
    pub cheapest_supplier_id: i64,
    pub cheapest_supplier_name: String,
}

/// All-time spending rates, independent of the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpendingAverages {
    pub lifetime_total: f64,
    pub daily: f64,
    pub monthly: f64,
}

/// Spending grouped by category, largest total first.
pub async fn spending_by_category(
    store: &Store,
    filter: ExpenseFilter,
) -> Result<Vec<CategorySpending>> {
    let query = Expense::find()
        .select_only()
        .column_as(product::Column::CategoryId, "category_id")
        .column_as(category::Column::Name, "category_name")
        .column_as(expense_entity::Column::Amount.sum(), "total")
        .join(JoinType::InnerJoin, expense_entity::Relation::Product.def())
        .join(JoinType::InnerJoin, product::Relation::Category.def())
        .group_by(product::Column::CategoryId)
        .group_by(category::Column::Name)
        .order_by_desc(expense_entity::Column::Amount.sum())
        .order_by_asc(category::Column::Name);

    apply_report_filter(query, filter)
        .into_model::<CategorySpending>()
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Spending grouped by supplier, largest total first.
pub async fn spending_by_supplier(
    store: &Store,
    filter: ExpenseFilter,
) -> Result<Vec<SupplierSpending>> {
    let query = Expense::find()
        .select_only()
        .column_as(expense_entity::Column::SupplierId, "supplier_id")
        .column_as(supplier::Column::Name, "supplier_name")
        .column_as(expense_entity::Column::Amount.sum(), "total")
        .join(JoinType::InnerJoin, expense_entity::Relation::Product.def())
        .join(JoinType::InnerJoin, expense_entity::Relation::Supplier.def())
        .group_by(expense_entity::Column::SupplierId)
        .group_by(supplier::Column::Name)
        .order_by_desc(expense_entity::Column::Amount.sum())
        .order_by_asc(supplier::Column::Name);

    apply_report_filter(query, filter)
        .into_model::<SupplierSpending>()
        .all(store.connection())
        .await
        .map_err(Into::into)
}

fn apply_report_filter(
    mut query: sea_orm::Select<Expense>,
    filter: ExpenseFilter,
) -> sea_orm::Select<Expense> {
    if let Some(start) = filter.start {
        query = query.filter(expense_entity::Column::Timestamp.gte(start));
    }
    if let Some(end) = filter.end {
        query = query.filter(expense_entity::Column::Timestamp.lte(end));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(supplier_id) = filter.supplier_id {
        query = query.filter(expense_entity::Column::SupplierId.eq(supplier_id));
    }
    query
}

/// Buckets the rows by local calendar day, ISO week or month and sums each
/// bucket. Buckets come back in chronological order.
#[must_use]
pub fn bucket_spending(rows: &[ExpenseDetail], interval: TrendInterval) -> Vec<TrendPoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for row in rows {
        let local = row.timestamp.with_timezone(&Local).date_naive();
        let bucket = match interval {
            TrendInterval::Day => local,
            TrendInterval::Week => {
                local - Duration::days(i64::from(local.weekday().num_days_from_monday()))
            }
            TrendInterval::Month => local.with_day(1).unwrap_or(local),
        };
        *totals.entry(bucket).or_insert(0.0) += row.amount;
    }

    totals
        .into_iter()
        .map(|(bucket, total)| TrendPoint { bucket, total })
        .collect()
}

/// Folds the rows into per-product report lines, largest total first. Among
/// a product's rows the single cheapest one decides the lowest price and its
/// supplier; on a tie the earlier-encountered row wins.
#[must_use]
pub fn product_spending(rows: &[ExpenseDetail]) -> Vec<ProductSpending> {
    let mut by_product: HashMap<i64, ProductSpending> = HashMap::new();

    for row in rows {
        match by_product.get_mut(&row.product_id) {
            Some(entry) => {
                entry.total += row.amount;
                entry.expense_count += 1;
                if row.amount < entry.lowest_price {
                    entry.lowest_price = row.amount;
                    entry.cheapest_supplier_id = row.supplier_id;
                    entry.cheapest_supplier_name = row.supplier_name.clone();
                }
            }
            None => {
                by_product.insert(
                    row.product_id,
                    ProductSpending {
                        product_id: row.product_id,
                        product_name: row.product_name.clone(),
                        category_name: row.category_name.clone(),
                        total: row.amount,
                        expense_count: 1,
                        lowest_price: row.amount,
                        cheapest_supplier_id: row.supplier_id,
                        cheapest_supplier_name: row.supplier_name.clone(),
                    },
                );
            }
        }
    }

    let mut lines: Vec<ProductSpending> = by_product.into_values().collect();
    lines.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    lines
}

/// Fetches the filtered rows and buckets them at the given granularity.
pub async fn spending_trend(
    store: &Store,
    filter: ExpenseFilter,
    interval: TrendInterval,
) -> Result<Vec<TrendPoint>> {
    let rows = expense::filtered_expenses(store, filter).await?;
    Ok(bucket_spending(&rows, interval))
}

/// Fetches the filtered rows and folds them into per-product report lines.
pub async fn product_report(
    store: &Store,
    filter: ExpenseFilter,
) -> Result<Vec<ProductSpending>> {
    let rows = expense::filtered_expenses(store, filter).await?;
    Ok(product_spending(&rows))
}

/// All-time averages at the current wall clock.
pub async fn spending_averages(store: &Store) -> Result<SpendingAverages> {
    let lifetime_total = expense::total_filtered_expenses(store, ExpenseFilter::default()).await?;
    let first = expense::first_expense_timestamp(store).await?;
    Ok(averages_at(lifetime_total, first, Utc::now()))
}

/// Average computation at an explicit `now`, for testability.
///
/// Daily rate divides by the days elapsed since the first expense, monthly by
/// the months elapsed counting the current partial month; both denominators
/// are clamped to at least 1 so a brand-new history still yields a rate.
#[must_use]
pub fn averages_at(
    lifetime_total: f64,
    first: Option<DateTimeUtc>,
    now: DateTime<Utc>,
) -> SpendingAverages {
    let Some(first) = first else {
        return SpendingAverages {
            lifetime_total,
            daily: 0.0,
            monthly: 0.0,
        };
    };

    let days = (now.date_naive() - first.date_naive()).num_days().max(1);
    let months_elapsed = (i64::from(now.year()) * 12 + i64::from(now.month0()))
        - (i64::from(first.year()) * 12 + i64::from(first.month0()))
        + 1;
    let months = months_elapsed.max(1);

    SpendingAverages {
        lifetime_total,
        daily: lifetime_total / days as f64,
        monthly: lifetime_total / months as f64,
    }
}
