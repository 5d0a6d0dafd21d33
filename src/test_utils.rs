//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test stores,
//! creating test entities with sensible defaults, and waiting on watch
//! channels with a timeout.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use sea_orm::prelude::DateTimeUtc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::core::{category, expense, product, supplier};
use crate::entities;
use crate::errors::Result;
use crate::store::Store;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory store with the full migration chain applied.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<Store> {
    init_test_tracing();
    Store::open_in_memory().await
}

/// Like [`setup_test_store`], shared for the session and live-query tests.
pub async fn setup_test_store_arc() -> Result<Arc<Store>> {
    Ok(Arc::new(setup_test_store().await?))
}

/// Creates a category with no icon or color tags.
pub async fn create_test_category(
    store: &Store,
    name: &str,
) -> Result<entities::category::Model> {
    Ok(category::create_category(store, name, None, None)
        .await?
        .into_model())
}

/// Creates a supplier.
pub async fn create_test_supplier(
    store: &Store,
    name: &str,
) -> Result<entities::supplier::Model> {
    Ok(supplier::create_supplier(store, name).await?.into_model())
}

/// Creates a product in the given category.
pub async fn create_test_product(
    store: &Store,
    name: &str,
    category_id: i64,
) -> Result<entities::product::Model> {
    Ok(product::create_product(store, name, category_id)
        .await?
        .into_model())
}

/// Records an expense with a defaulted (current) timestamp.
pub async fn create_test_expense(
    store: &Store,
    product_id: i64,
    supplier_id: i64,
    amount: f64,
) -> Result<entities::expense::Model> {
    expense::create_expense(store, product_id, supplier_id, amount, None).await
}

/// The smallest useful world: one category, one product, one supplier.
pub struct BasicFixture {
    pub category: entities::category::Model,
    pub product: entities::product::Model,
    pub supplier: entities::supplier::Model,
}

/// Seeds "Groceries" / "Milk" / "FreshMart".
pub async fn seed_basic(store: &Store) -> Result<BasicFixture> {
    let category = create_test_category(store, "Groceries").await?;
    let product = create_test_product(store, "Milk", category.id).await?;
    let supplier = create_test_supplier(store, "FreshMart").await?;
    Ok(BasicFixture {
        category,
        product,
        supplier,
    })
}

/// A broader fixture for the filter and report tests: two categories, three
/// products, two suppliers and four expenses on four consecutive days.
///
/// Expenses: Milk/FreshMart 3.50 on day1, Bread/FreshMart 2.00 on day2,
/// Soap/FreshMart 5.00 on day3, Milk/CornerShop 10.50 on day4 — 21.00 in
/// total, 10.50 of it at FreshMart, 16.00 of it on groceries.
pub struct ReportScenario {
    pub groceries: entities::category::Model,
    pub household: entities::category::Model,
    pub milk: entities::product::Model,
    pub bread: entities::product::Model,
    pub soap: entities::product::Model,
    pub fresh_mart: entities::supplier::Model,
    pub corner_shop: entities::supplier::Model,
    pub day1: DateTimeUtc,
    pub day2: DateTimeUtc,
    pub day3: DateTimeUtc,
    pub day4: DateTimeUtc,
}

pub async fn seed_report_scenario(store: &Store) -> Result<ReportScenario> {
    let groceries = create_test_category(store, "Groceries").await?;
    let household = create_test_category(store, "Household").await?;
    let milk = create_test_product(store, "Milk", groceries.id).await?;
    let bread = create_test_product(store, "Bread", groceries.id).await?;
    let soap = create_test_product(store, "Soap", household.id).await?;
    let fresh_mart = create_test_supplier(store, "FreshMart").await?;
    let corner_shop = create_test_supplier(store, "CornerShop").await?;

    // Mid-month noon timestamps keep every row inside the same local month
    // regardless of the machine's timezone.
    let day1 = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let day2 = Utc.with_ymd_and_hms(2025, 3, 11, 12, 0, 0).unwrap();
    let day3 = Utc.with_ymd_and_hms(2025, 3, 12, 12, 0, 0).unwrap();
    let day4 = Utc.with_ymd_and_hms(2025, 3, 13, 12, 0, 0).unwrap();

    expense::create_expense(store, milk.id, fresh_mart.id, 3.5, Some(day1)).await?;
    expense::create_expense(store, bread.id, fresh_mart.id, 2.0, Some(day2)).await?;
    expense::create_expense(store, soap.id, fresh_mart.id, 5.0, Some(day3)).await?;
    expense::create_expense(store, milk.id, corner_shop.id, 10.5, Some(day4)).await?;

    Ok(ReportScenario {
        groceries,
        household,
        milk,
        bread,
        soap,
        fresh_mart,
        corner_shop,
        day1,
        day2,
        day3,
        day4,
    })
}

/// Waits (bounded) until a watch channel publishes a value matching the
/// predicate, returning that value.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    mut predicate: impl FnMut(&T) -> bool,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("value publisher went away");
        }
    })
    .await
    .expect("timed out waiting for a published value")
}
