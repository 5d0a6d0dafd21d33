//! Shopping list business logic: items, trips, and purchase recording.
//!
//! A trip is the set of items sharing a `(supplier_id, shopping_date)` pair.
//! Items start out planned-only; recording a purchase fills in the purchased
//! quantity and unit price, and [`record_purchases`] turns every filled-in
//! item of a trip into a persisted expense.

use std::sync::Arc;

use crate::{
    entities::{ShoppingListItem, product, shopping_list_item},
    errors::{Error, Result},
    observe::{LiveQuery, Table},
    store::Store,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, prelude::DateTimeUtc,
};
use tracing::{debug, info, instrument};

/// A shopping list item joined with its product name.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ShoppingItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit: Option<String>,
    pub planned_quantity: f64,
    pub purchased_quantity: f64,
    pub unit_price: Option<f64>,
    pub supplier_id: Option<i64>,
    pub shopping_date: DateTimeUtc,
}

fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Appends a planned item to a trip. The item starts with nothing purchased
/// and no unit price.
pub async fn add_item(
    store: &Store,
    product_id: i64,
    supplier_id: Option<i64>,
    shopping_date: DateTimeUtc,
    planned_quantity: f64,
    unit: Option<String>,
) -> Result<shopping_list_item::Model> {
    if !planned_quantity.is_finite() || planned_quantity <= 0.0 {
        return Err(Error::InvalidQuantity {
            quantity: planned_quantity,
        });
    }

    crate::core::product::get_product_by_id(store, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    if let Some(supplier_id) = supplier_id {
        crate::core::supplier::get_supplier_by_id(store, supplier_id)
            .await?
            .ok_or(Error::SupplierNotFound { id: supplier_id })?;
    }

    let model = shopping_list_item::ActiveModel {
        product_id: Set(product_id),
        unit: Set(unit),
        planned_quantity: Set(planned_quantity),
        purchased_quantity: Set(0.0),
        unit_price: Set(None),
        supplier_id: Set(supplier_id),
        shopping_date: Set(shopping_date),
        ..Default::default()
    }
    .insert(store.connection())
    .await?;

    store.changes().notify(Table::ShoppingListItems);
    Ok(model)
}

/// Finds an item by its unique ID.
pub async fn get_item_by_id(
    store: &Store,
    id: i64,
) -> Result<Option<shopping_list_item::Model>> {
    ShoppingListItem::find_by_id(id)
        .one(store.connection())
        .await
        .map_err(Into::into)
}

/// Updates how much of the item has actually been bought.
pub async fn set_purchased_quantity(
    store: &Store,
    id: i64,
    quantity: f64,
) -> Result<shopping_list_item::Model> {
    validate_quantity(quantity)?;

    let existing = get_item_by_id(store, id)
        .await?
        .ok_or(Error::ShoppingItemNotFound { id })?;

    let mut active: shopping_list_item::ActiveModel = existing.into();
    active.purchased_quantity = Set(quantity);
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::ShoppingListItems);
    Ok(updated)
}

/// Sets or clears the item's unit price. A present price must be positive.
pub async fn set_unit_price(
    store: &Store,
    id: i64,
    price: Option<f64>,
) -> Result<shopping_list_item::Model> {
    if let Some(price) = price {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidAmount { amount: price });
        }
    }

    let existing = get_item_by_id(store, id)
        .await?
        .ok_or(Error::ShoppingItemNotFound { id })?;

    let mut active: shopping_list_item::ActiveModel = existing.into();
    active.unit_price = Set(price);
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::ShoppingListItems);
    Ok(updated)
}

/// Changes the planned quantity of an item.
pub async fn set_planned_quantity(
    store: &Store,
    id: i64,
    quantity: f64,
) -> Result<shopping_list_item::Model> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let existing = get_item_by_id(store, id)
        .await?
        .ok_or(Error::ShoppingItemNotFound { id })?;

    let mut active: shopping_list_item::ActiveModel = existing.into();
    active.planned_quantity = Set(quantity);
    let updated = active.update(store.connection()).await?;

    store.changes().notify(Table::ShoppingListItems);
    Ok(updated)
}

/// Removes an item from the list. Returns whether a row was removed.
pub async fn delete_item(store: &Store, id: i64) -> Result<bool> {
    let result = ShoppingListItem::delete_by_id(id)
        .exec(store.connection())
        .await?;
    let deleted = result.rows_affected > 0;
    if deleted {
        store.changes().notify(Table::ShoppingListItems);
    }
    Ok(deleted)
}

/// The most recent trip date for a supplier, if it has any items.
pub async fn latest_trip_date(store: &Store, supplier_id: i64) -> Result<Option<DateTimeUtc>> {
    let latest: Option<Option<DateTimeUtc>> = ShoppingListItem::find()
        .select_only()
        .column_as(shopping_list_item::Column::ShoppingDate.max(), "latest")
        .filter(shopping_list_item::Column::SupplierId.eq(supplier_id))
        .into_tuple()
        .one(store.connection())
        .await?;

    Ok(latest.flatten())
}

/// The items of one trip, joined with their product names, in insertion
/// order.
pub async fn items_for_trip(
    store: &Store,
    supplier_id: i64,
    shopping_date: DateTimeUtc,
) -> Result<Vec<ShoppingItemDetail>> {
    ShoppingListItem::find()
        .select_only()
        .column(shopping_list_item::Column::Id)
        .column(shopping_list_item::Column::ProductId)
        .column_as(product::Column::Name, "product_name")
        .column(shopping_list_item::Column::Unit)
        .column(shopping_list_item::Column::PlannedQuantity)
        .column(shopping_list_item::Column::PurchasedQuantity)
        .column(shopping_list_item::Column::UnitPrice)
        .column(shopping_list_item::Column::SupplierId)
        .column(shopping_list_item::Column::ShoppingDate)
        .join(JoinType::InnerJoin, shopping_list_item::Relation::Product.def())
        .filter(shopping_list_item::Column::SupplierId.eq(supplier_id))
        .filter(shopping_list_item::Column::ShoppingDate.eq(shopping_date))
        .order_by_asc(shopping_list_item::Column::Id)
        .into_model::<ShoppingItemDetail>()
        .all(store.connection())
        .await
        .map_err(Into::into)
}

/// Live variant of [`items_for_trip`] for a fixed trip.
pub fn watch_trip_items(
    store: &Arc<Store>,
    supplier_id: i64,
    shopping_date: DateTimeUtc,
) -> LiveQuery<Vec<ShoppingItemDetail>> {
    LiveQuery::spawn(
        Arc::clone(store),
        vec![Table::ShoppingListItems, Table::Products],
        Vec::new(),
        move |store| async move { items_for_trip(&store, supplier_id, shopping_date).await },
    )
}

/// Converts every filled-in item of the trip into an expense.
///
/// An item qualifies once its purchased quantity is above zero and a unit
/// price is present; everything else is silently skipped and left as is. For
/// each qualifying item one expense of `purchased_quantity * unit_price` is
/// recorded against the item's product and the trip's supplier, stamped with
/// the current time, and the item is reset (nothing purchased, no price) so
/// it can be bought again on a later trip without re-adding.
///
/// The loop intentionally runs without an enclosing transaction: each item's
/// conversion stands on its own, and an interrupted run leaves the remaining
/// items eligible for the next one.
///
/// Returns the number of expenses recorded.
#[instrument(skip(store))]
pub async fn record_purchases(
    store: &Store,
    supplier_id: i64,
    shopping_date: DateTimeUtc,
) -> Result<usize> {
    let items = ShoppingListItem::find()
        .filter(shopping_list_item::Column::SupplierId.eq(supplier_id))
        .filter(shopping_list_item::Column::ShoppingDate.eq(shopping_date))
        .order_by_asc(shopping_list_item::Column::Id)
        .all(store.connection())
        .await?;

    let mut recorded = 0;
    for item in items {
        let Some(price) = item.unit_price else {
            continue;
        };
        if item.purchased_quantity <= 0.0 {
            continue;
        }

        let amount = item.purchased_quantity * price;
        crate::core::expense::create_expense(store, item.product_id, supplier_id, amount, None)
            .await?;
        debug!(
            "Converted shopping item {} into an expense of {}",
            item.id, amount
        );

        let mut active: shopping_list_item::ActiveModel = item.into();
        active.purchased_quantity = Set(0.0);
        active.unit_price = Set(None);
        active.update(store.connection()).await?;
        recorded += 1;
    }

    if recorded > 0 {
        info!("Recorded {recorded} purchases for supplier {supplier_id}");
        store.changes().notify(Table::ShoppingListItems);
    }
    Ok(recorded)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::expense::{ExpenseFilter, filtered_expenses};
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_add_item_starts_planned_only() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;
        let trip = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        let item = add_item(
            &store,
            fixture.product.id,
            Some(fixture.supplier.id),
            trip,
            2.0,
            Some("l".to_string()),
        )
        .await?;
        assert_eq!(item.purchased_quantity, 0.0);
        assert!(item.unit_price.is_none());

        let bad = add_item(&store, fixture.product.id, None, trip, 0.0, None).await;
        assert!(matches!(bad.unwrap_err(), Error::InvalidQuantity { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_trip_date() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;

        assert!(latest_trip_date(&store, fixture.supplier.id).await?.is_none());

        let old_trip = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let new_trip = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        add_item(&store, fixture.product.id, Some(fixture.supplier.id), old_trip, 1.0, None)
            .await?;
        add_item(&store, fixture.product.id, Some(fixture.supplier.id), new_trip, 1.0, None)
            .await?;

        assert_eq!(
            latest_trip_date(&store, fixture.supplier.id).await?,
            Some(new_trip)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_record_purchases_converts_and_resets() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;
        let bread = create_test_product(&store, "Bread", fixture.category.id).await?;
        let soap = create_test_product(&store, "Soap", fixture.category.id).await?;
        let trip = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        // Fully filled in: converts.
        let milk_item = add_item(
            &store,
            fixture.product.id,
            Some(fixture.supplier.id),
            trip,
            2.0,
            None,
        )
        .await?;
        set_purchased_quantity(&store, milk_item.id, 2.0).await?;
        set_unit_price(&store, milk_item.id, Some(1.75)).await?;

        // Quantity but no price: skipped.
        let bread_item =
            add_item(&store, bread.id, Some(fixture.supplier.id), trip, 1.0, None).await?;
        set_purchased_quantity(&store, bread_item.id, 1.0).await?;

        // Price but nothing purchased: skipped.
        let soap_item =
            add_item(&store, soap.id, Some(fixture.supplier.id), trip, 1.0, None).await?;
        set_unit_price(&store, soap_item.id, Some(2.5)).await?;

        let recorded = record_purchases(&store, fixture.supplier.id, trip).await?;
        assert_eq!(recorded, 1);

        let expenses = filtered_expenses(&store, ExpenseFilter::default()).await?;
        assert_eq!(expenses.len(), 1);
        assert!((expenses[0].amount - 3.5).abs() < 1e-9);
        assert_eq!(expenses[0].product_id, fixture.product.id);
        assert_eq!(expenses[0].supplier_id, fixture.supplier.id);

        // The converted item is reset; the skipped ones are untouched.
        let milk_item = get_item_by_id(&store, milk_item.id).await?.unwrap();
        assert_eq!(milk_item.purchased_quantity, 0.0);
        assert!(milk_item.unit_price.is_none());
        let bread_item = get_item_by_id(&store, bread_item.id).await?.unwrap();
        assert_eq!(bread_item.purchased_quantity, 1.0);
        let soap_item = get_item_by_id(&store, soap_item.id).await?.unwrap();
        assert_eq!(soap_item.unit_price, Some(2.5));

        // A second run finds nothing eligible.
        assert_eq!(record_purchases(&store, fixture.supplier.id, trip).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_items_for_trip_scoped_to_trip() -> Result<()> {
        let store = setup_test_store().await?;
        let fixture = seed_basic(&store).await?;
        let other_supplier = create_test_supplier(&store, "CornerShop").await?;
        let trip = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let other_trip = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();

        add_item(&store, fixture.product.id, Some(fixture.supplier.id), trip, 1.0, None).await?;
        add_item(&store, fixture.product.id, Some(fixture.supplier.id), other_trip, 1.0, None)
            .await?;
        add_item(&store, fixture.product.id, Some(other_supplier.id), trip, 1.0, None).await?;

        let items = items_for_trip(&store, fixture.supplier.id, trip).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Milk");
        assert_eq!(items[0].shopping_date, trip);
        Ok(())
    }
}
