//! The shopping trip session: active supplier, trip date, and conversion.
//!
//! Selecting a supplier adopts that supplier's most recent trip (the maximum
//! shopping date among its items) or stamps a fresh one. All item operations
//! go against the active trip; recording purchases delegates to the core
//! conversion loop and reports how many expenses were created.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeUtc;
use tracing::debug;

use crate::core::shopping::{self, ShoppingItemDetail};
use crate::entities::shopping_list_item;
use crate::errors::{Error, Result};
use crate::observe::LiveQuery;
use crate::store::Store;

/// Session state for the shopping screen.
pub struct ShoppingTripSession {
    store: Arc<Store>,
    supplier_id: Option<i64>,
    trip_date: Option<DateTimeUtc>,
}

impl ShoppingTripSession {
    /// A session with no supplier selected yet.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            supplier_id: None,
            trip_date: None,
        }
    }

    /// The active supplier, if one is selected.
    #[must_use]
    pub fn supplier_id(&self) -> Option<i64> {
        self.supplier_id
    }

    /// The active trip date, if a supplier is selected.
    #[must_use]
    pub fn trip_date(&self) -> Option<DateTimeUtc> {
        self.trip_date
    }

    /// Selects the active supplier and adopts its most recent trip, or
    /// starts a fresh trip stamped with the current time if the supplier has
    /// no items yet. Returns the adopted trip date.
    pub async fn select_supplier(&mut self, supplier_id: i64) -> Result<DateTimeUtc> {
        crate::core::supplier::get_supplier_by_id(&self.store, supplier_id)
            .await?
            .ok_or(Error::SupplierNotFound { id: supplier_id })?;

        let trip_date = match shopping::latest_trip_date(&self.store, supplier_id).await? {
            Some(existing) => {
                debug!("Adopting existing trip {existing} for supplier {supplier_id}");
                existing
            }
            None => Utc::now(),
        };

        self.supplier_id = Some(supplier_id);
        self.trip_date = Some(trip_date);
        Ok(trip_date)
    }

    /// Starts a new trip for the active supplier, stamped with the current
    /// time. Items added afterwards belong to the new trip.
    pub fn start_new_trip(&mut self) -> Result<DateTimeUtc> {
        if self.supplier_id.is_none() {
            return Err(Error::NoActiveTrip);
        }
        let trip_date = Utc::now();
        self.trip_date = Some(trip_date);
        Ok(trip_date)
    }

    fn active_trip(&self) -> Result<(i64, DateTimeUtc)> {
        match (self.supplier_id, self.trip_date) {
            (Some(supplier_id), Some(trip_date)) => Ok((supplier_id, trip_date)),
            _ => Err(Error::NoActiveTrip),
        }
    }

    /// Appends a planned item to the active trip.
    pub async fn add_item(
        &self,
        product_id: i64,
        planned_quantity: f64,
        unit: Option<String>,
    ) -> Result<shopping_list_item::Model> {
        let (supplier_id, trip_date) = self.active_trip()?;
        shopping::add_item(
            &self.store,
            product_id,
            Some(supplier_id),
            trip_date,
            planned_quantity,
            unit,
        )
        .await
    }

    /// Records how much of an item was actually bought.
    pub async fn set_purchased_quantity(
        &self,
        item_id: i64,
        quantity: f64,
    ) -> Result<shopping_list_item::Model> {
        shopping::set_purchased_quantity(&self.store, item_id, quantity).await
    }

    /// Sets or clears an item's unit price.
    pub async fn set_unit_price(
        &self,
        item_id: i64,
        price: Option<f64>,
    ) -> Result<shopping_list_item::Model> {
        shopping::set_unit_price(&self.store, item_id, price).await
    }

    /// Removes an item from the list.
    pub async fn delete_item(&self, item_id: i64) -> Result<bool> {
        shopping::delete_item(&self.store, item_id).await
    }

    /// The items of the active trip.
    pub async fn items(&self) -> Result<Vec<ShoppingItemDetail>> {
        let (supplier_id, trip_date) = self.active_trip()?;
        shopping::items_for_trip(&self.store, supplier_id, trip_date).await
    }

    /// A live view of the active trip's items.
    pub fn watch_items(&self) -> Result<LiveQuery<Vec<ShoppingItemDetail>>> {
        let (supplier_id, trip_date) = self.active_trip()?;
        Ok(shopping::watch_trip_items(
            &self.store,
            supplier_id,
            trip_date,
        ))
    }

    /// Converts every filled-in item of the active trip into an expense.
    /// Returns the number of expenses recorded.
    pub async fn record_purchases(&self) -> Result<usize> {
        let (supplier_id, trip_date) = self.active_trip()?;
        shopping::record_purchases(&self.store, supplier_id, trip_date).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_item_operations_require_a_supplier() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let mut session = ShoppingTripSession::new(Arc::clone(&store));
        assert!(matches!(
            session.add_item(fixture.product.id, 1.0, None).await,
            Err(Error::NoActiveTrip)
        ));
        assert!(matches!(session.start_new_trip(), Err(Error::NoActiveTrip)));

        session.select_supplier(fixture.supplier.id).await?;
        session.add_item(fixture.product.id, 1.0, None).await?;
        assert_eq!(session.items().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_select_supplier_adopts_latest_trip() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let mut session = ShoppingTripSession::new(Arc::clone(&store));
        let first_trip = session.select_supplier(fixture.supplier.id).await?;
        session.add_item(fixture.product.id, 2.0, None).await?;

        // A second session for the same supplier lands on the same trip.
        let mut other = ShoppingTripSession::new(Arc::clone(&store));
        let adopted = other.select_supplier(fixture.supplier.id).await?;
        assert_eq!(adopted, first_trip);
        assert_eq!(other.items().await?.len(), 1);

        // A new trip leaves the old items behind.
        let fresh = other.start_new_trip()?;
        assert!(fresh > first_trip);
        assert!(other.items().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_purchases_via_session() -> Result<()> {
        let store = setup_test_store_arc().await?;
        let fixture = seed_basic(&store).await?;

        let mut session = ShoppingTripSession::new(Arc::clone(&store));
        session.select_supplier(fixture.supplier.id).await?;

        let item = session.add_item(fixture.product.id, 2.0, None).await?;
        session.set_purchased_quantity(item.id, 2.0).await?;
        session.set_unit_price(item.id, Some(1.75)).await?;

        let live = session.watch_items()?;
        let mut items = live.subscribe();

        assert_eq!(session.record_purchases().await?, 1);

        // The live view shows the reset item.
        let items = wait_for(&mut items, |items| {
            items.len() == 1 && items[0].unit_price.is_none()
        })
        .await;
        assert_eq!(items[0].purchased_quantity, 0.0);

        let total = crate::core::expense::total_filtered_expenses(
            &store,
            crate::core::expense::ExpenseFilter::default(),
        )
        .await?;
        assert!((total - 3.5).abs() < 1e-9);
        Ok(())
    }
}
