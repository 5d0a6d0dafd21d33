//! Shopping list item entity - A planned (and possibly purchased) line item.
//!
//! Items are grouped into a "trip" by their `(supplier_id, shopping_date)`
//! pair. A freshly added item has `purchased_quantity = 0` and no unit price;
//! it only converts into an expense once both a purchased quantity and a unit
//! price have been recorded.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shopping list item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shopping_list_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the product this item plans to buy
    pub product_id: i64,
    /// Optional free-text unit (e.g., "kg", "bottle")
    pub unit: Option<String>,
    /// Quantity the user plans to buy
    pub planned_quantity: f64,
    /// Quantity actually purchased so far, 0 until recorded
    pub purchased_quantity: f64,
    /// Price per unit, None until recorded
    pub unit_price: Option<f64>,
    /// Supplier of the trip this item belongs to, if one is selected
    pub supplier_id: Option<i64>,
    /// Timestamp identifying the shopping trip this item belongs to
    pub shopping_date: DateTimeUtc,
}

/// Defines relationships between ShoppingListItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item plans the purchase of one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each item optionally belongs to one supplier's trip
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
