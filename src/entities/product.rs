//! Product entity - Represents the things money is spent on.
//!
//! Every product belongs to exactly one category. Products are referenced by
//! expenses and by shopping list items; deletion is blocked while any expense
//! references the product (core layer check).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Milk")
    pub name: String,
    /// ID of the category this product belongs to
    pub category_id: i64,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One product has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One product has many shopping list items
    #[sea_orm(has_many = "super::shopping_list_item::Entity")]
    ShoppingListItems,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::shopping_list_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoppingListItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
