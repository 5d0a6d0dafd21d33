//! Supplier entity - Represents the shops and vendors expenses are recorded against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    /// Unique identifier for the supplier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the supplier (e.g., "FreshMart")
    pub name: String,
}

/// Defines relationships between Supplier and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One supplier has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One supplier has many shopping list items
    #[sea_orm(has_many = "super::shopping_list_item::Entity")]
    ShoppingListItems,
    /// Link rows tying this supplier to the categories it stocks
    #[sea_orm(has_many = "super::category_supplier::Entity")]
    CategorySuppliers,
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

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_supplier::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::category_supplier::Relation::Supplier.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
