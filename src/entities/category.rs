//! Category entity - Represents the spending categories products belong to.
//!
//! Categories carry optional presentation tags (icon, color) alongside the
//! name. A category cannot be deleted while products still reference it;
//! that check lives in the core layer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the category (e.g., "Groceries", "Transport")
    pub name: String,
    /// Optional icon tag used by the presentation layer
    pub icon: Option<String>,
    /// Optional color tag used by the presentation layer
    pub color: Option<String>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// Link rows tying this category to the suppliers that stock it
    #[sea_orm(has_many = "super::category_supplier::Entity")]
    CategorySuppliers,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        super::category_supplier::Relation::Supplier.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::category_supplier::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
