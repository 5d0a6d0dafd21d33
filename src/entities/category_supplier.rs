//! Category-supplier link entity - Which suppliers stock which categories.
//!
//! Plain many-to-many join table with a composite primary key. The link set
//! for one side is always replaced wholesale (delete-then-reinsert), never
//! diffed; see `core::links`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category-supplier link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_suppliers")]
pub struct Model {
    /// ID of the linked category
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i64,
    /// ID of the linked supplier
    #[sea_orm(primary_key, auto_increment = false)]
    pub supplier_id: i64,
}

/// Defines relationships between the link table and both sides
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link row points at one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each link row points at one supplier
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
