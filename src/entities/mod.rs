//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod category_supplier;
pub mod expense;
pub mod product;
pub mod shopping_list_item;
pub mod supplier;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use category_supplier::{
    Column as CategorySupplierColumn, Entity as CategorySupplier, Model as CategorySupplierModel,
};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use shopping_list_item::{
    Column as ShoppingListItemColumn, Entity as ShoppingListItem, Model as ShoppingListItemModel,
};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
