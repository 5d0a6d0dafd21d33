//! Unified error types and result handling.

use thiserror::Error;

/// All errors surfaced by the crate.
///
/// Deletion guards (`CategoryInUse`, `ProductInUse`, `SupplierInUse`) are
/// raised by the application layer before the store gets a chance to reject
/// the statement, so callers can branch to a friendly message instead of
/// decoding a foreign-key failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: f64 },

    #[error("Category {id} not found")]
    CategoryNotFound { id: i64 },

    #[error("Supplier {id} not found")]
    SupplierNotFound { id: i64 },

    #[error("Product {id} not found")]
    ProductNotFound { id: i64 },

    #[error("Expense {id} not found")]
    ExpenseNotFound { id: i64 },

    #[error("Shopping list item {id} not found")]
    ShoppingItemNotFound { id: i64 },

    #[error("Category '{name}' still has {product_count} products")]
    CategoryInUse { name: String, product_count: u64 },

    #[error("Product '{name}' is referenced by {expense_count} expenses")]
    ProductInUse { name: String, expense_count: u64 },

    #[error("Supplier '{name}' is referenced by {expense_count} expenses")]
    SupplierInUse { name: String, expense_count: u64 },

    #[error("No supplier selected for the shopping trip")]
    NoActiveTrip,
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
