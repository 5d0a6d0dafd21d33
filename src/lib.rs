//! `spendtrack` - a personal expense tracking core.
//!
//! This crate provides the storage and data-flow layer of a personal finance
//! tracker: expenses recorded against products, suppliers and categories, a
//! live filtered history with aggregate reports, and a shopping list whose
//! purchased items convert into recorded expenses. The UI on top of it is
//! someone else's problem; everything here is observable state, repositories
//! and an embedded SQLite store.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::semicolon_if_nothing_returned,
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions, // Common pattern in Rust
    clippy::missing_errors_doc,      // Will add gradually
    clippy::missing_panics_doc,      // Will add gradually
    clippy::cast_precision_loss,     // Day/month counts fit in f64 exactly
)]

/// The application root owning the store and preferences
pub mod app;
/// Seed data and user preference files
pub mod config;
/// Core business logic - repositories, reports, and the conversion loop
pub mod core;
/// SeaORM entity definitions for the database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Embedded versioned schema migrations
pub mod migration;
/// Change notification and live query plumbing
pub mod observe;
/// Observable view-model state machines
pub mod session;
/// The dependency-injected store handle
pub mod store;

#[cfg(test)]
pub mod test_utils;
