//! Core business logic - framework-agnostic repository operations.
//!
//! Every function takes the store handle explicitly; there are no globals.
//! Mutating operations announce the touched table through the store's change
//! stream so live queries refresh.

pub mod category;
pub mod expense;
pub mod links;
pub mod product;
pub mod report;
pub mod shopping;
pub mod supplier;

/// Outcome of an insert that tolerates name collisions.
///
/// Callers that need find-or-create semantics reuse the model either way;
/// callers that wanted a fresh row check [`InsertOutcome::is_created`] and
/// report "already exists" to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    /// A new row was inserted.
    Created(T),
    /// A row with that name already existed; nothing was written.
    AlreadyExists(T),
}

impl<T> InsertOutcome<T> {
    /// The inserted or pre-existing model.
    pub fn model(&self) -> &T {
        match self {
            Self::Created(model) | Self::AlreadyExists(model) => model,
        }
    }

    /// Consumes the outcome, yielding the model.
    pub fn into_model(self) -> T {
        match self {
            Self::Created(model) | Self::AlreadyExists(model) => model,
        }
    }

    /// True when a new row was actually inserted.
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
