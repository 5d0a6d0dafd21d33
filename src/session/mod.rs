//! Session layer - the observable state machines behind the screens.
//!
//! Sessions hold the user's current selections as watch channels, recombine
//! them whenever any one changes, and publish derived results. They are the
//! crate's equivalent of view-models: pure composition over the core layer,
//! no business rules of their own.

pub mod expenses;
pub mod presets;
pub mod shopping;
