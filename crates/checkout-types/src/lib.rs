//! Common types for the checkout wizard.
//!
//! This crate defines the data model shared by configuration, the wizard core
//! and the command-line driver: field state, form trees, validation rules,
//! step identifiers, cart items, the order summary and session events.

/// Session events for observers.
pub mod events;
/// Field values and per-field interaction state.
pub mod field;
/// Grouped forms and dynamic field arrays.
pub mod form;
/// Cart items, order summary and currency rounding.
pub mod order;
/// Validation rules, schemas and results.
pub mod validation;
/// Step identifiers and enumerated wizard choices.
pub mod wizard;

// Re-export all types for convenient access
pub use events::*;
pub use field::*;
pub use form::*;
pub use order::*;
pub use validation::*;
pub use wizard::*;
