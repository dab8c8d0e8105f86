// Public contracts for the Gatherly events API
// This crate defines the wire DTOs plus the event aggregate predicates
// (capacity, membership, date handling) shared by the service and storage layers.

pub mod common;
pub mod event;
pub mod form;

pub use common::*;
pub use event::*;
pub use form::*;
