// Gatherly events API
//
// Thin HTTP layer: every handler maps to exactly one service call and
// translates domain errors to HTTP statuses. All logic lives in
// services::EventService.

pub mod error;
pub mod events;
pub mod services;

pub use services::EventService;
