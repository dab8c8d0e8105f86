// Storage layer for the Gatherly events service
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// The service layer talks to StorageBackend only; the concrete backend is
// picked from the environment at startup.

pub mod backend;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
