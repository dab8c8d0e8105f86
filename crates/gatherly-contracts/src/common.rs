// Common DTOs for the public API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code.
    pub status: u16,
    /// Request path the error occurred on.
    pub path: String,
    /// Fixed human-readable message.
    pub message: String,
}

/// Response of `POST /events/sweep`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    /// Number of expired events deleted.
    pub deleted: u64,
}
