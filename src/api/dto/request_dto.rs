//! DTOs for the admin request endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{RequestStatus, SongRequest};

/// Response of `GET /api/admin/requests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// Every request currently stored, in server order. A missing field
    /// reads as an empty list.
    #[serde(default)]
    pub data: Vec<SongRequest>,
}

/// Body of `PATCH /api/admin/requests/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeBody {
    /// Requested new status.
    pub status: RequestStatus,
}
