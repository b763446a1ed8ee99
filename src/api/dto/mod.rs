//! Wire DTOs for the admin REST endpoints.

pub mod common_dto;
pub mod request_dto;

pub use common_dto::{ApiErrorBody, error_message};
pub use request_dto::{SnapshotResponse, StatusChangeBody};
