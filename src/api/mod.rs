//! REST layer: admin endpoint client, DTOs, and the backend seam.
//!
//! All admin endpoints live under `/api/admin/requests`.

pub mod backend;
pub mod client;
pub mod dto;

pub use backend::QueueBackend;
pub use client::HttpBackend;
