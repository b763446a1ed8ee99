//! The seam between the admin queue and the server's REST surface.

use std::future::Future;

use crate::domain::{RequestId, RequestStatus, SongRequest};
use crate::error::QueueError;

/// Admin operations the queue needs from the server.
///
/// [`crate::api::HttpBackend`] implements this over HTTP. None of the
/// commands return the mutated entity: the server broadcasts the resulting
/// push event, and that event is the only way the local collection changes.
pub trait QueueBackend: Send + Sync + 'static {
    /// Fetches every request currently stored on the server.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<SongRequest>, QueueError>> + Send;

    /// Asks the server to move a request to `status`.
    fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Asks the server to delete one request.
    fn delete_one(&self, id: &RequestId) -> impl Future<Output = Result<(), QueueError>> + Send;

    /// Asks the server to delete every request.
    fn delete_all(&self) -> impl Future<Output = Result<(), QueueError>> + Send;
}
