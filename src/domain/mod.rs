//! Domain layer: request model, event reconciliation, and view projection.
//!
//! This module contains the client-side domain model: request identity and
//! fields, the push events that mutate the collection, the reconciling
//! collection itself, the pure projection into display buckets, the event
//! bus that fans push events out to listeners, and operator notices.

pub mod event_bus;
pub mod notice;
pub mod ordering;
pub mod queue_event;
pub mod queue_view;
pub mod request_collection;
pub mod request_id;
pub mod song_request;

pub use event_bus::{Delivery, EventBus, Subscription};
pub use notice::{ArrivalBatcher, Notice, Severity};
pub use ordering::{OrderField, order_key};
pub use queue_event::{Deletion, QueueEvent, StatusChange};
pub use queue_view::{QueueView, StatusCounts};
pub use request_collection::{Reconciled, RequestCollection, reduce};
pub use request_id::RequestId;
pub use song_request::{Performer, RequestStatus, SongRequest, Source};
