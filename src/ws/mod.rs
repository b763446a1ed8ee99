//! WebSocket layer: the push channel client and its frame format.
//!
//! The server pushes queue events over a single WebSocket at `/ws`. The
//! client identifies as an admin, subscribes to the requests topic, and
//! republishes every decoded event on the [`crate::domain::EventBus`].

pub mod connection;
pub mod messages;

pub use connection::PushClient;
pub use messages::PushFrame;
