//! # karaoke-queue
//!
//! Admin queue client for a karaoke song-request service.
//!
//! The crate keeps a local copy of every song request consistent with the
//! server: it loads a REST snapshot, reconciles it with the real-time event
//! stream pushed over WebSocket, and projects the result into the buckets
//! staff work from (pending, on stage, finished). Staff commands are sent
//! over REST and take effect locally only when the server broadcasts the
//! resulting event.
//!
//! ## Architecture
//!
//! ```text
//! Server (REST + WebSocket)
//!     │
//!     ├── HttpBackend (api/)       snapshot fetch, commands
//!     ├── PushClient (ws/)         push frames → QueueEvent
//!     │
//!     ├── EventBus (domain/)
//!     │
//!     ├── AdminQueue (service/)    driver task, QueueState
//!     │
//!     ├── RequestCollection (domain/)
//!     └── QueueView (domain/)      pending, on stage, finished
//! ```

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
