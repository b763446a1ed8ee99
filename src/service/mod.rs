//! Service layer: the admin queue and its state machine.

pub mod admin_queue;
pub mod queue_state;

pub use admin_queue::{
    AdminQueue, AdminQueueHandle, DeletePrompt, QueueOptions, confirmation_matches,
};
pub use queue_state::{EventOutcome, LoadOutcome, LoadTicket, QueueState};
