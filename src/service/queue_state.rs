//! Synchronous core of the admin queue.
//!
//! [`QueueState`] owns the request collection and decides, for every
//! snapshot response and push event, whether and how it is applied. It does
//! no I/O; [`super::AdminQueue`] feeds it from the network.
//!
//! # Snapshot/event race
//!
//! The snapshot response and the push stream are not ordered relative to
//! each other. The queue subscribes before it starts fetching, and while a
//! load is in flight every event is buffered in arrival order. When the
//! snapshot lands it replaces the collection and the buffer is replayed on
//! top. Each event kind is an idempotent setter keyed by identifier, so
//! replaying one the snapshot already reflects is harmless, and the result
//! equals the snapshot plus every later event.
//!
//! Each load carries a generation number. A response from an older
//! generation, or one arriving after unmount, is discarded.

use crate::domain::{QueueEvent, QueueView, Reconciled, RequestCollection, SongRequest};
use crate::error::QueueError;

/// Identifies one snapshot load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Returns the generation this ticket was issued for.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// What happened to a snapshot response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The snapshot replaced the collection; buffered events were replayed.
    Applied {
        /// Number of requests in the snapshot after de-duplication.
        loaded: usize,
        /// Outcome of each replayed event, in replay order.
        replayed: Vec<Reconciled>,
    },
    /// The load failed; the collection kept its previous contents and
    /// buffered events were applied to it.
    Failed {
        /// Why the load failed.
        error: QueueError,
        /// Outcome of each replayed event, in replay order.
        replayed: Vec<Reconciled>,
    },
    /// The response belonged to a superseded load or arrived after unmount.
    Stale,
}

/// What happened to a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Applied to the collection immediately.
    Applied(Reconciled),
    /// Held until the in-flight snapshot lands.
    Buffered,
    /// Received after unmount; discarded.
    Dropped,
}

/// Collection plus load bookkeeping for one mounted admin queue.
#[derive(Debug)]
pub struct QueueState {
    collection: RequestCollection,
    generation: u64,
    loading: bool,
    buffer: Vec<QueueEvent>,
    mounted: bool,
}

impl QueueState {
    /// Creates the state of a freshly mounted queue with an empty
    /// collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collection: RequestCollection::new(),
            generation: 0,
            loading: false,
            buffer: Vec::new(),
            mounted: true,
        }
    }

    /// Starts a snapshot load and returns its ticket.
    ///
    /// A load started while another is in flight supersedes it. Events
    /// buffered so far stay buffered: they are still newer than whatever
    /// the earlier snapshot would have held.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.loading = self.mounted;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Applies the response of the load identified by `ticket`.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<SongRequest>, QueueError>,
    ) -> LoadOutcome {
        if !self.mounted || ticket.generation != self.generation || !self.loading {
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                self.collection.replace_all(snapshot);
                let loaded = self.collection.len();
                let replayed = self.replay();
                LoadOutcome::Applied { loaded, replayed }
            }
            Err(error) => {
                let replayed = self.replay();
                LoadOutcome::Failed { error, replayed }
            }
        }
    }

    fn replay(&mut self) -> Vec<Reconciled> {
        std::mem::take(&mut self.buffer)
            .iter()
            .map(|event| self.collection.apply(event))
            .collect()
    }

    /// Handles one push event.
    pub fn on_event(&mut self, event: QueueEvent) -> EventOutcome {
        if !self.mounted {
            return EventOutcome::Dropped;
        }
        if self.loading {
            self.buffer.push(event);
            return EventOutcome::Buffered;
        }
        EventOutcome::Applied(self.collection.apply(&event))
    }

    /// Marks the queue unmounted. Pending and future responses and events
    /// are discarded.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
        self.generation = self.generation.wrapping_add(1);
        self.buffer.clear();
    }

    /// Returns `true` while a snapshot load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns `true` until [`QueueState::unmount`] is called.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns the number of events waiting for the in-flight snapshot.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the current collection.
    #[must_use]
    pub const fn collection(&self) -> &RequestCollection {
        &self.collection
    }

    /// Projects the current collection into display buckets.
    #[must_use]
    pub fn view(&self) -> QueueView {
        QueueView::project(&self.collection)
    }
}

impl Default for QueueState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Deletion, RequestId, RequestStatus, StatusChange};

    fn req(id: &str) -> SongRequest {
        SongRequest::new(id, "Ana", "Abba", "Waterloo")
    }

    fn ids(state: &QueueState) -> Vec<&str> {
        state.collection().iter().map(|r| r.id.as_str()).collect()
    }

    fn status(id: &str, status: RequestStatus) -> QueueEvent {
        QueueEvent::StatusChanged(StatusChange {
            id: RequestId::new(id),
            status,
            updated_at: None,
        })
    }

    #[test]
    fn events_apply_directly_when_idle() {
        let mut state = QueueState::new();
        let outcome = state.on_event(QueueEvent::Created(req("a")));
        assert_eq!(outcome, EventOutcome::Applied(Reconciled::Inserted));
        assert_eq!(ids(&state), ["a"]);
    }

    #[test]
    fn snapshot_replaces_collection() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.finish_load(ticket, Ok(vec![req("1")]));

        let ticket = state.begin_load();
        let outcome = state.finish_load(ticket, Ok(vec![req("2")]));
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                loaded: 1,
                replayed: Vec::new()
            }
        );
        assert_eq!(ids(&state), ["2"]);
    }

    #[test]
    fn event_during_load_is_replayed_after_snapshot() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();

        // A request created after the server built the snapshot.
        assert_eq!(
            state.on_event(QueueEvent::Created(req("new"))),
            EventOutcome::Buffered
        );
        assert_eq!(state.buffered(), 1);

        let outcome = state.finish_load(ticket, Ok(vec![req("old")]));
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                loaded: 1,
                replayed: vec![Reconciled::Inserted]
            }
        );
        assert_eq!(ids(&state), ["new", "old"]);
        assert!(!state.is_loading());
        assert_eq!(state.buffered(), 0);
    }

    #[test]
    fn replay_of_event_already_in_snapshot_converges() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.on_event(QueueEvent::Created(req("a")));
        state.on_event(status("a", RequestStatus::OnStage));
        state.on_event(QueueEvent::Deleted(Deletion {
            id: RequestId::new("gone"),
        }));

        // Snapshot taken after the create and the delete, before the
        // status change.
        let outcome = state.finish_load(ticket, Ok(vec![req("a")]));
        let LoadOutcome::Applied { replayed, .. } = outcome else {
            panic!("snapshot must apply");
        };
        assert_eq!(
            replayed,
            [
                Reconciled::Replaced,
                Reconciled::Updated(RequestStatus::OnStage),
                Reconciled::Ignored
            ]
        );
        assert_eq!(ids(&state), ["a"]);
        let Some(a) = state.collection().get(&RequestId::new("a")) else {
            panic!("a must exist");
        };
        assert_eq!(a.status, RequestStatus::OnStage);
    }

    #[test]
    fn failed_load_keeps_previous_collection() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.finish_load(ticket, Ok(vec![req("a"), req("b")]));
        let before = state.collection().clone();

        let ticket = state.begin_load();
        let outcome = state.finish_load(ticket, Err(QueueError::Timeout));
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                error: QueueError::Timeout,
                replayed: Vec::new()
            }
        );
        assert_eq!(state.collection(), &before);
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_load_still_applies_buffered_events() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.finish_load(ticket, Ok(vec![req("a")]));

        let ticket = state.begin_load();
        state.on_event(QueueEvent::Created(req("b")));
        let outcome = state.finish_load(ticket, Err(QueueError::Network("reset".to_string())));
        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        assert_eq!(ids(&state), ["b", "a"]);
    }

    #[test]
    fn superseded_response_is_stale() {
        let mut state = QueueState::new();
        let first = state.begin_load();
        let second = state.begin_load();

        assert_eq!(state.finish_load(first, Ok(vec![req("old")])), LoadOutcome::Stale);
        assert!(state.is_loading());
        assert!(state.collection().is_empty());

        let outcome = state.finish_load(second, Ok(vec![req("fresh")]));
        assert!(matches!(outcome, LoadOutcome::Applied { loaded: 1, .. }));
        assert_eq!(ids(&state), ["fresh"]);
    }

    #[test]
    fn buffer_survives_superseding_load() {
        let mut state = QueueState::new();
        let _first = state.begin_load();
        state.on_event(QueueEvent::Created(req("x")));
        let second = state.begin_load();
        state.finish_load(second, Ok(vec![req("y")]));
        assert_eq!(ids(&state), ["x", "y"]);
    }

    #[test]
    fn response_after_unmount_is_ignored() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.unmount();
        assert_eq!(state.finish_load(ticket, Ok(vec![req("late")])), LoadOutcome::Stale);
        assert!(state.collection().is_empty());
        assert_eq!(state.on_event(QueueEvent::ClearedAll), EventOutcome::Dropped);
        assert!(!state.is_mounted());
    }

    #[test]
    fn duplicate_response_for_same_ticket_is_stale() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.finish_load(ticket, Ok(vec![req("a")]));
        assert_eq!(state.finish_load(ticket, Ok(vec![req("b")])), LoadOutcome::Stale);
        assert_eq!(ids(&state), ["a"]);
    }

    #[test]
    fn view_reflects_collection() {
        let mut state = QueueState::new();
        let ticket = state.begin_load();
        state.finish_load(ticket, Ok(vec![req("a"), req("b")]));
        state.on_event(status("b", RequestStatus::Done));
        let view = state.view();
        assert_eq!(view.counts.pending, 1);
        assert_eq!(view.counts.done, 1);
        assert_eq!(view.finished.len(), 1);
    }
}
