//! Client-side cache of the request collection and the event reducer.
//!
//! [`RequestCollection`] is the flat, process-local copy of the server's
//! requests. It knows nothing about view buckets: it only guarantees that
//! each identifier appears at most once and that an event touches nothing
//! but the entry it names.
//!
//! Entries are kept in arrival order (newest `Created` first, snapshot order
//! otherwise). Display order is derived later by [`super::QueueView`].

use super::{QueueEvent, RequestId, RequestStatus, SongRequest};

/// Outcome of applying one [`QueueEvent`] to a [`RequestCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// A new entry was prepended.
    Inserted,
    /// A `Created` event named an identifier already present; that entry
    /// was overwritten in place.
    Replaced,
    /// An entry's status changed to the given value.
    Updated(RequestStatus),
    /// An entry was removed.
    Removed,
    /// The collection was emptied.
    Cleared,
    /// The event named an unknown identifier and changed nothing.
    Ignored,
}

impl Reconciled {
    /// Returns `true` if the collection changed.
    #[must_use]
    pub const fn changed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Flat collection of song requests, unique by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCollection {
    entries: Vec<SongRequest>,
}

impl RequestCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a server snapshot.
    ///
    /// Keeps the first occurrence of each identifier; later duplicates are
    /// dropped.
    #[must_use]
    pub fn from_snapshot(snapshot: Vec<SongRequest>) -> Self {
        let mut entries: Vec<SongRequest> = Vec::with_capacity(snapshot.len());
        for request in snapshot {
            if entries.iter().any(|existing| existing.id == request.id) {
                tracing::warn!(id = %request.id, "duplicate id in snapshot, keeping first");
                continue;
            }
            entries.push(request);
        }
        Self { entries }
    }

    /// Replaces the whole collection with a snapshot. Nothing from the
    /// previous contents survives.
    pub fn replace_all(&mut self, snapshot: Vec<SongRequest>) {
        *self = Self::from_snapshot(snapshot);
    }

    /// Applies one event in place.
    pub fn apply(&mut self, event: &QueueEvent) -> Reconciled {
        match event {
            QueueEvent::Created(request) => {
                if let Some(existing) = self.get_mut(&request.id) {
                    *existing = request.clone();
                    Reconciled::Replaced
                } else {
                    self.entries.insert(0, request.clone());
                    Reconciled::Inserted
                }
            }
            QueueEvent::StatusChanged(change) => {
                let Some(existing) = self.get_mut(&change.id) else {
                    return Reconciled::Ignored;
                };
                existing.status = change.status;
                if let Some(updated_at) = &change.updated_at {
                    existing.updated_at = Some(updated_at.clone());
                }
                Reconciled::Updated(change.status)
            }
            QueueEvent::Deleted(deletion) => {
                let before = self.entries.len();
                self.entries.retain(|entry| entry.id != deletion.id);
                if self.entries.len() == before {
                    Reconciled::Ignored
                } else {
                    Reconciled::Removed
                }
            }
            QueueEvent::ClearedAll => {
                self.entries.clear();
                Reconciled::Cleared
            }
        }
    }

    /// Returns the entry with the given identifier.
    #[must_use]
    pub fn get(&self, id: &RequestId) -> Option<&SongRequest> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    fn get_mut(&mut self, id: &RequestId) -> Option<&mut SongRequest> {
        self.entries.iter_mut().find(|entry| &entry.id == id)
    }

    /// Returns `true` if an entry with the given identifier exists.
    #[must_use]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates entries in collection order.
    pub fn iter(&self) -> std::slice::Iter<'_, SongRequest> {
        self.entries.iter()
    }

    /// Returns the entries as a slice in collection order.
    #[must_use]
    pub fn as_slice(&self) -> &[SongRequest] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RequestCollection {
    type Item = &'a SongRequest;
    type IntoIter = std::slice::Iter<'a, SongRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Pure reducer: returns the collection that results from applying `event`
/// to `collection`.
#[must_use]
pub fn reduce(mut collection: RequestCollection, event: &QueueEvent) -> RequestCollection {
    collection.apply(event);
    collection
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Deletion, StatusChange};

    fn req(id: &str) -> SongRequest {
        SongRequest::new(id, "Ana", "Abba", "Waterloo")
    }

    fn ids(collection: &RequestCollection) -> Vec<&str> {
        collection.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn created_prepends() {
        let collection = RequestCollection::from_snapshot(vec![req("a")]);
        let collection = reduce(collection, &QueueEvent::Created(req("b")));
        assert_eq!(ids(&collection), ["b", "a"]);
    }

    #[test]
    fn created_twice_keeps_one_entry() {
        let event = QueueEvent::Created(req("a"));
        let mut collection = RequestCollection::new();
        assert_eq!(collection.apply(&event), Reconciled::Inserted);
        assert_eq!(collection.apply(&event), Reconciled::Replaced);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn created_for_known_id_overwrites_in_place() {
        let mut collection = RequestCollection::from_snapshot(vec![req("a"), req("b")]);
        let mut fresh = req("b");
        fresh.title = "Dancing Queen".to_string();
        collection.apply(&QueueEvent::Created(fresh));
        assert_eq!(ids(&collection), ["a", "b"]);
        let Some(b) = collection.get(&RequestId::new("b")) else {
            panic!("b must exist");
        };
        assert_eq!(b.title, "Dancing Queen");
    }

    #[test]
    fn delete_of_unknown_id_is_noop() {
        let collection = RequestCollection::from_snapshot(vec![req("a"), req("b")]);
        let before = collection.clone();
        let mut after = collection;
        let outcome = after.apply(&QueueEvent::Deleted(Deletion {
            id: RequestId::new("zzz"),
        }));
        assert_eq!(outcome, Reconciled::Ignored);
        assert_eq!(after, before);
    }

    #[test]
    fn delete_removes_only_named_entry() {
        let collection = RequestCollection::from_snapshot(vec![req("a"), req("b"), req("c")]);
        let collection = reduce(
            collection,
            &QueueEvent::Deleted(Deletion {
                id: RequestId::new("b"),
            }),
        );
        assert_eq!(ids(&collection), ["a", "c"]);
    }

    #[test]
    fn status_update_in_place_preserves_other_fields() {
        let mut original = req("1");
        original.notes = Some("slow version".to_string());
        original.created_at = Some("2024-01-01T20:00:00Z".to_string());
        let collection = RequestCollection::from_snapshot(vec![original.clone()]);

        let collection = reduce(
            collection,
            &QueueEvent::StatusChanged(StatusChange {
                id: RequestId::new("1"),
                status: RequestStatus::OnStage,
                updated_at: None,
            }),
        );

        let mut expected = original;
        expected.status = RequestStatus::OnStage;
        assert_eq!(collection.as_slice(), [expected]);
    }

    #[test]
    fn status_update_records_updated_at_when_present() {
        let mut collection = RequestCollection::from_snapshot(vec![req("1")]);
        let outcome = collection.apply(&QueueEvent::StatusChanged(StatusChange {
            id: RequestId::new("1"),
            status: RequestStatus::Done,
            updated_at: Some("2024-01-01T21:00:00Z".to_string()),
        }));
        assert_eq!(outcome, Reconciled::Updated(RequestStatus::Done));
        let Some(entry) = collection.get(&RequestId::new("1")) else {
            panic!("entry must exist");
        };
        assert_eq!(entry.updated_at.as_deref(), Some("2024-01-01T21:00:00Z"));
    }

    #[test]
    fn status_update_for_unknown_id_is_ignored() {
        let mut collection = RequestCollection::from_snapshot(vec![req("1")]);
        let outcome = collection.apply(&QueueEvent::StatusChanged(StatusChange {
            id: RequestId::new("2"),
            status: RequestStatus::Done,
            updated_at: None,
        }));
        assert_eq!(outcome, Reconciled::Ignored);
        assert!(!outcome.changed());
        assert_eq!(collection.as_slice(), [req("1")]);
    }

    #[test]
    fn clear_all_empties() {
        let collection = RequestCollection::from_snapshot(vec![req("a"), req("b")]);
        let collection = reduce(collection, &QueueEvent::ClearedAll);
        assert!(collection.is_empty());
    }

    #[test]
    fn snapshot_replaces_not_merges() {
        let mut collection = RequestCollection::from_snapshot(vec![req("1")]);
        collection.replace_all(vec![req("2")]);
        assert_eq!(ids(&collection), ["2"]);
        assert!(!collection.contains(&RequestId::new("1")));
    }

    #[test]
    fn snapshot_drops_duplicate_ids() {
        let mut second = req("a");
        second.title = "duplicate".to_string();
        let collection = RequestCollection::from_snapshot(vec![req("a"), req("b"), second]);
        assert_eq!(ids(&collection), ["a", "b"]);
        let Some(a) = collection.get(&RequestId::new("a")) else {
            panic!("a must exist");
        };
        assert_eq!(a.title, "Waterloo");
    }
}
