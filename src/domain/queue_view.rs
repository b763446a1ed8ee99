//! Projection of the request collection into display buckets.

use serde::Serialize;

use super::ordering::{OrderField, order_key};
use super::{RequestCollection, RequestStatus, SongRequest};

/// Number of requests in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Requests waiting in the queue.
    pub pending: usize,
    /// Requests being performed.
    pub on_stage: usize,
    /// Performed requests.
    pub done: usize,
    /// Requests whose singer did not show up.
    pub no_show: usize,
}

impl StatusCounts {
    /// Counts statuses over every entry of `requests`.
    #[must_use]
    pub fn tally<'a>(requests: impl IntoIterator<Item = &'a SongRequest>) -> Self {
        let mut counts = Self::default();
        for request in requests {
            match request.status {
                RequestStatus::Pending => counts.pending += 1,
                RequestStatus::OnStage => counts.on_stage += 1,
                RequestStatus::Done => counts.done += 1,
                RequestStatus::NoShow => counts.no_show += 1,
            }
        }
        counts
    }

    /// Returns the count for one status.
    #[must_use]
    pub const fn get(&self, status: RequestStatus) -> usize {
        match status {
            RequestStatus::Pending => self.pending,
            RequestStatus::OnStage => self.on_stage,
            RequestStatus::Done => self.done,
            RequestStatus::NoShow => self.no_show,
        }
    }

    /// Returns the total number of requests counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.on_stage + self.done + self.no_show
    }
}

/// Display-ready view of the admin queue.
///
/// - `pending` and `on_stage` are FIFO: oldest creation first.
/// - `done` and `no_show` hold the raw status partition; `finished` holds
///   both, most recently changed first, ties in collection order.
///
/// All sorts are stable, so requests with equal keys keep the relative
/// order they have in the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueView {
    /// Waiting requests, oldest first.
    pub pending: Vec<SongRequest>,
    /// Requests on stage, oldest first.
    pub on_stage: Vec<SongRequest>,
    /// Performed requests, in collection order.
    pub done: Vec<SongRequest>,
    /// No-show requests, in collection order.
    pub no_show: Vec<SongRequest>,
    /// `done` and `no_show` merged, most recent change first.
    pub finished: Vec<SongRequest>,
    /// Per-status counts over the whole collection.
    pub counts: StatusCounts,
}

impl QueueView {
    /// Derives the view from the current collection.
    #[must_use]
    pub fn project(collection: &RequestCollection) -> Self {
        let mut view = Self {
            counts: StatusCounts::tally(collection),
            ..Self::default()
        };

        for request in collection {
            let bucket = match request.status {
                RequestStatus::Pending => &mut view.pending,
                RequestStatus::OnStage => &mut view.on_stage,
                RequestStatus::Done => &mut view.done,
                RequestStatus::NoShow => &mut view.no_show,
            };
            bucket.push(request.clone());
        }

        view.pending.sort_by_key(|r| order_key(r, OrderField::Created));
        view.on_stage.sort_by_key(|r| order_key(r, OrderField::Created));

        view.finished = collection
            .iter()
            .filter(|r| r.status.is_finished())
            .cloned()
            .collect();
        view.finished
            .sort_by_key(|r| std::cmp::Reverse(order_key(r, OrderField::Updated)));

        view
    }

    /// Returns the raw partition bucket for `status`.
    #[must_use]
    pub fn bucket(&self, status: RequestStatus) -> &[SongRequest] {
        match status {
            RequestStatus::Pending => &self.pending,
            RequestStatus::OnStage => &self.on_stage,
            RequestStatus::Done => &self.done,
            RequestStatus::NoShow => &self.no_show,
        }
    }

    /// Returns `true` when no bucket holds a request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.total() == 0
    }
}
