//! Transient user-facing notices.
//!
//! Every failure the admin queue catches at an operation boundary becomes a
//! [`Notice`], as do the reconciliation outcomes worth telling the operator
//! about. Bursts of new requests are coalesced by [`ArrivalBatcher`] into a
//! single notice.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::{Reconciled, RequestStatus};
use crate::error::QueueError;

/// Visual weight of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Something good happened.
    Success,
    /// Destructive change or rejected input.
    Warning,
    /// An operation failed.
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// How prominently to show the message.
    pub severity: Severity,
    /// Human-readable text.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Builds the notice for a failed operation.
    #[must_use]
    pub fn from_error(error: &QueueError) -> Self {
        let severity = match error {
            QueueError::ConfirmationRequired | QueueError::Cancelled => Severity::Warning,
            _ => Severity::Error,
        };
        Self::new(severity, error.to_string())
    }

    /// Builds the notice announcing a reconciled event, if it deserves one.
    ///
    /// `Inserted` is not announced here; arrivals go through
    /// [`ArrivalBatcher`].
    #[must_use]
    pub fn for_reconciled(outcome: Reconciled) -> Option<Self> {
        match outcome {
            Reconciled::Updated(status) => Some(Self::status_changed(status)),
            Reconciled::Removed => Some(Self::new(Severity::Warning, "Request deleted")),
            Reconciled::Cleared => {
                Some(Self::new(Severity::Warning, "All requests were deleted"))
            }
            Reconciled::Inserted | Reconciled::Replaced | Reconciled::Ignored => None,
        }
    }

    fn status_changed(status: RequestStatus) -> Self {
        Self::new(Severity::Info, format!("Status: {}", status.label()))
    }

    /// Builds the notice announcing `count` new requests.
    #[must_use]
    pub fn arrivals(count: u32) -> Self {
        let message = if count == 1 {
            "1 new request".to_string()
        } else {
            format!("{count} new requests")
        };
        Self::new(Severity::Success, message)
    }
}

/// Coalesces new-request notices that arrive within one window.
///
/// The first arrival opens the window; arrivals before it closes only bump
/// the count. When the window closes, [`ArrivalBatcher::flush`] yields one
/// notice for the whole burst.
#[derive(Debug)]
pub struct ArrivalBatcher {
    window: Duration,
    count: u32,
    deadline: Option<Instant>,
}

impl ArrivalBatcher {
    /// Creates a batcher with the given window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            count: 0,
            deadline: None,
        }
    }

    /// Records one arrival at `now`.
    pub fn record(&mut self, now: Instant) {
        self.count = self.count.saturating_add(1);
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// Returns when the open window closes, if one is open.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Closes the window if it has expired at `now`, returning the batched
    /// notice.
    pub fn flush(&mut self, now: Instant) -> Option<Notice> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        let count = std::mem::take(&mut self.count);
        self.deadline = None;
        (count > 0).then(|| Notice::arrivals(count))
    }

    /// Drops any open window without producing a notice.
    pub fn reset(&mut self) {
        self.count = 0;
        self.deadline = None;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(700);

    #[test]
    fn burst_yields_single_notice() {
        let start = Instant::now();
        let mut batcher = ArrivalBatcher::new(WINDOW);
        batcher.record(start);
        batcher.record(start + Duration::from_millis(100));
        batcher.record(start + Duration::from_millis(650));

        assert!(batcher.flush(start + Duration::from_millis(699)).is_none());
        let Some(notice) = batcher.flush(start + WINDOW) else {
            panic!("window should have closed");
        };
        assert_eq!(notice, Notice::new(Severity::Success, "3 new requests"));
        assert!(batcher.deadline().is_none());
        assert!(batcher.flush(start + WINDOW * 2).is_none());
    }

    #[test]
    fn window_opens_at_first_arrival() {
        let start = Instant::now();
        let mut batcher = ArrivalBatcher::new(WINDOW);
        assert!(batcher.deadline().is_none());
        batcher.record(start);
        batcher.record(start + Duration::from_millis(500));
        assert_eq!(batcher.deadline(), Some(start + WINDOW));
    }

    #[test]
    fn single_arrival_is_singular() {
        assert_eq!(Notice::arrivals(1).message, "1 new request");
    }

    #[test]
    fn reset_discards_open_window() {
        let start = Instant::now();
        let mut batcher = ArrivalBatcher::new(WINDOW);
        batcher.record(start);
        batcher.reset();
        assert!(batcher.flush(start + WINDOW).is_none());
    }

    #[test]
    fn reconciled_outcomes_map_to_notices() {
        let Some(update) = Notice::for_reconciled(Reconciled::Updated(RequestStatus::OnStage))
        else {
            panic!("status changes are announced");
        };
        assert_eq!(update.severity, Severity::Info);
        assert_eq!(update.message, "Status: On stage");
        assert!(Notice::for_reconciled(Reconciled::Ignored).is_none());
        assert!(Notice::for_reconciled(Reconciled::Inserted).is_none());
        assert_eq!(
            Notice::for_reconciled(Reconciled::Cleared).map(|n| n.severity),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn guard_violation_is_a_warning() {
        let notice = Notice::from_error(&QueueError::ConfirmationRequired);
        assert_eq!(notice.severity, Severity::Warning);
        let notice = Notice::from_error(&QueueError::Timeout);
        assert_eq!(notice.severity, Severity::Error);
    }
}
