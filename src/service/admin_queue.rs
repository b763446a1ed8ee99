//! Admin queue: snapshot loading, live reconciliation, and commands.
//!
//! [`AdminQueue::mount`] subscribes to the [`EventBus`], starts the first
//! snapshot load, and spawns a single driver task that owns the
//! [`QueueState`]. The driver is the only code that mutates the collection,
//! so no locks are involved: it runs a `select!` loop over push events,
//! snapshot responses, refresh/unmount requests, and the notice batching
//! timer, and publishes a fresh [`QueueView`] after every change.
//!
//! Commands (status change, delete one, delete all) are dispatched from the
//! caller's task through [`AdminQueueHandle`]. They never touch local state:
//! the server broadcasts the resulting event and the driver applies it like
//! any other, so every connected admin converges on the same stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::queue_state::{EventOutcome, LoadOutcome, LoadTicket, QueueState};
use crate::api::QueueBackend;
use crate::config::{ClientConfig, DEFAULT_DELETE_ALL_PHRASE};
use crate::domain::{
    ArrivalBatcher, Delivery, EventBus, Notice, QueueEvent, QueueView, Reconciled, RequestId,
    RequestStatus, SongRequest, Subscription,
};
use crate::error::QueueError;

/// Tunables of a mounted admin queue.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Window over which new-request notices are coalesced.
    pub notice_batch_window: Duration,
    /// Phrase that unlocks delete-all.
    pub delete_all_phrase: String,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            notice_batch_window: Duration::from_millis(700),
            delete_all_phrase: DEFAULT_DELETE_ALL_PHRASE.to_string(),
        }
    }
}

impl From<&ClientConfig> for QueueOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            notice_batch_window: config.notice_batch_window,
            delete_all_phrase: config.delete_all_phrase.clone(),
        }
    }
}

/// Returns `true` when `typed` unlocks delete-all for `phrase`.
///
/// Surrounding whitespace and letter case are ignored.
#[must_use]
pub fn confirmation_matches(typed: &str, phrase: &str) -> bool {
    let expected = phrase.trim().to_uppercase();
    !expected.is_empty() && typed.trim().to_uppercase() == expected
}

/// What the operator is asked before a single delete is dispatched.
#[derive(Debug, Clone)]
pub struct DeletePrompt {
    /// Request to delete.
    pub id: RequestId,
    /// The request as currently shown, if it is in the local view.
    pub request: Option<SongRequest>,
}

impl DeletePrompt {
    /// Returns the confirmation question for the operator.
    #[must_use]
    pub fn question(&self) -> String {
        match &self.request {
            Some(r) => format!(
                "Delete the request from \"{}\" - {} / {}?",
                r.full_name, r.artist, r.title
            ),
            None => format!("Delete request {}?", self.id),
        }
    }
}

/// Requests from handles to the driver task.
#[derive(Debug)]
enum Control {
    Refresh,
    Unmount,
}

/// Entry point for mounting an admin queue.
#[derive(Debug)]
pub struct AdminQueue;

impl AdminQueue {
    /// Mounts an admin queue on `bus`, backed by `backend`.
    ///
    /// Subscribes to `bus` before the first snapshot fetch starts, so no
    /// event emitted after the fetch begins can be missed. Must be called
    /// within a Tokio runtime.
    ///
    /// Returns the handle and the stream of operator notices.
    pub fn mount<B: QueueBackend>(
        backend: Arc<B>,
        bus: &EventBus,
        options: QueueOptions,
    ) -> (AdminQueueHandle<B>, mpsc::UnboundedReceiver<Notice>) {
        let subscription = bus.subscribe();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(QueueView::default());

        let mut driver = Driver {
            backend: Arc::clone(&backend),
            state: QueueState::new(),
            subscription,
            channel_open: true,
            batcher: ArrivalBatcher::new(options.notice_batch_window),
            notices: notice_tx.clone(),
            view: view_tx,
            control: control_rx,
            load_tx,
            load_rx,
        };
        driver.start_load();
        tracing::info!("admin queue mounted");
        let task = tokio::spawn(driver.run());

        let handle = AdminQueueHandle {
            backend,
            notices: notice_tx,
            control: control_tx,
            view: view_rx,
            delete_all_phrase: options.delete_all_phrase,
            task: Some(task),
        };
        (handle, notice_rx)
    }
}

/// Caller-side handle of a mounted admin queue.
///
/// Dropping the handle unmounts the queue.
#[derive(Debug)]
pub struct AdminQueueHandle<B: QueueBackend> {
    backend: Arc<B>,
    notices: mpsc::UnboundedSender<Notice>,
    control: mpsc::UnboundedSender<Control>,
    view: watch::Receiver<QueueView>,
    delete_all_phrase: String,
    task: Option<JoinHandle<()>>,
}

impl<B: QueueBackend> AdminQueueHandle<B> {
    /// Returns the most recently published view.
    #[must_use]
    pub fn view(&self) -> QueueView {
        self.view.borrow().clone()
    }

    /// Returns a receiver that observes every published view.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<QueueView> {
        self.view.clone()
    }

    /// Starts a fresh snapshot load. The result arrives asynchronously;
    /// failures surface as notices.
    pub fn refresh(&self) {
        let _ = self.control.send(Control::Refresh);
    }

    /// Asks the server to move a request to `status`.
    ///
    /// Nothing changes locally until the server's `request:update` event
    /// arrives.
    ///
    /// # Errors
    ///
    /// Returns the [`QueueError`] reported by the backend; it is also sent
    /// as an error notice.
    pub async fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<(), QueueError> {
        tracing::debug!(%id, %status, "dispatching status change");
        let result = self.backend.set_status(id, status).await;
        self.report(result)
    }

    /// Asks the operator to confirm, then asks the server to delete one
    /// request.
    ///
    /// `confirm` receives the prompt (including the request as currently
    /// shown) and returns whether to proceed. Nothing changes locally until
    /// the server's `request:delete` event arrives.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Cancelled`] without dispatching if `confirm`
    /// declines, or the [`QueueError`] reported by the backend, which is
    /// also sent as an error notice.
    pub async fn delete_one<F>(&self, id: &RequestId, confirm: F) -> Result<(), QueueError>
    where
        F: FnOnce(&DeletePrompt) -> bool,
    {
        let prompt = DeletePrompt {
            id: id.clone(),
            request: self.find(id),
        };
        if !confirm(&prompt) {
            tracing::debug!(%id, "delete declined");
            return Err(QueueError::Cancelled);
        }
        tracing::debug!(%id, "dispatching delete");
        let result = self.backend.delete_one(id).await;
        self.report(result)
    }

    /// Asks the server to delete every request, provided `typed` matches the
    /// confirmation phrase.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ConfirmationRequired`] without dispatching when
    /// the phrase does not match, or the [`QueueError`] reported by the
    /// backend. Both are also sent as notices.
    pub async fn delete_all(&self, typed: &str) -> Result<(), QueueError> {
        if !confirmation_matches(typed, &self.delete_all_phrase) {
            return self.report(Err(QueueError::ConfirmationRequired));
        }
        tracing::info!("dispatching delete of all requests");
        let result = self.backend.delete_all().await;
        self.report(result)
    }

    /// Unmounts the queue and waits for the driver to stop.
    pub async fn unmount(mut self) {
        let _ = self.control.send(Control::Unmount);
        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            tracing::warn!(%error, "admin queue driver ended abnormally");
        }
    }

    fn find(&self, id: &RequestId) -> Option<SongRequest> {
        let view = self.view.borrow();
        RequestStatus::ALL
            .iter()
            .flat_map(|status| view.bucket(*status))
            .find(|r| &r.id == id)
            .cloned()
    }

    fn report(&self, result: Result<(), QueueError>) -> Result<(), QueueError> {
        if let Err(error) = &result {
            tracing::warn!(%error, code = error.error_code(), "admin command failed");
            let _ = self.notices.send(Notice::from_error(error));
        }
        result
    }
}

impl<B: QueueBackend> Drop for AdminQueueHandle<B> {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.control.send(Control::Unmount);
        }
    }
}

/// The task that owns the queue state.
struct Driver<B: QueueBackend> {
    backend: Arc<B>,
    state: QueueState,
    subscription: Subscription,
    channel_open: bool,
    batcher: ArrivalBatcher,
    notices: mpsc::UnboundedSender<Notice>,
    view: watch::Sender<QueueView>,
    control: mpsc::UnboundedReceiver<Control>,
    load_tx: mpsc::UnboundedSender<(LoadTicket, Result<Vec<SongRequest>, QueueError>)>,
    load_rx: mpsc::UnboundedReceiver<(LoadTicket, Result<Vec<SongRequest>, QueueError>)>,
}

impl<B: QueueBackend> std::fmt::Debug for Driver<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("state", &self.state)
            .field("channel_open", &self.channel_open)
            .finish_non_exhaustive()
    }
}

impl<B: QueueBackend> Driver<B> {
    async fn run(mut self) {
        loop {
            let flush_at = self.batcher.deadline();
            tokio::select! {
                control = self.control.recv() => match control {
                    Some(Control::Refresh) => self.start_load(),
                    Some(Control::Unmount) | None => break,
                },
                delivery = self.subscription.recv(), if self.channel_open => {
                    self.on_delivery(delivery);
                }
                Some((ticket, result)) = self.load_rx.recv() => {
                    self.on_load(ticket, result);
                }
                () = tokio::time::sleep_until(flush_at.unwrap_or_else(Instant::now)),
                    if flush_at.is_some() =>
                {
                    if let Some(notice) = self.batcher.flush(Instant::now()) {
                        self.notify(notice);
                    }
                }
            }
        }

        self.state.unmount();
        self.batcher.reset();
        tracing::info!("admin queue unmounted");
    }

    fn start_load(&mut self) {
        let ticket = self.state.begin_load();
        tracing::debug!(generation = ticket.generation(), "snapshot load started");
        let backend = Arc::clone(&self.backend);
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_snapshot().await;
            let _ = tx.send((ticket, result));
        });
    }

    fn on_load(&mut self, ticket: LoadTicket, result: Result<Vec<SongRequest>, QueueError>) {
        match self.state.finish_load(ticket, result) {
            LoadOutcome::Applied { loaded, replayed } => {
                tracing::info!(
                    generation = ticket.generation(),
                    loaded,
                    replayed = replayed.len(),
                    "snapshot applied"
                );
                self.announce_all(&replayed);
                self.publish();
            }
            LoadOutcome::Failed { error, replayed } => {
                tracing::warn!(%error, generation = ticket.generation(), "snapshot load failed");
                self.notify(Notice::from_error(&error));
                self.announce_all(&replayed);
                if replayed.iter().any(|outcome| outcome.changed()) {
                    self.publish();
                }
            }
            LoadOutcome::Stale => {
                tracing::debug!(generation = ticket.generation(), "stale snapshot ignored");
            }
        }
    }

    fn on_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Event(event) => self.on_event(event),
            Delivery::Lagged(missed) => {
                tracing::warn!(missed, "admin queue lagged behind event bus, reloading");
                self.start_load();
            }
            Delivery::Closed => {
                tracing::warn!("event bus closed, no further live updates");
                self.channel_open = false;
            }
        }
    }

    fn on_event(&mut self, event: QueueEvent) {
        let kind = event.event_type_str();
        match self.state.on_event(event) {
            EventOutcome::Applied(outcome) => {
                tracing::debug!(event = kind, ?outcome, "event reconciled");
                self.announce(outcome);
                if outcome.changed() {
                    self.publish();
                }
            }
            EventOutcome::Buffered => {
                tracing::debug!(event = kind, "event buffered until snapshot lands");
            }
            EventOutcome::Dropped => {}
        }
    }

    fn announce_all(&mut self, outcomes: &[Reconciled]) {
        for outcome in outcomes {
            self.announce(*outcome);
        }
    }

    fn announce(&mut self, outcome: Reconciled) {
        if outcome == Reconciled::Inserted {
            self.batcher.record(Instant::now());
        } else if let Some(notice) = Notice::for_reconciled(outcome) {
            self.notify(notice);
        }
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }

    fn publish(&self) {
        self.view.send_replace(self.state.view());
    }
}
