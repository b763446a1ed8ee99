//! WebSocket push channel client.
//!
//! [`PushClient::connect`] opens the socket, identifies as an admin
//! listener, subscribes to the requests topic, and then spawns a read/write
//! loop that decodes every incoming frame and publishes the resulting
//! [`QueueEvent`]s on the [`EventBus`].

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use super::messages::PushFrame;
use crate::domain::{EventBus, QueueEvent};
use crate::error::QueueError;

/// A live push channel connection.
///
/// Dropping the client closes the connection.
#[derive(Debug)]
pub struct PushClient {
    outbound: mpsc::UnboundedSender<PushFrame>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), QueueError>>>,
}

impl PushClient {
    /// Connects to `ws_url`, performs the admin handshake, and starts
    /// forwarding events to `bus`. Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Channel`] if the connection or the handshake
    /// fails.
    pub async fn connect(ws_url: &str, bus: EventBus) -> Result<Self, QueueError> {
        let (mut socket, _response) = tokio_tungstenite::connect_async(ws_url).await?;

        for frame in [PushFrame::identify_admin(), PushFrame::subscribe_requests()] {
            socket.send(Message::text(frame.to_text()?)).await?;
        }
        tracing::info!(url = ws_url, "push channel connected");

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_connection(socket, bus, outbound_rx, shutdown_rx));

        Ok(Self {
            outbound,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    /// Sends a liveness probe to the server.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Channel`] if the connection has already ended.
    pub fn ping(&self) -> Result<(), QueueError> {
        self.outbound
            .send(PushFrame::ping())
            .map_err(|_| QueueError::Channel("connection closed".to_string()))
    }

    /// Returns `true` once the read/write loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits until the server closes the connection or it fails, without
    /// giving up the client.
    ///
    /// Cancel safe, so it can sit in a `select!` loop. Once the end has
    /// been reported, later calls return `Ok(())` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Channel`] describing why the connection ended.
    pub async fn disconnected(&mut self) -> Result<(), QueueError> {
        self.join().await
    }

    /// Waits until the server closes the connection or it fails.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Channel`] describing why the connection ended.
    pub async fn closed(mut self) -> Result<(), QueueError> {
        self.join().await
    }

    /// Closes the connection and waits for the loop to stop.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Channel`] if the loop had already failed.
    pub async fn close(mut self) -> Result<(), QueueError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.join().await
    }

    async fn join(&mut self) -> Result<(), QueueError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let joined = task.await;
        self.task = None;
        match joined {
            Ok(result) => result,
            Err(error) => Err(QueueError::Channel(format!("connection task failed: {error}"))),
        }
    }
}

impl Drop for PushClient {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Runs the read/write loop for one push channel connection.
///
/// - Decodes frames from the server and publishes queue events.
/// - Forwards outbound frames queued by [`PushClient`].
/// - Sends a close frame when shutdown is requested.
async fn run_connection<S>(
    socket: S,
    bus: EventBus,
    mut outbound_rx: mpsc::UnboundedReceiver<PushFrame>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), QueueError>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut ws_tx, mut ws_rx) = socket.split();

    let result = loop {
        tokio::select! {
            // Shutdown requested or client dropped
            _ = &mut shutdown_rx => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break Ok(());
            }
            // Outbound frame from the client handle
            Some(frame) = outbound_rx.recv() => {
                let text = frame.to_text()?;
                if let Err(error) = ws_tx.send(Message::text(text)).await {
                    break Err(QueueError::from(error));
                }
            }
            // Incoming frame from the server
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_text_frame(text.as_str(), &bus),
                    Some(Ok(Message::Close(_))) | None => {
                        break Err(QueueError::Channel("closed by server".to_string()));
                    }
                    Some(Err(error)) => break Err(QueueError::from(error)),
                    _ => {}
                }
            }
        }
    };

    tracing::debug!(?result, "push channel closed");
    result
}

/// Decodes one text frame and publishes it if it is a queue event.
fn handle_text_frame(text: &str, bus: &EventBus) {
    let frame = match serde_json::from_str::<PushFrame>(text) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::warn!(%error, "malformed push frame");
            return;
        }
    };
    let name = frame.event.clone();
    match frame.into_event() {
        Ok(Some(event)) => publish(event, bus),
        Ok(None) => tracing::trace!(event = %name, "ignoring non-queue frame"),
        Err(error) => tracing::warn!(event = %name, %error, "malformed push payload"),
    }
}

fn publish(event: QueueEvent, bus: &EventBus) {
    let kind = event.event_type_str();
    let receivers = bus.publish(event);
    tracing::debug!(event = kind, receivers, "push event received");
}
