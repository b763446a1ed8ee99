//! Push channel frame format.
//!
//! Every frame in either direction is a JSON object
//! `{"event": <name>, "data": <payload>}`; `data` is omitted when the event
//! carries no payload.

use serde::{Deserialize, Serialize};

use crate::domain::QueueEvent;

/// Client → server: announce the connection as an admin listener.
pub const IDENTIFY: &str = "identify";

/// Client → server: join the requests topic.
pub const SUBSCRIBE_REQUESTS: &str = "subscribe:requests";

/// Client → server: liveness probe.
pub const PING_CLIENT: &str = "ping:client";

/// Role a client claims when identifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Staff member running the admin queue.
    Admin,
}

/// Payload of an [`IDENTIFY`] frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    /// Claimed role.
    pub role: ClientRole,
}

/// A single frame on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    /// Event name.
    pub event: String,
    /// Event payload; `null` when absent.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl PushFrame {
    /// Builds a frame without payload.
    #[must_use]
    pub fn bare(event: &str) -> Self {
        Self {
            event: event.to_string(),
            data: serde_json::Value::Null,
        }
    }

    /// The frame that identifies this client as an admin listener.
    #[must_use]
    pub fn identify_admin() -> Self {
        Self {
            event: IDENTIFY.to_string(),
            data: serde_json::to_value(Identify {
                role: ClientRole::Admin,
            })
            .unwrap_or_default(),
        }
    }

    /// The frame that subscribes to the requests topic.
    #[must_use]
    pub fn subscribe_requests() -> Self {
        Self::bare(SUBSCRIBE_REQUESTS)
    }

    /// The liveness probe frame.
    #[must_use]
    pub fn ping() -> Self {
        Self::bare(PING_CLIENT)
    }

    /// Wraps a queue event as the server would send it.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be serialized.
    pub fn from_event(event: &QueueEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.event_type_str().to_string(),
            data: event.to_wire_data()?,
        })
    }

    /// Decodes the frame into a queue event.
    ///
    /// Returns `Ok(None)` for frames that are not collection mutations.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when a mutation frame carries a
    /// malformed payload.
    pub fn into_event(self) -> Result<Option<QueueEvent>, serde_json::Error> {
        QueueEvent::from_wire(&self.event, self.data)
    }

    /// Serializes the frame to its JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{RequestId, RequestStatus, SongRequest};

    #[test]
    fn handshake_frames_match_server_protocol() {
        let Ok(identify) = PushFrame::identify_admin().to_text() else {
            panic!("serialization failed");
        };
        assert_eq!(identify, r#"{"event":"identify","data":{"role":"admin"}}"#);

        let Ok(subscribe) = PushFrame::subscribe_requests().to_text() else {
            panic!("serialization failed");
        };
        assert_eq!(subscribe, r#"{"event":"subscribe:requests"}"#);
    }

    #[test]
    fn frame_without_data_parses() {
        let Ok(frame) = serde_json::from_str::<PushFrame>(r#"{"event":"requests:clear"}"#) else {
            panic!("valid frame");
        };
        let Ok(Some(event)) = frame.into_event() else {
            panic!("clear is a queue event");
        };
        assert_eq!(event, QueueEvent::ClearedAll);
    }

    #[test]
    fn created_frame_decodes_full_request() {
        let text = r#"{"event":"request:new","data":{"_id":"r1","fullName":"Leo","artist":"Queen","title":"Bohemian Rhapsody","performer":"host"}}"#;
        let Ok(frame) = serde_json::from_str::<PushFrame>(text) else {
            panic!("valid frame");
        };
        let Ok(Some(QueueEvent::Created(request))) = frame.into_event() else {
            panic!("expected a created event");
        };
        assert_eq!(request.id, RequestId::new("r1"));
        assert!(request.sung_by_host());
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn from_event_uses_wire_names() {
        let event = QueueEvent::Created(SongRequest::new("r2", "Ana", "Abba", "Waterloo"));
        let Ok(frame) = PushFrame::from_event(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(frame.event, "request:new");
        assert_eq!(frame.data["_id"], "r2");
        assert_eq!(frame.data["fullName"], "Ana");
    }

    #[test]
    fn pong_is_not_a_queue_event() {
        let frame = PushFrame::bare("pong");
        let Ok(decoded) = frame.into_event() else {
            panic!("unrelated frames must not error");
        };
        assert!(decoded.is_none());
    }
}
