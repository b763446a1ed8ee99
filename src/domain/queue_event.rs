//! Push events describing mutations of the server-side request collection.
//!
//! The server broadcasts one [`QueueEvent`] per mutation to every admin
//! listener subscribed to the requests topic. Events are decoded from
//! [`crate::ws::messages::PushFrame`]s and fanned out through the
//! [`super::EventBus`].

use serde::{Deserialize, Serialize};

use super::{RequestId, RequestStatus, SongRequest};

/// Payload of a `request:update` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StatusChangePayload")]
pub struct StatusChange {
    /// Request whose status changed.
    #[serde(rename = "_id")]
    pub id: RequestId,
    /// New status.
    pub status: RequestStatus,
    /// Server time of the change, when included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusChangePayload {
    #[serde(rename = "_id")]
    primary_id: Option<RequestId>,
    id: Option<RequestId>,
    status: RequestStatus,
    #[serde(default)]
    updated_at: Option<String>,
}

impl TryFrom<StatusChangePayload> for StatusChange {
    type Error = String;

    fn try_from(payload: StatusChangePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RequestId::from_keys(payload.primary_id, payload.id)?,
            status: payload.status,
            updated_at: payload.updated_at,
        })
    }
}

/// Payload of a `request:delete` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DeletionPayload")]
pub struct Deletion {
    /// Request that was deleted.
    #[serde(rename = "_id")]
    pub id: RequestId,
}

#[derive(Debug, Deserialize)]
struct DeletionPayload {
    #[serde(rename = "_id")]
    primary_id: Option<RequestId>,
    id: Option<RequestId>,
}

impl TryFrom<DeletionPayload> for Deletion {
    type Error = String;

    fn try_from(payload: DeletionPayload) -> Result<Self, Self::Error> {
        RequestId::from_keys(payload.primary_id, payload.id).map(|id| Self { id })
    }
}

/// A single mutation of the request collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// A new request was submitted (`request:new`).
    Created(SongRequest),
    /// A request's status changed (`request:update`).
    StatusChanged(StatusChange),
    /// A request was deleted (`request:delete`).
    Deleted(Deletion),
    /// Every request was deleted (`requests:clear`).
    ClearedAll,
}

impl QueueEvent {
    /// Wire name of `Created` events.
    pub const CREATED: &'static str = "request:new";
    /// Wire name of `StatusChanged` events.
    pub const STATUS_CHANGED: &'static str = "request:update";
    /// Wire name of `Deleted` events.
    pub const DELETED: &'static str = "request:delete";
    /// Wire name of `ClearedAll` events.
    pub const CLEARED_ALL: &'static str = "requests:clear";

    /// Returns the identifier the event refers to, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Created(request) => Some(&request.id),
            Self::StatusChanged(change) => Some(&change.id),
            Self::Deleted(deletion) => Some(&deletion.id),
            Self::ClearedAll => None,
        }
    }

    /// Returns the wire event name.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Created(_) => Self::CREATED,
            Self::StatusChanged(_) => Self::STATUS_CHANGED,
            Self::Deleted(_) => Self::DELETED,
            Self::ClearedAll => Self::CLEARED_ALL,
        }
    }

    /// Decodes an event from its wire name and JSON payload.
    ///
    /// Returns `Ok(None)` for event names that are not collection
    /// mutations (for example `pong`), so callers can skip them.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when a known event carries a payload
    /// of the wrong shape.
    pub fn from_wire(
        event: &str,
        data: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        let decoded = match event {
            Self::CREATED => Self::Created(serde_json::from_value(data)?),
            Self::STATUS_CHANGED => Self::StatusChanged(serde_json::from_value(data)?),
            Self::DELETED => Self::Deleted(serde_json::from_value(data)?),
            Self::CLEARED_ALL => Self::ClearedAll,
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Encodes the event payload as sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be serialized.
    pub fn to_wire_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Created(request) => serde_json::to_value(request),
            Self::StatusChanged(change) => serde_json::to_value(change),
            Self::Deleted(deletion) => serde_json::to_value(deletion),
            Self::ClearedAll => Ok(serde_json::Value::Null),
        }
    }
}
