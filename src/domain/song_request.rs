//! Song request entity as delivered by the server.

use serde::{Deserialize, Serialize};

use super::RequestId;

/// Who is expected to sing the requested song.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performer {
    /// The person who submitted the request sings it.
    #[default]
    Guest,
    /// The request asks the host to sing it.
    Host,
}

/// Channel a request was submitted through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Public request form.
    #[default]
    Public,
    /// Quick "I'll sing it" shortcut.
    Quick,
}

/// Lifecycle state of a request.
///
/// Transitions are driven by admin commands on the server; the client only
/// mirrors what the server broadcasts. A missing or unrecognized status on
/// the wire reads as [`RequestStatus::Pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Currently being performed.
    OnStage,
    /// Performed.
    Done,
    /// Called but the singer did not show up.
    NoShow,
    /// Waiting in the queue.
    #[default]
    #[serde(other)]
    Pending,
}

impl RequestStatus {
    /// All statuses in queue order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::OnStage, Self::Done, Self::NoShow];

    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnStage => "on_stage",
            Self::Done => "done",
            Self::NoShow => "no_show",
        }
    }

    /// Returns a short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::OnStage => "On stage",
            Self::Done => "Done",
            Self::NoShow => "No show",
        }
    }

    /// Returns `true` for statuses shown in the merged "finished" bucket.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Done | Self::NoShow)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "on_stage" => Ok(Self::OnStage),
            "done" => Ok(Self::Done),
            "no_show" => Ok(Self::NoShow),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// A single karaoke song request.
///
/// Timestamps are kept as the raw wire strings. Push events may omit them,
/// and a malformed value must degrade to the ordering fallback in
/// [`super::ordering`] rather than reject the whole request.
///
/// Documents may carry the identifier as `_id`, `id`, or both; `_id` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SongRequestDocument")]
pub struct SongRequest {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: RequestId,

    /// Name of the person who submitted the request.
    pub full_name: String,

    /// Song artist.
    pub artist: String,

    /// Song title.
    pub title: String,

    /// Free-text notes for the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Who is expected to perform.
    pub performer: Performer,

    /// Submission channel.
    pub source: Source,

    /// Current lifecycle state.
    pub status: RequestStatus,

    /// Creation timestamp (immutable), as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Timestamp of the last status change, as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Request document exactly as it arrives on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongRequestDocument {
    #[serde(rename = "_id")]
    primary_id: Option<RequestId>,
    id: Option<RequestId>,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    performer: Performer,
    #[serde(default)]
    source: Source,
    #[serde(default)]
    status: RequestStatus,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl TryFrom<SongRequestDocument> for SongRequest {
    type Error = String;

    fn try_from(doc: SongRequestDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RequestId::from_keys(doc.primary_id, doc.id)?,
            full_name: doc.full_name,
            artist: doc.artist,
            title: doc.title,
            notes: doc.notes,
            performer: doc.performer,
            source: doc.source,
            status: doc.status,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

impl SongRequest {
    /// Creates a pending guest request from the public form with no
    /// timestamps.
    #[must_use]
    pub fn new(
        id: impl Into<RequestId>,
        full_name: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            artist: artist.into(),
            title: title.into(),
            notes: None,
            performer: Performer::Guest,
            source: Source::Public,
            status: RequestStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns `true` when the host, not the requester, sings this song.
    #[must_use]
    pub fn sung_by_host(&self) -> bool {
        self.source == Source::Quick || self.performer == Performer::Host
    }

    /// Returns the notes with line breaks folded into single spaces, or
    /// `None` when there is nothing to show.
    #[must_use]
    pub fn display_notes(&self) -> Option<String> {
        let notes = self.notes.as_deref()?;
        let folded = notes
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if folded.is_empty() { None } else { Some(folded) }
    }
}
