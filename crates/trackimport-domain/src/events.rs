// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRunId(pub Uuid);

impl BatchRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<TPayload> {
    pub name: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub payload: TPayload,
}

impl<TPayload> DomainEvent<TPayload> {
    pub fn new(name: &'static str, payload: TPayload) -> Self {
        Self {
            name,
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// Progress notifications of a batch import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportEventKind {
    Started,
    SourceSelected,
    QueryingAlbumList,
    FetchingTrackList,
    TrackListReceived,
    FetchingCoverArt,
    CoverArtReceived,
    Finished,
    Aborted,
    Error,
}

impl ImportEventKind {
    pub fn event_name(self) -> &'static str {
        match self {
            ImportEventKind::Started => "batch.started",
            ImportEventKind::SourceSelected => "batch.source_selected",
            ImportEventKind::QueryingAlbumList => "batch.querying_album_list",
            ImportEventKind::FetchingTrackList => "batch.fetching_track_list",
            ImportEventKind::TrackListReceived => "batch.track_list_received",
            ImportEventKind::FetchingCoverArt => "batch.fetching_cover_art",
            ImportEventKind::CoverArtReceived => "batch.cover_art_received",
            ImportEventKind::Finished => "batch.finished",
            ImportEventKind::Aborted => "batch.aborted",
            ImportEventKind::Error => "batch.error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEventPayload {
    pub run_id: BatchRunId,
    pub kind: ImportEventKind,
    pub text: String,
}

pub type ImportEvent = DomainEvent<ImportEventPayload>;

impl ImportEvent {
    pub fn import(run_id: BatchRunId, kind: ImportEventKind, text: impl Into<String>) -> Self {
        DomainEvent::new(
            kind.event_name(),
            ImportEventPayload {
                run_id,
                kind,
                text: text.into(),
            },
        )
    }
}
