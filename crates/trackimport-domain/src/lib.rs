// SPDX-License-Identifier: GPL-3.0-or-later

// ============================================================================
// Tag model
// ============================================================================

pub mod frame;
pub mod genres;
pub mod tagged_file;

// ============================================================================
// Import model
// ============================================================================

pub mod album_list;
pub mod profile;
pub mod track_data;

// ============================================================================
// Events
// ============================================================================

pub mod events;

pub use album_list::{AlbumListItem, AlbumListModel};
pub use events::{BatchRunId, DomainEvent, ImportEvent, ImportEventKind, ImportEventPayload};
pub use frame::{
    join_string_list, split_string_list, FrameCollection, FrameType, PictureFrame, PictureType,
    STRING_LIST_SEPARATOR,
};
pub use profile::{sources_from_str, sources_to_string, BatchImportProfile, ProfileSource};
pub use tagged_file::{InMemoryTaggedFile, TaggedFile};
pub use track_data::{format_duration, words, ImportTrackData, ImportTrackDataVector};
