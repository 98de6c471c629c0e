// SPDX-License-Identifier: GPL-3.0-or-later

//! Import sources for album track lists.
//!
//! Every source implements [`Importer`]: it builds the find and track list
//! queries and parses the responses into an [`AlbumListModel`] or into the
//! slots of an [`ImportTrackDataVector`]. Parsing is best effort, a response
//! which cannot be understood leaves the target unchanged.
//!
//! [`AlbumListModel`]: trackimport_domain::AlbumListModel
//! [`ImportTrackDataVector`]: trackimport_domain::ImportTrackDataVector

pub mod error;
pub mod html;
pub mod importer;
pub mod merge;
pub mod registry;

// ============================================================================
// Sources
// ============================================================================

pub mod amazon;
pub mod discogs;
pub mod freedb;
pub mod musicbrainz;
pub mod tracktype;

pub use amazon::AmazonImporter;
pub use discogs::DiscogsImporter;
pub use error::{ImportError, Result};
pub use freedb::FreedbImporter;
pub use importer::{encode_url_query, percent_encode, FindQuery, ImportFlags, Importer};
pub use merge::{apply_header, merge_tracks, ParsedTrack};
pub use musicbrainz::MusicBrainzImporter;
pub use registry::ImporterRegistry;
pub use tracktype::TrackTypeImporter;
