// SPDX-License-Identifier: GPL-3.0-or-later

// ============================================================================
// Track data reconciliation
// ============================================================================

pub mod accuracy;
pub mod filename_format;
pub mod matcher;

// ============================================================================
// Batch import
// ============================================================================

pub mod batch;
pub mod cover_art;
pub mod events;

pub use accuracy::calculate_accuracy;
pub use batch::{
    AbortHandle, AlbumImportSummary, BatchImportReport, BatchImporter, BatchState, INVALID_FILE,
};
pub use cover_art::PictureUrlMapper;
pub use events::{EventPublisher, InMemoryEventBus};
pub use filename_format::{FilenameFormat, FilenameFormatError, FilenameFormatResult};
pub use matcher::{match_with_length, match_with_title, match_with_track};
