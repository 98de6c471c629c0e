// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeSet;
use std::sync::Arc;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::frame::{FrameCollection, FrameType};
use crate::tagged_file::TaggedFile;

/// One track of an import: tags from a remote source aligned to a local file slot.
#[derive(Debug, Clone)]
pub struct ImportTrackData {
    pub frames: FrameCollection,
    /// Seconds reported by the remote source, 0 when unknown.
    pub import_duration: u32,
    /// Seconds of the bound local file, 0 when there is no file.
    pub file_duration: u32,
    pub enabled: bool,
    file: Option<Arc<dyn TaggedFile>>,
}

impl Default for ImportTrackData {
    fn default() -> Self {
        Self {
            frames: FrameCollection::new(),
            import_duration: 0,
            file_duration: 0,
            enabled: true,
            file: None,
        }
    }
}

impl ImportTrackData {
    pub fn new(frames: FrameCollection, import_duration: u32) -> Self {
        Self {
            frames,
            import_duration,
            ..Self::default()
        }
    }

    /// Slot bound to `file`, seeded with the tags stored in it.
    pub fn from_file(file: Arc<dyn TaggedFile>) -> Self {
        Self {
            frames: file.frames(),
            file_duration: file.duration(),
            file: Some(file),
            ..Self::default()
        }
    }

    pub fn file(&self) -> Option<&Arc<dyn TaggedFile>> {
        self.file.as_ref()
    }

    /// Absolute difference between file and import duration, `None` if either is unknown.
    pub fn time_difference(&self) -> Option<u32> {
        if self.file_duration != 0 && self.import_duration != 0 {
            Some(self.file_duration.abs_diff(self.import_duration))
        } else {
            None
        }
    }

    pub fn title_words(&self) -> BTreeSet<String> {
        words(self.frames.title())
    }

    /// Words of the bound file name without its extension.
    pub fn filename_words(&self) -> BTreeSet<String> {
        let Some(file) = &self.file else {
            return BTreeSet::new();
        };
        let filename = file.filename();
        let stem = match filename.rfind('.') {
            Some(pos) if pos > 0 => &filename[..pos],
            _ => filename.as_str(),
        };
        words(stem)
    }
}

/// Lower-case words of `text` after canonical decomposition.
///
/// Letters form words; whitespace, punctuation and symbols separate them;
/// digits and combining marks are dropped.
pub fn words(text: &str) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    let mut current = String::new();
    for c in text.nfd() {
        if c.is_alphabetic() {
            current.extend(c.to_lowercase());
        } else if is_combining_mark(c) || c.is_numeric() {
            continue;
        } else if !current.is_empty() {
            result.insert(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        result.insert(current);
    }
    result
}

/// `m:ss` display form of a duration in seconds.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Ordered track slots of one album plus the album cover URL.
#[derive(Debug, Clone, Default)]
pub struct ImportTrackDataVector {
    pub tracks: Vec<ImportTrackData>,
    pub cover_art_url: String,
}

impl ImportTrackDataVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn TaggedFile>>,
    {
        Self {
            tracks: files.into_iter().map(ImportTrackData::from_file).collect(),
            cover_art_url: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImportTrackData> {
        self.tracks.iter()
    }

    /// Album level field from the first slot, falling back to the tags of its file.
    pub fn frame(&self, frame_type: FrameType) -> String {
        let Some(first) = self.tracks.first() else {
            return String::new();
        };
        let value = first.frames.get(frame_type);
        if !value.is_empty() {
            return value.to_string();
        }
        first
            .file()
            .map(|f| f.frames().get(frame_type).to_string())
            .unwrap_or_default()
    }

    pub fn artist(&self) -> String {
        self.frame(FrameType::Artist)
    }

    pub fn album(&self) -> String {
        self.frame(FrameType::Album)
    }
}
