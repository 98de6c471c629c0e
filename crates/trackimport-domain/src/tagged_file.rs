// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::frame::{FrameCollection, PictureFrame};

/// Local audio file whose tags are read and written by the import.
///
/// Implementations use interior mutability since files are shared between
/// the working track list and its snapshots.
pub trait TaggedFile: Send + Sync + fmt::Debug {
    /// File name without directory.
    fn filename(&self) -> String;

    fn abs_path(&self) -> PathBuf;

    /// Duration in seconds, 0 when unknown.
    fn duration(&self) -> u32;

    /// Tags currently stored in the file.
    fn frames(&self) -> FrameCollection;

    /// Write every field present in `frames`; empty values clear a field.
    fn set_frames(&self, frames: &FrameCollection);

    fn supports_pictures(&self) -> bool {
        true
    }

    fn add_picture(&self, picture: PictureFrame);
}

/// [`TaggedFile`] kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryTaggedFile {
    path: PathBuf,
    duration: u32,
    frames: Mutex<FrameCollection>,
    pictures: Mutex<Vec<PictureFrame>>,
}

impl InMemoryTaggedFile {
    pub fn new(path: impl AsRef<Path>, duration: u32, frames: FrameCollection) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            duration,
            frames: Mutex::new(frames),
            pictures: Mutex::new(Vec::new()),
        }
    }

    pub fn pictures(&self) -> Vec<PictureFrame> {
        self.pictures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TaggedFile for InMemoryTaggedFile {
    fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn abs_path(&self) -> PathBuf {
        self.path.clone()
    }

    fn duration(&self) -> u32 {
        self.duration
    }

    fn frames(&self) -> FrameCollection {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_frames(&self, frames: &FrameCollection) {
        let mut stored = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        for (frame_type, value) in frames.iter() {
            if value.is_empty() {
                stored.remove(frame_type);
            } else {
                stored.set_value(frame_type, value);
            }
        }
    }

    fn add_picture(&self, picture: PictureFrame) {
        self.pictures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(picture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameType;

    #[test]
    fn set_frames_overwrites_and_clears() {
        let mut initial = FrameCollection::new();
        initial.set_artist("Unknown");
        initial.set_value(FrameType::Comment, "ripped");
        let file = InMemoryTaggedFile::new("/music/Wizard - Odin/01 The Prophecy.mp3", 319, initial);

        let mut update = FrameCollection::new();
        update.set_artist("Wizard");
        update.set_value(FrameType::Comment, "");
        file.set_frames(&update);

        let frames = file.frames();
        assert_eq!(frames.artist(), "Wizard");
        assert!(!frames.contains(FrameType::Comment));
        assert_eq!(file.filename(), "01 The Prophecy.mp3");
    }
}
