// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use trackimport_application::AlbumImportSummary;
use trackimport_domain::{
    FrameCollection, ImportEvent, ImportTrackData, ImportTrackDataVector, InMemoryTaggedFile,
    TaggedFile,
};

/// Album groups to import, read from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub albums: Vec<ManifestAlbum>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestAlbum {
    #[serde(default)]
    pub tracks: Vec<ManifestTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestTrack {
    pub path: PathBuf,
    /// Seconds, 0 when unknown.
    #[serde(default)]
    pub duration: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: FrameCollection,
}

fn enabled_by_default() -> bool {
    true
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid manifest {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// One track list per album, every slot bound to an in-memory file.
    pub fn track_lists(&self) -> Vec<ImportTrackDataVector> {
        self.albums
            .iter()
            .map(|album| {
                let mut tracks = ImportTrackDataVector::new();
                for track in &album.tracks {
                    let file: Arc<dyn TaggedFile> = Arc::new(InMemoryTaggedFile::new(
                        &track.path,
                        track.duration,
                        track.tags.clone(),
                    ));
                    let mut data = ImportTrackData::from_file(file);
                    data.enabled = track.enabled;
                    tracks.tracks.push(data);
                }
                tracks
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub duration: u32,
    pub import_duration: u32,
    pub enabled: bool,
    pub tags: FrameCollection,
}

impl TrackOutput {
    /// Tags as stored in the bound file, or the slot frames without a file.
    pub fn stored(track: &ImportTrackData) -> Self {
        let tags = track
            .file()
            .map(|file| file.frames())
            .unwrap_or_else(|| track.frames.clone());
        Self::with_tags(track, tags)
    }

    /// Imported frames of the slot.
    pub fn imported(track: &ImportTrackData) -> Self {
        Self::with_tags(track, track.frames.clone())
    }

    fn with_tags(track: &ImportTrackData, tags: FrameCollection) -> Self {
        Self {
            path: track.file().map(|file| file.abs_path()),
            duration: track.file_duration,
            import_duration: track.import_duration,
            enabled: track.enabled,
            tags,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAlbumOutput {
    pub summary: AlbumImportSummary,
    pub tracks: Vec<TrackOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub run_id: String,
    pub aborted: bool,
    pub albums: Vec<BatchAlbumOutput>,
    pub events: Vec<ImportEvent>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportAlbumOutput {
    pub artist: String,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u8>,
    pub matched: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cover_art_url: String,
    pub tracks: Vec<TrackOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackimport_domain::FrameType;

    const MANIFEST: &str = r#"{
        "albums": [
            {
                "tracks": [
                    {
                        "path": "/music/Wizard - Odin/01 The Prophecy.mp3",
                        "duration": 319,
                        "tags": { "artist": "Wizard", "album": "Odin", "track": "1" }
                    },
                    { "path": "/music/Wizard - Odin/cover.mp3", "enabled": false }
                ]
            },
            { "tracks": [] }
        ]
    }"#;

    #[test]
    fn builds_track_lists_from_manifest() {
        let manifest = Manifest::from_json(MANIFEST).expect("manifest should parse");
        let lists = manifest.track_lists();
        assert_eq!(lists.len(), 2);
        assert!(lists[1].is_empty());

        let first = &lists[0];
        assert_eq!(first.artist(), "Wizard");
        assert_eq!(first.tracks[0].file_duration, 319);
        assert_eq!(first.tracks[0].frames.track(), 1);
        assert!(first.tracks[0].enabled);
        assert!(!first.tracks[1].enabled);
        assert_eq!(first.tracks[1].file_duration, 0);
    }

    #[test]
    fn loads_manifest_file() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("albums.json");
        fs::write(&path, MANIFEST).expect("manifest should be written");
        assert_eq!(Manifest::load(&path).expect("manifest should load").albums.len(), 2);

        let missing = dir.path().join("missing.json");
        let error = Manifest::load(&missing).expect_err("missing file should fail");
        assert!(error.to_string().contains("failed to read manifest"));
    }

    #[test]
    fn stored_output_reads_file_tags() {
        let manifest = Manifest::from_json(MANIFEST).expect("manifest should parse");
        let mut lists = manifest.track_lists();
        let track = &mut lists[0].tracks[0];
        track.frames.set_title("Imported only");

        let stored = TrackOutput::stored(track);
        assert_eq!(stored.tags.get(FrameType::Title), "");
        assert_eq!(stored.tags.artist(), "Wizard");
        let imported = TrackOutput::imported(track);
        assert_eq!(imported.tags.title(), "Imported only");

        let json = serde_json::to_value(&imported).expect("output should serialize");
        assert_eq!(json["tags"]["title"], "Imported only");
        assert_eq!(json["path"], "/music/Wizard - Odin/01 The Prophecy.mp3");
    }
}
