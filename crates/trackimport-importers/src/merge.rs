// SPDX-License-Identifier: GPL-3.0-or-later

use trackimport_domain::{FrameCollection, ImportTrackData, ImportTrackDataVector};

/// One track as parsed from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTrack {
    pub frames: FrameCollection,
    /// Seconds, 0 when the source has no length.
    pub duration: u32,
}

impl ParsedTrack {
    pub fn new(frames: FrameCollection, duration: u32) -> Self {
        Self { frames, duration }
    }
}

/// Seconds of a duration given as colon separated fields ("m:s", "h:m:s").
///
/// Fields that are not numbers count as 0, a value that does not fit into
/// `u32` gives 0 (no duration).
pub(crate) fn duration_seconds<'a>(fields: impl IntoIterator<Item = &'a str>) -> u32 {
    fields
        .into_iter()
        .try_fold(0u32, |acc, field| {
            acc.checked_mul(60)?
                .checked_add(field.trim().parse::<u32>().unwrap_or(0))
        })
        .unwrap_or(0)
}

/// Overlay parsed tracks onto the slots of `tracks` by position.
///
/// Disabled slots are skipped, parsed tracks beyond the last slot are
/// appended. Enabled slots left over keep their place with cleared tags when
/// they have a file duration and are removed otherwise. A response without
/// tracks leaves the slots untouched.
pub fn merge_tracks(tracks: &mut ImportTrackDataVector, parsed: Vec<ParsedTrack>) {
    if parsed.is_empty() {
        return;
    }

    let slots = &mut tracks.tracks;
    let mut next = 0;
    for track in parsed {
        while next < slots.len() && !slots[next].enabled {
            next += 1;
        }
        if next < slots.len() {
            slots[next].frames = track.frames;
            slots[next].import_duration = track.duration;
            next += 1;
        } else {
            slots.push(ImportTrackData::new(track.frames, track.duration));
            next = slots.len();
        }
    }

    let leftover = slots.split_off(next);
    slots.extend(leftover.into_iter().filter_map(|mut slot| {
        if !slot.enabled {
            Some(slot)
        } else if slot.file_duration == 0 {
            None
        } else {
            slot.frames.clear();
            slot.import_duration = 0;
            Some(slot)
        }
    }));
}

/// Apply album level frames to every enabled slot, used when a page has
/// header data but no track rows.
pub fn apply_header(tracks: &mut ImportTrackDataVector, header: &FrameCollection) {
    for slot in tracks.tracks.iter_mut().filter(|slot| slot.enabled) {
        slot.frames = header.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trackimport_domain::{InMemoryTaggedFile, TaggedFile};

    fn parsed(titles: &[&str]) -> Vec<ParsedTrack> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let mut frames = FrameCollection::new();
                frames.set_title(*title);
                frames.set_track(i as u32 + 1);
                ParsedTrack::new(frames, 100 + i as u32)
            })
            .collect()
    }

    fn slots(durations: &[u32]) -> ImportTrackDataVector {
        let files = durations.iter().enumerate().map(|(i, duration)| {
            Arc::new(InMemoryTaggedFile::new(
                format!("/music/{:02}.mp3", i + 1),
                *duration,
                FrameCollection::new(),
            )) as Arc<dyn TaggedFile>
        });
        ImportTrackDataVector::from_files(files)
    }

    fn titles(tracks: &ImportTrackDataVector) -> Vec<String> {
        tracks.iter().map(|t| t.frames.title().to_string()).collect()
    }

    #[test]
    fn duration_fields_are_checked() {
        assert_eq!(duration_seconds(["5", "19"]), 319);
        assert_eq!(duration_seconds("1:02:03".split(':')), 3723);
        assert_eq!(duration_seconds(["x", "07"]), 7);
        assert_eq!(duration_seconds(["71582789", "0"]), 0);
        assert_eq!(duration_seconds(["71582788", "15"]), 4_294_967_295);
    }

    #[test]
    fn appends_to_empty_vector() {
        let mut tracks = ImportTrackDataVector::new();
        merge_tracks(&mut tracks, parsed(&["a", "b"]));
        assert_eq!(titles(&tracks), vec!["a", "b"]);
        assert_eq!(tracks.tracks[1].import_duration, 101);
    }

    #[test]
    fn skips_disabled_slots() {
        let mut tracks = slots(&[200, 200, 200]);
        tracks.tracks[1].enabled = false;
        merge_tracks(&mut tracks, parsed(&["a", "b"]));
        assert_eq!(titles(&tracks), vec!["a", "", "b"]);
        assert_eq!(tracks.tracks[1].import_duration, 0);
    }

    #[test]
    fn appends_when_slots_run_out() {
        let mut tracks = slots(&[200]);
        merge_tracks(&mut tracks, parsed(&["a", "b", "c"]));
        assert_eq!(titles(&tracks), vec!["a", "b", "c"]);
        assert!(tracks.tracks[0].file().is_some());
        assert!(tracks.tracks[2].file().is_none());
    }

    #[test]
    fn leftover_slots_are_cleared_or_removed() {
        let mut tracks = slots(&[200, 200, 0, 180]);
        tracks.tracks[3].frames.set_title("old");
        merge_tracks(&mut tracks, parsed(&["a"]));
        assert_eq!(tracks.len(), 3);
        assert_eq!(titles(&tracks), vec!["a", "", ""]);
        assert!(tracks.tracks[2].frames.is_empty());
        assert_eq!(tracks.tracks[2].file_duration, 180);
    }

    #[test]
    fn empty_response_keeps_slots() {
        let mut tracks = slots(&[200, 0]);
        tracks.tracks[0].frames.set_title("kept");
        merge_tracks(&mut tracks, Vec::new());
        assert_eq!(titles(&tracks), vec!["kept", ""]);
    }

    #[test]
    fn merging_twice_gives_same_result() {
        let mut first = slots(&[200, 200, 0]);
        merge_tracks(&mut first, parsed(&["a", "b"]));
        let once = titles(&first);
        merge_tracks(&mut first, parsed(&["a", "b"]));
        assert_eq!(titles(&first), once);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn header_applies_to_enabled_slots() {
        let mut tracks = slots(&[200, 200]);
        tracks.tracks[1].enabled = false;
        let mut header = FrameCollection::new();
        header.set_album("Odin");
        apply_header(&mut tracks, &header);
        assert_eq!(tracks.tracks[0].frames.album(), "Odin");
        assert_eq!(tracks.tracks[1].frames.album(), "");
    }
}
