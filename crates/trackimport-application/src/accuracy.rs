// SPDX-License-Identifier: GPL-3.0-or-later

use trackimport_domain::ImportTrackDataVector;

/// Largest duration difference in seconds still counted as a match.
pub const MAX_MATCHING_TIME_DIFFERENCE: u32 = 3;

/// Share in percent of the smaller word set which must occur in both
/// title and file name.
pub const MIN_MATCHING_WORD_PERCENT: usize = 75;

/// How well imported tracks fit the local files, in percent.
///
/// Enabled slots with both durations known are judged by their time
/// difference, other slots by the words shared between the imported title and
/// the file name. `None` when no slot could be judged.
pub fn calculate_accuracy(tracks: &ImportTrackDataVector) -> Option<u8> {
    let mut matches = 0usize;
    let mut mismatches = 0usize;

    for track in tracks.iter().filter(|t| t.enabled) {
        if let Some(diff) = track.time_difference() {
            if diff <= MAX_MATCHING_TIME_DIFFERENCE {
                matches += 1;
            } else {
                mismatches += 1;
            }
            continue;
        }

        let title_words = track.title_words();
        if title_words.is_empty() {
            continue;
        }
        let file_words = track.filename_words();
        let num_words = title_words.len().min(file_words.len());
        if num_words == 0 {
            continue;
        }
        let common = title_words.intersection(&file_words).count();
        if common * 100 / num_words >= MIN_MATCHING_WORD_PERCENT {
            matches += 1;
        } else {
            mismatches += 1;
        }
    }

    let judged = matches + mismatches;
    (judged > 0).then(|| (matches * 100 / judged) as u8)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use trackimport_domain::{FrameCollection, ImportTrackData, InMemoryTaggedFile, TaggedFile};

    fn slot(path: &str, file_duration: u32, title: &str, import_duration: u32) -> ImportTrackData {
        let file: Arc<dyn TaggedFile> =
            Arc::new(InMemoryTaggedFile::new(path, file_duration, FrameCollection::new()));
        let mut data = ImportTrackData::from_file(file);
        data.frames.set_title(title);
        data.import_duration = import_duration;
        data
    }

    #[test]
    fn durations_decide_when_known() {
        let mut tracks = ImportTrackDataVector::new();
        tracks.tracks.push(slot("/a/01.mp3", 319, "The Prophecy", 322));
        tracks.tracks.push(slot("/a/02.mp3", 293, "Dead Hope", 250));
        assert_eq!(calculate_accuracy(&tracks), Some(50));
    }

    #[test]
    fn titles_decide_without_durations() {
        let mut tracks = ImportTrackDataVector::new();
        tracks.tracks.push(slot("/a/01 The Prophecy.mp3", 0, "The Prophecy", 0));
        tracks.tracks.push(slot("/a/02 Dead Hope.mp3", 0, "Dead Hope", 0));
        tracks.tracks.push(slot("/a/03 Betrayer.mp3", 0, "Ultima Thule", 0));
        assert_eq!(calculate_accuracy(&tracks), Some(66));
    }

    #[test]
    fn disabled_and_unknown_slots_are_ignored() {
        let mut tracks = ImportTrackDataVector::new();
        let mut disabled = slot("/a/01.mp3", 100, "A", 300);
        disabled.enabled = false;
        tracks.tracks.push(disabled);
        tracks.tracks.push(slot("/a/02.mp3", 0, "", 0));
        assert_eq!(calculate_accuracy(&tracks), None);

        tracks.tracks.push(slot("/a/03.mp3", 200, "B", 201));
        assert_eq!(calculate_accuracy(&tracks), Some(100));
        assert_eq!(calculate_accuracy(&ImportTrackDataVector::new()), None);
    }
}
