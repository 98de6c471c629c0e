// SPDX-License-Identifier: GPL-3.0-or-later

//! Reordering of imported track data so that it lines up with the local files.
//!
//! The parsers fill the slots of an [`ImportTrackDataVector`] in the order the
//! source lists the tracks. When that order differs from the order of the
//! files, one of the functions here moves the imported frames and durations
//! to better fitting slots. The file side of a slot (bound file, file duration,
//! enabled flag) never moves.
//!
//! Only enabled slots take part; positions and track numbers are counted
//! among them. Every function returns `false` and leaves the vector untouched
//! when no complete assignment is found.
//!
//! The length and title matchers are greedy: each unassigned entry of the
//! side with fewer known values takes the best remaining partner, first one
//! wins on ties. This is not a minimum cost matching.

use std::collections::BTreeSet;

use tracing::debug;
use trackimport_domain::{FrameCollection, ImportTrackDataVector};

/// Assign every file slot to an import slot.
///
/// `cost(file, import)` ranks candidates, lower is better. With `files_outer`
/// each unassigned file picks among unassigned imports, otherwise each
/// unassigned import picks among unassigned files. Entries of `pinned` are
/// assigned to themselves beforehand. Returns the import index per file.
fn assign_greedy<F>(pinned: &[bool], files_outer: bool, cost: F) -> Option<Vec<usize>>
where
    F: Fn(usize, usize) -> i64,
{
    let n = pinned.len();
    let mut assigned_from: Vec<Option<usize>> =
        pinned.iter().enumerate().map(|(i, &p)| p.then_some(i)).collect();
    let mut assigned_to = assigned_from.clone();

    if files_outer {
        for file in 0..n {
            if assigned_from[file].is_some() {
                continue;
            }
            let best = (0..n)
                .filter(|&import| assigned_to[import].is_none())
                .min_by_key(|&import| cost(file, import))?;
            assigned_from[file] = Some(best);
            assigned_to[best] = Some(file);
        }
    } else {
        for import in 0..n {
            if assigned_to[import].is_some() {
                continue;
            }
            let best = (0..n)
                .filter(|&file| assigned_from[file].is_none())
                .min_by_key(|&file| cost(file, import))?;
            assigned_to[import] = Some(best);
            assigned_from[best] = Some(import);
        }
    }

    assigned_from.into_iter().collect()
}

/// Indices of the enabled slots.
fn enabled_slots(tracks: &ImportTrackDataVector) -> Vec<usize> {
    tracks
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| track.enabled)
        .map(|(index, _)| index)
        .collect()
}

/// Move import data so that enabled slot `k` receives the data of enabled
/// slot `assigned_from[k]`.
fn apply_assignment(tracks: &mut ImportTrackDataVector, slots: &[usize], assigned_from: &[usize]) {
    let old: Vec<(FrameCollection, u32)> = slots
        .iter()
        .map(|&slot| {
            let track = &tracks.tracks[slot];
            (track.frames.clone(), track.import_duration)
        })
        .collect();
    for (k, &slot) in slots.iter().enumerate() {
        let (frames, duration) = &old[assigned_from[k]];
        let track = &mut tracks.tracks[slot];
        track.frames = frames.clone();
        track.import_duration = *duration;
    }
}

/// Match imported durations to file durations.
///
/// With `diff_check_enable`, a slot whose durations already differ by at most
/// `max_diff` seconds keeps its data.
pub fn match_with_length(
    tracks: &mut ImportTrackDataVector,
    diff_check_enable: bool,
    max_diff: u32,
) -> bool {
    let slots = enabled_slots(tracks);
    if slots.is_empty() {
        return true;
    }

    let file_lengths: Vec<i64> = slots
        .iter()
        .map(|&s| i64::from(tracks.tracks[s].file_duration))
        .collect();
    let import_lengths: Vec<i64> = slots
        .iter()
        .map(|&s| i64::from(tracks.tracks[s].import_duration))
        .collect();
    let num_files = file_lengths.iter().filter(|&&l| l > 0).count();
    let num_imports = import_lengths.iter().filter(|&&l| l > 0).count();

    let pinned: Vec<bool> = slots
        .iter()
        .map(|&s| {
            diff_check_enable
                && tracks.tracks[s]
                    .time_difference()
                    .is_some_and(|diff| diff <= max_diff)
        })
        .collect();

    let Some(assigned_from) = assign_greedy(&pinned, num_files <= num_imports, |file, import| {
        (file_lengths[file] - import_lengths[import]).abs()
    }) else {
        debug!(target: "matching", "no length assignment found");
        return false;
    };

    apply_assignment(tracks, &slots, &assigned_from);
    debug!(target: "matching", slots = slots.len(), "matched by length");
    true
}

/// Match by the track numbers of the imported data.
///
/// Slots whose number equals their position stay, then data moves to the
/// position its number names if that is still free, the rest fills the
/// remaining positions in order.
pub fn match_with_track(tracks: &mut ImportTrackDataVector) -> bool {
    let slots = enabled_slots(tracks);
    let n = slots.len();
    if n == 0 {
        return true;
    }

    // Claimed 0-based position, `None` when the number is out of range.
    let claimed: Vec<Option<usize>> = slots
        .iter()
        .map(|&s| {
            let number = tracks.tracks[s].frames.track() as usize;
            (1..=n).contains(&number).then(|| number - 1)
        })
        .collect();

    let mut assigned_from: Vec<Option<usize>> = vec![None; n];
    let mut assigned_to: Vec<Option<usize>> = vec![None; n];

    for (i, claim) in claimed.iter().enumerate() {
        if *claim == Some(i) {
            assigned_from[i] = Some(i);
            assigned_to[i] = Some(i);
        }
    }

    let mut unassigned_tracks = Vec::new();
    for (i, claim) in claimed.iter().enumerate() {
        if assigned_to[i].is_some() {
            continue;
        }
        match claim {
            Some(target) if assigned_from[*target].is_none() => {
                assigned_from[*target] = Some(i);
                assigned_to[i] = Some(*target);
            }
            _ => unassigned_tracks.push(i),
        }
    }

    let mut pending = unassigned_tracks.into_iter();
    for i in 0..n {
        if assigned_from[i].is_some() {
            continue;
        }
        let Some(import) = pending.by_ref().find(|&t| assigned_to[t].is_none()) else {
            debug!(target: "matching", position = i, "no track left for position");
            return false;
        };
        assigned_from[i] = Some(import);
        assigned_to[import] = Some(i);
    }

    let Some(assigned_from) = assigned_from.into_iter().collect::<Option<Vec<usize>>>() else {
        return false;
    };
    apply_assignment(tracks, &slots, &assigned_from);
    debug!(target: "matching", slots = n, "matched by track number");
    true
}

/// Match imported titles to file names by the number of shared words.
pub fn match_with_title(tracks: &mut ImportTrackDataVector) -> bool {
    let slots = enabled_slots(tracks);
    if slots.is_empty() {
        return true;
    }

    let file_words: Vec<BTreeSet<String>> = slots
        .iter()
        .map(|&s| tracks.tracks[s].filename_words())
        .collect();
    let title_words: Vec<BTreeSet<String>> = slots
        .iter()
        .map(|&s| tracks.tracks[s].title_words())
        .collect();
    let num_files = file_words.iter().filter(|w| !w.is_empty()).count();
    let num_imports = title_words.iter().filter(|w| !w.is_empty()).count();

    let pinned = vec![false; slots.len()];
    let Some(assigned_from) = assign_greedy(&pinned, num_files <= num_imports, |file, import| {
        -(file_words[file].intersection(&title_words[import]).count() as i64)
    }) else {
        debug!(target: "matching", "no title assignment found");
        return false;
    };

    apply_assignment(tracks, &slots, &assigned_from);
    debug!(target: "matching", slots = slots.len(), "matched by title");
    true
}
