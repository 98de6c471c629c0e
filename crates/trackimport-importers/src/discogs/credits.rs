// SPDX-License-Identifier: GPL-3.0-or-later

//! Mapping of Discogs credit roles to frames.

use trackimport_domain::{FrameCollection, FrameType};

/// Roles which are stored as performers when they contain one of these words.
pub(crate) const INSTRUMENTS: &[&str] = &[
    "Performer", "Vocals", "Voice", "Featuring", "Choir", "Chorus", "Baritone", "Tenor", "Rap",
    "Scratches", "Drums", "Percussion", "Keyboards", "Cello", "Piano", "Organ", "Synthesizer",
    "Keys", "Wurlitzer", "Rhodes", "Harmonica", "Xylophone", "Guitar", "Bass", "Strings", "Violin",
    "Viola", "Banjo", "Harp", "Mandolin", "Clarinet", "Horn", "Cornet", "Flute", "Oboe",
    "Saxophone", "Trumpet", "Tuba", "Trombone",
];

/// Roles stored in a single frame.
const CREDIT_TO_TYPE: &[(&str, FrameType)] = &[
    ("Composed By", FrameType::Composer),
    ("Conductor", FrameType::Conductor),
    ("Orchestra", FrameType::AlbumArtist),
    ("Lyrics By", FrameType::Lyricist),
    ("Written-By", FrameType::Author),
    ("Written By", FrameType::Author),
    ("Remix", FrameType::Remixer),
    ("Music By", FrameType::Composer),
    ("Songwriter", FrameType::Composer),
];

/// Roles stored as arranger involvements with a normalized label.
const CREDIT_TO_ARRANGEMENT: &[(&str, &str)] = &[
    ("Arranged By", "Arranger"),
    ("Mixed By", "Mixer"),
    ("DJ Mix", "DJMixer"),
    ("Dj Mix", "DJMixer"),
    ("Engineer", "Engineer"),
    ("Mastered By", "Engineer"),
    ("Producer", "Producer"),
    ("Co-producer", "Producer"),
    ("Executive Producer", "Producer"),
];

/// Apply one credit of a page's credits block to `frames`.
///
/// A credit equal to a single frame role overwrites that frame, a credit
/// starting with an arrangement role is appended to the arrangers and a
/// credit mentioning an instrument to the performers. Returns whether the
/// credit was used.
pub(crate) fn apply_page_credit(credit: &str, name: &str, frames: &mut FrameCollection) -> bool {
    if let Some((_, frame_type)) = CREDIT_TO_TYPE.iter().find(|(role, _)| *role == credit) {
        frames.set_value(*frame_type, name);
        return true;
    }
    if let Some((_, label)) = CREDIT_TO_ARRANGEMENT
        .iter()
        .find(|(role, _)| credit.starts_with(role))
    {
        frames.add_involved_people(FrameType::Arranger, label, name);
        return true;
    }
    if INSTRUMENTS.iter().any(|instrument| credit.contains(instrument)) {
        frames.add_involved_people(FrameType::Performer, credit, name);
        return true;
    }
    false
}

/// API roles containing one of the words, stored as comma separated credits.
const ROLE_TO_TYPE: &[(&[&str], FrameType)] = &[
    (&["Composed By", "Music By", "Songwriter"], FrameType::Composer),
    (&["Written-By", "Written By"], FrameType::Author),
    (&["Lyrics By"], FrameType::Lyricist),
    (&["Conductor"], FrameType::Conductor),
    (&["Orchestra"], FrameType::AlbumArtist),
    (&["Remix"], FrameType::Remixer),
];

const ROLE_TO_ARRANGEMENT: &[(&[&str], &str)] = &[
    (&["Arranged By"], "Arranger"),
    (&["Mixed By"], "Mixer"),
    (&["DJ Mix", "Dj Mix"], "DJMixer"),
    (&["Engineer", "Mastered By"], "Engineer"),
    (&["Producer", "Co-producer", "Executive Producer"], "Producer"),
];

/// Credit of an API release, optionally restricted to some track positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExtraArtist {
    pub name: String,
    pub role: String,
    pub tracks: Vec<String>,
}

impl ExtraArtist {
    pub fn has_track_restriction(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Add the credit to `frames`; with a `position` only if the
    /// restriction lists it.
    pub fn add_to_frames(&self, frames: &mut FrameCollection, position: Option<&str>) {
        if let Some(position) = position.filter(|p| !p.is_empty()) {
            if !self.tracks.iter().any(|t| t == position) {
                return;
            }
        }

        let role = self.role.as_str();
        let mentions = |needles: &[&str]| needles.iter().any(|n| role.contains(n));

        for &(needles, frame_type) in ROLE_TO_TYPE {
            if mentions(needles) {
                add_credit(frames, frame_type, &self.name);
            }
        }
        for &(needles, label) in ROLE_TO_ARRANGEMENT {
            if mentions(needles) {
                frames.add_involved_people(FrameType::Arranger, label, &self.name);
            }
        }
        if mentions(INSTRUMENTS) {
            frames.add_involved_people(FrameType::Performer, role, &self.name);
        }
    }
}

/// Append a name to a credit frame, separated by a comma.
fn add_credit(frames: &mut FrameCollection, frame_type: FrameType, name: &str) {
    let current = frames.get(frame_type);
    let value = if current.is_empty() {
        name.to_string()
    } else {
        format!("{current}, {name}")
    };
    frames.set_value(frame_type, value);
}
