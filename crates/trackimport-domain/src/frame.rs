// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used to flatten multi-valued fields into a single string.
pub const STRING_LIST_SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Title,
    Artist,
    Album,
    Comment,
    Date,
    Track,
    Genre,
    AlbumArtist,
    Arranger,
    Author,
    CatalogNumber,
    Composer,
    Conductor,
    Disc,
    Lyricist,
    Media,
    Part,
    Performer,
    Publisher,
    ReleaseCountry,
    Remixer,
}

impl FrameType {
    pub const ALL: [FrameType; 21] = [
        FrameType::Title,
        FrameType::Artist,
        FrameType::Album,
        FrameType::Comment,
        FrameType::Date,
        FrameType::Track,
        FrameType::Genre,
        FrameType::AlbumArtist,
        FrameType::Arranger,
        FrameType::Author,
        FrameType::CatalogNumber,
        FrameType::Composer,
        FrameType::Conductor,
        FrameType::Disc,
        FrameType::Lyricist,
        FrameType::Media,
        FrameType::Part,
        FrameType::Performer,
        FrameType::Publisher,
        FrameType::ReleaseCountry,
        FrameType::Remixer,
    ];

    /// Title, artist, album, comment, year, track and genre.
    pub fn is_standard(self) -> bool {
        matches!(
            self,
            FrameType::Title
                | FrameType::Artist
                | FrameType::Album
                | FrameType::Comment
                | FrameType::Date
                | FrameType::Track
                | FrameType::Genre
        )
    }

    /// Fields holding alternating role/name entries.
    pub fn is_involved_people(self) -> bool {
        matches!(self, FrameType::Arranger | FrameType::Performer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FrameType::Title => "title",
            FrameType::Artist => "artist",
            FrameType::Album => "album",
            FrameType::Comment => "comment",
            FrameType::Date => "date",
            FrameType::Track => "track",
            FrameType::Genre => "genre",
            FrameType::AlbumArtist => "album_artist",
            FrameType::Arranger => "arranger",
            FrameType::Author => "author",
            FrameType::CatalogNumber => "catalog_number",
            FrameType::Composer => "composer",
            FrameType::Conductor => "conductor",
            FrameType::Disc => "disc",
            FrameType::Lyricist => "lyricist",
            FrameType::Media => "media",
            FrameType::Part => "part",
            FrameType::Performer => "performer",
            FrameType::Publisher => "publisher",
            FrameType::ReleaseCountry => "release_country",
            FrameType::Remixer => "remixer",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join entries with [`STRING_LIST_SEPARATOR`]. Backslashes and separators
/// inside entries are escaped with a backslash.
pub fn join_string_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let escaped: Vec<String> = items
        .into_iter()
        .map(|s| s.as_ref().replace('\\', "\\\\").replace('|', "\\|"))
        .collect();
    escaped.join("|")
}

/// Inverse of [`join_string_list`]. An empty string yields an empty list.
pub fn split_string_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('|' | '\\')) => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '|' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Tag fields of one track keyed by [`FrameType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameCollection {
    frames: BTreeMap<FrameType, String>,
}

impl FrameCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Value of a field, empty when absent.
    pub fn get(&self, frame_type: FrameType) -> &str {
        self.frames.get(&frame_type).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, frame_type: FrameType) -> bool {
        self.frames.contains_key(&frame_type)
    }

    /// Overwrite a field. The field is kept even when `value` is empty so
    /// that writing the collection to a file clears it there.
    pub fn set_value(&mut self, frame_type: FrameType, value: impl Into<String>) {
        self.frames.insert(frame_type, value.into());
    }

    pub fn remove(&mut self, frame_type: FrameType) -> Option<String> {
        self.frames.remove(&frame_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameType, &str)> {
        self.frames.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn title(&self) -> &str {
        self.get(FrameType::Title)
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.set_value(FrameType::Title, value);
    }

    pub fn artist(&self) -> &str {
        self.get(FrameType::Artist)
    }

    pub fn set_artist(&mut self, value: impl Into<String>) {
        self.set_value(FrameType::Artist, value);
    }

    pub fn album(&self) -> &str {
        self.get(FrameType::Album)
    }

    pub fn set_album(&mut self, value: impl Into<String>) {
        self.set_value(FrameType::Album, value);
    }

    pub fn genre(&self) -> &str {
        self.get(FrameType::Genre)
    }

    pub fn set_genre(&mut self, value: impl Into<String>) {
        self.set_value(FrameType::Genre, value);
    }

    /// Leading number of the date field, 0 when there is none.
    pub fn year(&self) -> u32 {
        leading_number(self.get(FrameType::Date))
    }

    pub fn set_year(&mut self, year: u32) {
        self.set_number(FrameType::Date, year);
    }

    /// Track number; a "3/12" value yields 3.
    pub fn track(&self) -> u32 {
        leading_number(self.get(FrameType::Track))
    }

    pub fn set_track(&mut self, track: u32) {
        self.set_number(FrameType::Track, track);
    }

    /// Set a numeric field, 0 clears it.
    pub fn set_number(&mut self, frame_type: FrameType, value: u32) {
        if value == 0 {
            self.set_value(frame_type, "");
        } else {
            self.set_value(frame_type, value.to_string());
        }
    }

    /// Append a role/name pair to an involved people field.
    pub fn add_involved_people(&mut self, frame_type: FrameType, role: &str, name: &str) {
        let entry = join_string_list([role, name]);
        self.append_list_value(frame_type, &entry);
    }

    /// Append an already joined entry, keeping the values already present.
    pub fn append_list_value(&mut self, frame_type: FrameType, entry: &str) {
        let current = self.frames.entry(frame_type).or_default();
        if current.is_empty() {
            current.push_str(entry);
        } else {
            current.push(STRING_LIST_SEPARATOR);
            current.push_str(entry);
        }
    }
}

fn leading_number(value: &str) -> u32 {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureType {
    CoverFront,
}

/// Embedded picture handed to a [`crate::TaggedFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureFrame {
    pub picture_type: PictureType,
    pub mime_type: String,
    pub description: String,
    pub data: Vec<u8>,
}

impl PictureFrame {
    pub fn cover_front(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            picture_type: PictureType::CoverFront,
            mime_type: mime_type.into(),
            description: String::new(),
            data,
        }
    }
}
