// SPDX-License-Identifier: GPL-3.0-or-later

//! Tags derived from a file path and a format such as
//! `%{artist} - %{album}/%{track} %{title}`.
//!
//! Batch imports use this when an album group carries neither artist nor
//! album tags. The format is matched against the end of the path with the
//! extension removed, so it may name directory levels with `/`. Codes come in
//! a long form (`%{artist}`) and the one letter form `%a`, `%l`, `%s`, `%t`,
//! `%y`, `%g`, `%c`, `%d`; `%%` is a literal percent sign.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};
use trackimport_domain::{FrameCollection, FrameType};

#[derive(Debug, Error)]
pub enum FilenameFormatError {
    #[error("Unknown format code: {0}")]
    UnknownCode(String),

    #[error("Unterminated format code at offset {0}")]
    Unterminated(usize),

    #[error("Format has no codes: {0}")]
    NoCodes(String),

    #[error("Invalid format pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type FilenameFormatResult<T> = Result<T, FilenameFormatError>;

lazy_static! {
    static ref EXTENSION_RE: Regex =
        Regex::new(r"\.[^./\\]{1,5}$").expect("extension regex is valid");
}

fn frame_type_for_code(code: &str) -> Option<FrameType> {
    let frame_type = match code {
        "artist" | "a" => FrameType::Artist,
        "album" | "l" => FrameType::Album,
        "title" | "s" => FrameType::Title,
        "track" | "tracknumber" | "t" => FrameType::Track,
        "year" | "date" | "y" => FrameType::Date,
        "genre" | "g" => FrameType::Genre,
        "comment" | "c" => FrameType::Comment,
        "disc" | "discnumber" | "d" => FrameType::Disc,
        "albumartist" => FrameType::AlbumArtist,
        "composer" => FrameType::Composer,
        _ => return None,
    };
    Some(frame_type)
}

fn is_numeric(frame_type: FrameType) -> bool {
    matches!(frame_type, FrameType::Track | FrameType::Date | FrameType::Disc)
}

/// Compiled filename format.
#[derive(Debug, Clone)]
pub struct FilenameFormat {
    format: String,
    regex: Regex,
    /// Frame type of each capture group, in group order.
    fields: Vec<FrameType>,
}

impl FilenameFormat {
    pub fn new(format: &str) -> FilenameFormatResult<Self> {
        let mut pattern = String::from("(?:^|/)");
        let mut fields = Vec::new();
        let mut literal = String::new();
        let mut chars = format.char_indices();

        while let Some((offset, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let code = match chars.next() {
                Some((_, '%')) => {
                    literal.push('%');
                    continue;
                }
                Some((_, '{')) => {
                    let mut code = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, ch)) => code.push(ch),
                            None => return Err(FilenameFormatError::Unterminated(offset)),
                        }
                    }
                    code
                }
                Some((_, ch)) => ch.to_string(),
                None => return Err(FilenameFormatError::Unterminated(offset)),
            };
            let frame_type = frame_type_for_code(&code.to_lowercase())
                .ok_or_else(|| FilenameFormatError::UnknownCode(code.clone()))?;

            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            pattern.push_str(if is_numeric(frame_type) {
                r"(\d+)"
            } else {
                r"([^/]+?)"
            });
            fields.push(frame_type);
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        if fields.is_empty() {
            return Err(FilenameFormatError::NoCodes(format.to_string()));
        }
        trace!(target: "matching", format, pattern = %pattern, "compiled filename format");
        Ok(Self {
            format: format.to_string(),
            regex: Regex::new(&pattern)?,
            fields,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.format
    }

    /// Tags found in `path`, `None` when the path does not fit the format.
    pub fn parse(&self, path: impl AsRef<Path>) -> Option<FrameCollection> {
        let path = path.as_ref().to_string_lossy().replace('\\', "/");
        let stem = EXTENSION_RE.replace(&path, "");

        let Some(captures) = self.regex.captures(&stem) else {
            debug!(target: "matching", path = %path, format = %self.format, "path does not match filename format");
            return None;
        };

        let mut frames = FrameCollection::new();
        for (frame_type, value) in self
            .fields
            .iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(frame_type, m)| m.map(|m| (*frame_type, m.as_str().trim())))
        {
            if value.is_empty() {
                continue;
            }
            if is_numeric(frame_type) {
                frames.set_number(frame_type, value.parse().unwrap_or(0));
            } else {
                frames.set_value(frame_type, value);
            }
        }
        debug!(target: "matching", path = %path, fields = frames.len(), "tags derived from path");
        Some(frames)
    }
}
