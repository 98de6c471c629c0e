// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// One import source of a batch profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSource {
    pub name: String,
    /// Minimum accuracy in percent for the result to be accepted.
    pub required_accuracy: u8,
    pub standard_tags: bool,
    pub additional_tags: bool,
    pub cover_art: bool,
}

impl ProfileSource {
    pub fn new(name: impl Into<String>, required_accuracy: u8) -> Self {
        Self {
            name: name.into(),
            required_accuracy,
            standard_tags: true,
            additional_tags: true,
            cover_art: true,
        }
    }
}

/// Named, ordered list of sources tried for every album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchImportProfile {
    pub name: String,
    pub sources: Vec<ProfileSource>,
}

impl BatchImportProfile {
    pub fn new(name: impl Into<String>, sources: Vec<ProfileSource>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    /// Build a profile from the `"Name:Accuracy:Flags;..."` form.
    pub fn from_sources_str(name: impl Into<String>, sources: &str) -> Self {
        Self::new(name, sources_from_str(sources))
    }
}

/// Parse `"Name:Accuracy:Flags;..."` where flags contain `S`, `A` and `C`.
///
/// Malformed entries are skipped.
pub fn sources_from_str(value: &str) -> Vec<ProfileSource> {
    value
        .split(';')
        .filter_map(|entry| {
            let mut parts = entry.split(':');
            let name = parts.next()?.trim();
            let accuracy = parts.next()?.trim().parse::<u8>().ok()?;
            let flags = parts.next()?;
            if name.is_empty() || parts.next().is_some() {
                return None;
            }
            Some(ProfileSource {
                name: name.to_string(),
                required_accuracy: accuracy.min(100),
                standard_tags: flags.contains('S'),
                additional_tags: flags.contains('A'),
                cover_art: flags.contains('C'),
            })
        })
        .collect()
}

pub fn sources_to_string(sources: &[ProfileSource]) -> String {
    sources
        .iter()
        .map(|s| {
            let mut flags = String::new();
            if s.standard_tags {
                flags.push('S');
            }
            if s.additional_tags {
                flags.push('A');
            }
            if s.cover_art {
                flags.push('C');
            }
            format!("{}:{}:{}", s.name, s.required_accuracy, flags)
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_string() {
        let sources = sources_from_str("MusicBrainz Release:75:SAC;gnudb.org:50:S");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "MusicBrainz Release");
        assert_eq!(sources[0].required_accuracy, 75);
        assert!(sources[0].standard_tags && sources[0].additional_tags && sources[0].cover_art);
        assert_eq!(sources[1].name, "gnudb.org");
        assert!(sources[1].standard_tags);
        assert!(!sources[1].additional_tags && !sources[1].cover_art);
    }

    #[test]
    fn profile_string_round_trips() {
        let text = "Amazon:75:C;Discogs:100:SA";
        assert_eq!(sources_to_string(&sources_from_str(text)), text);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        assert!(sources_from_str("").is_empty());
        let sources = sources_from_str("Discogs:x:S;:75:S;Amazon:75:C");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Amazon");
    }
}
