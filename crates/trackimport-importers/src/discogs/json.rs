// SPDX-License-Identifier: GPL-3.0-or-later

//! Responses of the Discogs JSON API.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use trackimport_domain::{AlbumListModel, FrameCollection, FrameType, ImportTrackDataVector};

use super::credits::ExtraArtist;
use super::{first_known_genre, release_title};
use crate::importer::ImportFlags;
use crate::merge::{duration_seconds, merge_tracks, ParsedTrack};

lazy_static! {
    static ref NUMBER_SUFFIX_RE: Regex =
        Regex::new(r"[*\s]*\(\d+\)").expect("number suffix regex is valid");
    static ref TRAILING_STAR_RE: Regex =
        Regex::new(r"\*($| - |, | / )").expect("trailing star regex is valid");
    static ref TRACKS_SEP_RE: Regex = Regex::new(r",\s*").expect("tracks separator regex is valid");
    static ref DISC_TRACK_POS_RE: Regex =
        Regex::new(r"^(\d+)-(\d+)$").expect("disc track position regex is valid");
    static ref YEAR_MONTH_RE: Regex = Regex::new(r"^\d{4}-\d{2}").expect("year regex is valid");
}

/// Remove disambiguation numbers like "(2)" and trailing stars from a name.
pub fn fix_up_artist(name: &str) -> String {
    let without_number = NUMBER_SUFFIX_RE.replace_all(name, "");
    TRAILING_STAR_RE
        .replace_all(&without_number, "${1}")
        .into_owned()
}

/// Join the names of an artist list with the join words given there.
fn artist_string(artists: &[Value]) -> String {
    let mut artist = String::new();
    let mut join = String::new();
    for entry in artists {
        if !artist.is_empty() {
            artist.push_str(&join);
        }
        artist.push_str(&fix_up_artist(str_field(entry, "name")));
        join = match str_field(entry, "join") {
            "" | "," => ", ".to_string(),
            other => format!(" {other} "),
        };
    }
    artist
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn list_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn extra_artist(value: &Value) -> ExtraArtist {
    let tracks = str_field(value, "tracks");
    ExtraArtist {
        name: fix_up_artist(str_field(value, "name")),
        role: str_field(value, "role").to_string(),
        tracks: if tracks.is_empty() {
            Vec::new()
        } else {
            TRACKS_SEP_RE.split(tracks).map(str::to_string).collect()
        },
    }
}

/// Seconds of an "h:m:s" or "m:s" duration, 0 when empty.
fn parse_duration(value: &str) -> u32 {
    duration_seconds(value.split(':'))
}

fn parse_json(data: &[u8]) -> Option<Value> {
    match serde_json::from_slice(data) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(target: "discogs", error = %e, "discogs response is not valid JSON");
            None
        }
    }
}

pub fn parse_find_results(data: &[u8], albums: &mut AlbumListModel) {
    albums.clear();
    let Some(root) = parse_json(data) else {
        return;
    };
    for result in list_field(&root, "results") {
        let title = fix_up_artist(str_field(result, "title"));
        if title.is_empty() {
            continue;
        }
        let year = match result.get("year") {
            Some(Value::String(year)) => year.clone(),
            Some(Value::Number(year)) => year.to_string(),
            _ => String::new(),
        };
        let formats: Vec<&str> = list_field(result, "format")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        let id = result.get("id").and_then(Value::as_i64).unwrap_or(0);
        albums.append_item(release_title(&title, &year, &formats), "releases", id.to_string());
    }
}

pub fn parse_album_results(data: &[u8], flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
    let Some(root) = parse_json(data) else {
        return;
    };

    let mut header = FrameCollection::new();
    if flags.standard_tags {
        header.set_album(str_field(&root, "title"));
        header.set_artist(artist_string(list_field(&root, "artists")));

        let released = str_field(&root, "released");
        let year = if YEAR_MONTH_RE.is_match(released) {
            &released[..4]
        } else {
            released
        };
        header.set_year(year.parse().unwrap_or(0));

        let genres: Vec<&str> = list_field(&root, "styles")
            .iter()
            .chain(list_field(&root, "genres"))
            .filter_map(Value::as_str)
            .collect();
        if let Some(genre) = first_known_genre(&genres) {
            header.set_genre(genre);
        }
    }

    tracks.cover_art_url.clear();
    if flags.cover_art {
        if let Some(image) = list_field(&root, "images").first() {
            tracks.cover_art_url = str_field(image, "uri").to_string();
        }
    }

    let mut restricted_credits = Vec::new();
    if flags.additional_tags {
        if let Some(label) = list_field(&root, "labels").first() {
            header.set_value(FrameType::Publisher, fix_up_artist(str_field(label, "name")));
            let catalog_number = str_field(label, "catno");
            if !catalog_number.is_empty() && catalog_number.to_lowercase() != "none" {
                header.set_value(FrameType::CatalogNumber, catalog_number);
            }
        }
        if let Some(format) = list_field(&root, "formats").first() {
            header.set_value(FrameType::Media, str_field(format, "name"));
        }
        for credit in list_field(&root, "extraartists").iter().map(extra_artist) {
            if credit.has_track_restriction() {
                restricted_credits.push(credit);
            } else {
                credit.add_to_frames(&mut header, None);
            }
        }
        let country = str_field(&root, "country");
        if !country.is_empty() {
            header.set_value(FrameType::ReleaseCountry, country);
        }
    }

    let track_list = list_field(&root, "tracklist");
    let all_positions_empty = track_list
        .iter()
        .all(|track| str_field(track, "position").is_empty());

    let mut parsed = Vec::new();
    let mut frames = header.clone();
    let mut track_nr = 1;
    for track in track_list {
        let position = str_field(track, "position");
        let number = match position.parse::<u32>() {
            Ok(number) => number,
            Err(_) => match DISC_TRACK_POS_RE.captures(position) {
                Some(caps) => {
                    if flags.additional_tags {
                        frames.set_value(FrameType::Disc, &caps[1]);
                    }
                    caps[2].parse().unwrap_or(0)
                }
                None => track_nr,
            },
        };
        let title = str_field(track, "title");
        let duration = parse_duration(str_field(track, "duration"));

        if !all_positions_empty && position.is_empty() {
            // Heading rows name the part of the following tracks.
            if flags.additional_tags {
                header.set_value(FrameType::Part, title);
            }
        } else if !title.is_empty() || duration != 0 {
            if flags.standard_tags {
                frames.set_track(number);
                frames.set_title(title);
            }
            let artists = list_field(track, "artists");
            if !artists.is_empty() {
                if flags.standard_tags {
                    frames.set_artist(artist_string(artists));
                }
                if flags.additional_tags {
                    frames.set_value(FrameType::AlbumArtist, header.artist());
                }
            }
            if flags.additional_tags {
                for credit in list_field(track, "extraartists").iter().map(extra_artist) {
                    credit.add_to_frames(&mut frames, None);
                }
            }
            for credit in &restricted_credits {
                credit.add_to_frames(&mut frames, Some(position));
            }
            parsed.push(ParsedTrack::new(frames, duration));
            track_nr += 1;
        }
        frames = header.clone();
    }

    debug!(target: "discogs", tracks = parsed.len(), "discogs release parsed");
    merge_tracks(tracks, parsed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_up_artist_names() {
        assert_eq!(fix_up_artist("Wizard (23)"), "Wizard");
        assert_eq!(fix_up_artist("Wizard (23) - Odin"), "Wizard - Odin");
        assert_eq!(fix_up_artist("Nena*"), "Nena");
        assert_eq!(fix_up_artist("Kim Wilde* / Nena*"), "Kim Wilde / Nena");
        assert_eq!(fix_up_artist("Various* (2), Others"), "Various, Others");
    }

    #[test]
    fn joins_artists() {
        let artists: Value = serde_json::json!([
            {"name": "Lee Hazlewood*", "join": "&"},
            {"name": "Nancy Sinatra", "join": ","},
            {"name": "Duane Eddy (2)", "join": ""}
        ]);
        let artists = artists.as_array().cloned().unwrap_or_default();
        assert_eq!(
            artist_string(&artists),
            "Lee Hazlewood & Nancy Sinatra, Duane Eddy"
        );
    }

    #[test]
    fn durations_fold_base_sixty() {
        assert_eq!(parse_duration("5:19"), 319);
        assert_eq!(parse_duration("1:02:03"), 3723);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("99999999:00"), 0);
    }

    #[test]
    fn oversized_track_duration_is_dropped() {
        let data = serde_json::json!({
            "title": "Endless",
            "artists": [{"name": "Band", "join": ""}],
            "tracklist": [
                {"position": "1", "title": "Forever", "duration": "99999999:00"},
                {"position": "2", "title": "Short", "duration": "0:42"}
            ]
        });
        let bytes = serde_json::to_vec(&data).unwrap_or_default();
        let mut tracks = ImportTrackDataVector::new();
        parse_album_results(&bytes, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks.tracks[0].frames.title(), "Forever");
        assert_eq!(tracks.tracks[0].import_duration, 0);
        assert_eq!(tracks.tracks[1].import_duration, 42);
    }

    #[test]
    fn disc_positions_and_headings() {
        let data = serde_json::json!({
            "title": "Live",
            "artists": [{"name": "Band", "join": ""}],
            "released": "1999-05-01",
            "styles": ["Krautrock"],
            "genres": ["Electronic"],
            "extraartists": [
                {"name": "Producer Person", "role": "Producer", "tracks": ""},
                {"name": "Singer (3)", "role": "Vocals", "tracks": "1-2"}
            ],
            "tracklist": [
                {"position": "", "title": "Part One", "duration": ""},
                {"position": "1-1", "title": "Opening", "duration": "3:00"},
                {"position": "1-2", "title": "Second", "duration": "4:00",
                 "artists": [{"name": "Guest", "join": ""}]}
            ]
        });
        let bytes = serde_json::to_vec(&data).unwrap_or_default();
        let mut tracks = ImportTrackDataVector::new();
        parse_album_results(&bytes, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 2);
        let first = &tracks.tracks[0].frames;
        assert_eq!(first.year(), 1999);
        assert_eq!(first.genre(), "Krautrock");
        assert_eq!(first.get(FrameType::Disc), "1");
        assert_eq!(first.get(FrameType::Part), "Part One");
        assert_eq!(first.track(), 1);
        assert_eq!(first.get(FrameType::Arranger), "Producer|Producer Person");
        assert_eq!(first.get(FrameType::Performer), "");

        let second = &tracks.tracks[1].frames;
        assert_eq!(second.track(), 2);
        assert_eq!(second.artist(), "Guest");
        assert_eq!(second.get(FrameType::AlbumArtist), "Band");
        assert_eq!(second.get(FrameType::Performer), "Vocals|Singer");
        assert_eq!(tracks.tracks[1].import_duration, 240);
    }

    #[test]
    fn invalid_json_leaves_tracks() {
        let mut tracks = ImportTrackDataVector::new();
        tracks.cover_art_url = "http://example.com/cover.jpg".to_string();
        parse_album_results(b"<html>", ImportFlags::ALL, &mut tracks);
        assert!(tracks.is_empty());
        assert_eq!(tracks.cover_art_url, "http://example.com/cover.jpg");
    }
}
