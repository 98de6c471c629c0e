// SPDX-License-Identifier: GPL-3.0-or-later

//! Scraping of the Discogs web site, used when no API token is configured.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use trackimport_domain::{AlbumListModel, FrameCollection, FrameType, ImportTrackDataVector};

use super::credits::apply_page_credit;
use super::{first_known_genre, release_title};
use crate::html::{find_from, remove_html};
use crate::importer::ImportFlags;
use crate::merge::{duration_seconds, merge_tracks, ParsedTrack};

lazy_static! {
    static ref ID_TITLE_RE: Regex = Regex::new(r#"<a href="/([^/]*/?release)/([0-9]+)">(.+)</a>"#)
        .expect("release link regex is valid");
    static ref EXTRA_RE: Regex = Regex::new(r#"class="search_result_extra">([^<]*)<"#)
        .expect("result extra regex is valid");
    static ref NL_SPACE_RE: Regex = Regex::new(r"[\r\n]+\s*").expect("newline regex is valid");
    static ref AT_DISCOGS_RE: Regex =
        Regex::new(r"\s*\([^)]+\) at Discogs$").expect("title suffix regex is valid");
    static ref YEAR_RE: Regex = Regex::new(r"(\d{4})").expect("year regex is valid");
    static ref GENRE_SEP_RE: Regex = Regex::new(r",\s*").expect("genre separator regex is valid");
    static ref COMMA_RE: Regex = Regex::new(r",(\S)").expect("comma regex is valid");
    static ref TRAILING_STAR_RE: Regex = Regex::new(r"\*$").expect("star regex is valid");
    static ref NUMBER_TRACKS_RE: Regex = Regex::new(r"[*\s]*\(\d+\)\(tracks:[^)]+\)")
        .expect("track restriction regex is valid");
    static ref SUFFIX_BEFORE_JOIN_RE: Regex = Regex::new(
        r"[*\s]*\((?:\d+|tracks:[^)]+)\)(\s*/\s*,|\s*&amp;|\s*And|\s*and)"
    )
    .expect("suffix before join regex is valid");
    static ref SUFFIX_AT_END_RE: Regex =
        Regex::new(r"[*\s]*\((?:\d+|tracks:[^)]+)\)$").expect("suffix regex is valid");
    static ref POS_RE: Regex =
        Regex::new(r#"<td [^>]*class="track_pos">(\d+)</td>"#).expect("position regex is valid");
    static ref ARTISTS_RE: Regex =
        Regex::new(r#"<td class="track_artists"><a href="/artist/[^>]+>([^<]+)</a>"#)
            .expect("track artist regex is valid");
    static ref TITLE_RE: Regex =
        Regex::new(r#"class="track_title"[^>]*>([^<]+)<"#).expect("title regex is valid");
    static ref DURATION_RE: Regex =
        Regex::new(r#"<td [^>]*class="track_duration"[^>]*>(?:<span>)?(\d+):(\d+)</"#)
            .expect("duration regex is valid");
    static ref INDEX_RE: Regex =
        Regex::new(r#"<td class="track_index">([^<]+)$"#).expect("index regex is valid");
    static ref ROW_END_RE: Regex = Regex::new(r"</td>\s*</tr>").expect("row end regex is valid");
}

/// Clean up an artist name of the web site: normalize separators, drop
/// stars and disambiguation suffixes, strip markup.
pub fn fix_up_artist(name: &str) -> String {
    let text = COMMA_RE.replace_all(name, ", ${1}");
    let text = text.replace("* / ", " / ").replace("*,", ",");
    let text = TRAILING_STAR_RE.replace(&text, "");
    let text = NUMBER_TRACKS_RE.replace_all(&text, "");
    let text = SUFFIX_BEFORE_JOIN_RE.replace_all(&text, "${1}");
    let text = SUFFIX_AT_END_RE.replace(&text, "");
    remove_html(&text)
}

/// Text between `marker` and the next `terminator`. A terminator directly
/// after the marker is skipped, so "Released:</div><div>1999</div>" gives
/// "</div><div>1999".
fn section<'a>(text: &'a str, marker: &str, terminator: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let end = find_from(text, terminator, start + 1)?;
    (end > start).then(|| &text[start..end])
}

/// Apply lines like "Composed By, Lyrics By - Iommi" to `frames`.
fn parse_credits(text: &str, frames: &mut FrameCollection) -> bool {
    let mut found = false;
    for line in text.split('\n') {
        let Some(name_start) = line.find(" - ") else {
            continue;
        };
        let name = fix_up_artist(&line[name_start + 3..]);
        for credit in line[..name_start].split(", ") {
            found |= apply_page_credit(credit, &name, frames);
        }
    }
    found
}

/// Year and format list of a result line like
/// "LMP - LMP 0303-054 Ltd. CD - CD, Album, Ltd - Germany - 2003".
fn result_extra(extra: &str) -> (&str, Vec<&str>) {
    let fields: Vec<&str> = extra.split(" - ").map(str::trim).collect();
    let year = fields
        .last()
        .filter(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
        .copied()
        .unwrap_or("");
    let formats = fields
        .get(2)
        .copied()
        .map(|formats| GENRE_SEP_RE.split(formats).collect())
        .unwrap_or_default();
    (year, formats)
}

pub fn parse_find_results(text: &str, albums: &mut AlbumListModel) {
    albums.clear();
    // Release link waiting for its year and formats line.
    let mut pending: Option<(String, String, String)> = None;
    for line in text.split('\n').map(|line| line.trim_end_matches('\r')) {
        if let Some(caps) = ID_TITLE_RE.captures(line) {
            if let Some((title, category, id)) = pending.take() {
                albums.append_item(title, category, id);
            }
            let title = super::json::fix_up_artist(&remove_html(&caps[3]));
            if !title.is_empty() {
                pending = Some((title, caps[1].to_string(), caps[2].to_string()));
            }
        } else if let Some(caps) = EXTRA_RE.captures(line) {
            if let Some((title, category, id)) = pending.take() {
                let (year, formats) = result_extra(&caps[1]);
                albums.append_item(release_title(&title, year, &formats), category, id);
            }
        }
    }
    if let Some((title, category, id)) = pending {
        albums.append_item(title, category, id);
    }
    debug!(target: "discogs", results = albums.len(), "search page parsed");
}

fn parse_header(text: &str, flags: ImportFlags) -> FrameCollection {
    let mut header = FrameCollection::new();

    if flags.standard_tags {
        if let Some(title) = section(text, "<title>", "</title>") {
            let title = AT_DISCOGS_RE.replace(title, "");
            let title = NL_SPACE_RE.replace_all(&title, " ");
            let album = match title.find(" - ").filter(|pos| *pos > 0) {
                Some(pos) => {
                    header.set_artist(fix_up_artist(&title[..pos]));
                    &title[pos + 3..]
                }
                None => &title[..],
            };
            header.set_album(remove_html(album));
        }

        if let Some(released) = section(text, "Released:", "</div>") {
            let released = remove_html(&NL_SPACE_RE.replace_all(released, ""));
            if let Some(caps) = YEAR_RE.captures(&released) {
                header.set_year(caps[1].parse().unwrap_or(0));
            }
        }

        let mut genres = Vec::new();
        for field in ["Style:", "Genre:"] {
            if let Some(value) = section(text, field, "</div>") {
                let value = remove_html(&NL_SPACE_RE.replace_all(value, ""));
                if value.contains(',') {
                    genres.extend(GENRE_SEP_RE.split(&value).map(str::to_string));
                } else if !value.is_empty() {
                    genres.push(value);
                }
            }
        }
        if let Some(genre) = first_known_genre(&genres) {
            header.set_genre(genre);
        }
    }

    if flags.additional_tags {
        if let Some(label) = section(text, "Label:", "</div>") {
            let label = fix_up_artist(&NL_SPACE_RE.replace_all(label, ""));
            if label != "Not On Label" {
                header.set_value(FrameType::Publisher, label);
            }
        }
        if let Some(format) = section(text, "Format:", "</div>") {
            let media = remove_html(&NL_SPACE_RE.replace_all(format, ""));
            header.set_value(FrameType::Media, media);
        }
        if let Some(credits) = section(text, "<h1>Credits</h1>", "</div>") {
            let credits = NL_SPACE_RE.replace_all(credits, "").replace("<br />", "\n");
            parse_credits(&remove_html(&credits), &mut header);
        }
    }

    header
}

fn cover_art_url(text: &str) -> Option<&str> {
    const IMAGE_START: &str = "<img src=\"http://www.discogs.com/image/";
    let start = text.find(IMAGE_START)? + "<img src=\"".len();
    let end = find_from(text, "\"", start)?;
    (end > start).then(|| &text[start..end])
}

pub fn parse_album_results(text: &str, flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
    let mut header = parse_header(text, flags);

    tracks.cover_art_url.clear();
    if flags.cover_art {
        if let Some(url) = cover_art_url(text) {
            tracks.cover_art_url = url.to_string();
        }
    }

    let Some(start) = text.find(">Tracklist</") else {
        return;
    };
    let Some(end) = find_from(text, "</table>", start).filter(|end| *end > start) else {
        return;
    };
    let table = NL_SPACE_RE.replace_all(&text[start..end], "");

    let mut parsed = Vec::new();
    let mut frames = header.clone();
    let mut track_nr = 1;
    let mut row_start = 0;
    while let Some(row_end) = ROW_END_RE
        .find_at(&table, row_start)
        .filter(|m| m.start() > row_start)
    {
        let row = &table[row_start..row_end.start()];
        row_start = row_end.end();

        let title = TITLE_RE
            .captures(row)
            .map(|caps| remove_html(&caps[1]))
            .unwrap_or_default();
        let duration = DURATION_RE
            .captures(row)
            .map(|caps| duration_seconds([&caps[1], &caps[2]]))
            .unwrap_or(0);
        let number = POS_RE
            .captures(row)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(track_nr);

        if let Some(caps) = ARTISTS_RE.captures(row) {
            if flags.standard_tags {
                frames.set_artist(fix_up_artist(&caps[1]));
            }
            if flags.additional_tags {
                frames.set_value(FrameType::AlbumArtist, header.artist());
            }
        }

        if let Some(caps) = INDEX_RE.captures(row) {
            // Index rows carry the subtitle of the following tracks.
            if flags.additional_tags {
                let subtitle = remove_html(&caps[1]);
                header.set_value(FrameType::Part, subtitle.as_str());
                frames.set_value(FrameType::Part, subtitle);
            }
            continue;
        }

        if flags.additional_tags {
            if let Some(quote) = section(row, "<blockquote>", "</blockquote>") {
                let quote = remove_html(&quote.replace("<br />", "\n"));
                parse_credits(&quote, &mut frames);
            }
        }

        if !title.is_empty() || duration != 0 {
            if flags.standard_tags {
                frames.set_track(number);
                frames.set_title(title);
            }
            parsed.push(ParsedTrack::new(frames, duration));
            track_nr += 1;
        }
        frames = header.clone();
    }

    debug!(target: "discogs", tracks = parsed.len(), "discogs page parsed");
    merge_tracks(tracks, parsed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_up_page_artists() {
        assert_eq!(fix_up_artist("Amon Amarth"), "Amon Amarth");
        assert_eq!(fix_up_artist("Nena*,Kim Wilde*"), "Nena, Kim Wilde");
        assert_eq!(fix_up_artist("Wizard (23)"), "Wizard");
        assert_eq!(fix_up_artist("Kim Wilde* / Nena"), "Kim Wilde / Nena");
        assert_eq!(fix_up_artist("Singer (2) &amp; Band"), "Singer & Band");
        assert_eq!(fix_up_artist("<a href=\"/artist/x\">Tony Iommi</a>"), "Tony Iommi");
    }

    #[test]
    fn result_extra_gives_year_and_formats() {
        let (year, formats) =
            result_extra("LMP - LMP 0303-054 Ltd. CD - CD, Album, Ltd, Enh - Germany - 2003");
        assert_eq!(year, "2003");
        assert_eq!(formats, vec!["CD", "Album", "Ltd", "Enh"]);

        let (year, formats) = result_extra("LMP - Germany");
        assert_eq!(year, "");
        assert!(formats.is_empty());
    }

    #[test]
    fn credits_lines_are_parsed() {
        let mut frames = FrameCollection::new();
        let found = parse_credits(
            "Composed By, Lyrics By - Iommi\nPhotography - Nobody\nno separator",
            &mut frames,
        );
        assert!(found);
        assert_eq!(frames.get(FrameType::Composer), "Iommi");
        assert_eq!(frames.get(FrameType::Lyricist), "Iommi");
        assert!(!frames.contains(FrameType::Arranger));
    }

    #[test]
    fn index_rows_set_part() {
        let page = concat!(
            "<h1>Tracklist</h1><table>\n",
            "<tr><td class=\"track_index\">Odin Suite</td></tr>\n",
            "<tr><td class=\"track_pos\">1</td><td class=\"track_title\">Intro</td>",
            "<td class=\"track_duration\">1:05</td><td class=\"track_itunes\"></td></tr>\n",
            "</table>"
        );
        let mut tracks = ImportTrackDataVector::new();
        parse_album_results(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 1);
        let frames = &tracks.tracks[0].frames;
        assert_eq!(frames.title(), "Intro");
        assert_eq!(frames.get(FrameType::Part), "Odin Suite");
        assert_eq!(tracks.tracks[0].import_duration, 65);
    }

    #[test]
    fn oversized_row_duration_is_dropped() {
        let page = concat!(
            "<h1>Tracklist</h1><table>\n",
            "<tr><td class=\"track_pos\">1</td><td class=\"track_title\">Drone</td>",
            "<td class=\"track_duration\">99999999:59</td><td class=\"track_itunes\"></td></tr>\n",
            "</table>"
        );
        let mut tracks = ImportTrackDataVector::new();
        parse_album_results(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks.tracks[0].frames.title(), "Drone");
        assert_eq!(tracks.tracks[0].import_duration, 0);
    }
}
