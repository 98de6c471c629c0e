// SPDX-License-Identifier: GPL-3.0-or-later

//! Amazon product page scraping. Only the English sites are understood.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use trackimport_config::ServerImporterConfig;
use trackimport_domain::{AlbumListModel, FrameCollection, FrameType, ImportTrackDataVector};
use trackimport_http::HttpRequest;

use crate::html::{decode_with_fallback, find_from, remove_html, replace_html_entities};
use crate::importer::{encode_url_query, server_request, FindQuery, ImportFlags, Importer};
use crate::merge::{apply_header, duration_seconds, merge_tracks, ParsedTrack};

const TITLE_COL: &str = "class=\"titleCol\"";
const LIST_ROW: &str = "class=\"listRow";
const POPOVER: &str = "id=\"a-popover-trackTitlePopover";

lazy_static! {
    static ref CAT_ID_TITLE_RE: Regex = Regex::new(concat!(
        r#"<a class="[^"]*s-access-detail-page[^"]*"[^>]+title="([^"]+)"[^>]+"#,
        r#"href="[^"]+/(dp|ASIN|images|product|-)/([A-Z0-9]+)[^"]+">"#
    ))
    .expect("product link regex is valid");
    static ref NEXT_ELEMENT_RE: Regex = Regex::new(r">([^<]+)<").expect("element regex is valid");
    static ref YEAR_RE: Regex = Regex::new(r"(\d{4})").expect("year regex is valid");
    static ref LABEL_RE: Regex = Regex::new(r">\s*([^<]+)<").expect("label regex is valid");
    static ref DURATION_RE: Regex = Regex::new(r"(\d+):(\d+)").expect("duration regex is valid");
    static ref NR_TITLE_RE: Regex =
        Regex::new(r"\s*\d+\.\s+(.*\S)").expect("numbered title regex is valid");
}

/// Text between the `>` after `from` and the following `<`.
fn element_text(text: &str, from: usize) -> Option<(usize, &str)> {
    let start = find_from(text, ">", from)?;
    let end = find_from(text, "<", start)?;
    (end > start).then(|| (end, &text[start + 1..end]))
}

fn duration_of(text: &str) -> u32 {
    DURATION_RE
        .captures(text)
        .map(|caps| duration_seconds([&caps[1], &caps[2]]))
        .unwrap_or(0)
}

/// Album title and artist from the product heading.
fn parse_title(text: &str, header: &mut FrameCollection) {
    let Some(title_pos) = text.find("id=\"productTitle\"") else {
        return;
    };
    let Some(start) = find_from(text, ">", title_pos) else {
        return;
    };
    let Some(mut end) = find_from(text, "<", start).filter(|end| *end > start) else {
        return;
    };
    if let Some(bracket) = find_from(text, " [", start).filter(|pos| *pos < end) {
        end = bracket;
    }
    header.set_album(replace_html_entities(&text[start + 1..end]));

    let artist = find_from(text, "class=\"author", end)
        .and_then(|author| find_from(text, ">", author))
        .and_then(|tag_end| find_from(text, "<a", tag_end))
        .and_then(|link| element_text(text, link));
    if let Some((_, artist)) = artist {
        header.set_artist(replace_html_entities(artist));
    }
}

/// Value of a "Name:" entry in the product details list.
fn detail_item(text: &str, details: usize, label: &str) -> Option<String> {
    let start = find_from(text, &format!(">{label}:<"), details)?;
    let value_start = start + label.len() + 2;
    let end = find_from(text, "</li>", value_start + 1)?;
    Some(remove_html(&text[value_start..end]))
}

/// Year, label and credits from the "Product Details" section. Returns an
/// orchestra found there, used as album artist of the tracks.
fn parse_details(text: &str, flags: ImportFlags, header: &mut FrameCollection) -> Option<String> {
    let details = text.find(">Product Details<")?;

    if flags.standard_tags {
        let date = find_from(text, ">Original Release Date:<", details)
            .or_else(|| find_from(text, ">Audio CD<", details));
        if let Some(date) = date {
            let line_start = date + 10;
            if let Some(line_end) = find_from(text, "\n", line_start).filter(|end| *end > line_start) {
                if let Some(caps) = YEAR_RE.captures(&text[line_start..line_end]) {
                    header.set_year(caps[1].parse().unwrap_or(0));
                }
            }
        }
    }

    if !flags.additional_tags {
        return None;
    }
    if let Some(label) = find_from(text, ">Label:<", details) {
        let line_start = label + 8;
        if let Some(line_end) = find_from(text, "\n", line_start).filter(|end| *end > line_start) {
            if let Some(caps) = LABEL_RE.captures(&text[line_start..line_end]) {
                header.set_value(FrameType::Publisher, remove_html(&caps[1]));
            }
        }
    }
    if let Some(performer) = detail_item(text, details, "Performer") {
        header.set_value(FrameType::Performer, performer);
    }
    if let Some(conductor) = detail_item(text, details, "Conductor") {
        header.set_value(FrameType::Conductor, conductor);
    }
    if let Some(composer) = detail_item(text, details, "Composer") {
        header.set_value(FrameType::Composer, composer);
    }
    detail_item(text, details, "Orchestra")
}

fn parse_cover_art(text: &str) -> Option<String> {
    let asin = text.find("id=\"ASIN\"")?;
    let value = find_from(text, "value=\"", asin)? + 7;
    let end = find_from(text, "\"", value)?;
    Some(format!("http://www.amazon.com/dp/{}", &text[value..end]))
}

/// One row of a track list, `next` is where the following row starts.
struct Row<'a> {
    title: &'a str,
    artist: Option<&'a str>,
    duration: u32,
    next: Option<usize>,
}

fn title_col_row(text: &str, start: usize, has_artist: bool) -> Option<Row<'_>> {
    let end = find_from(text, "\n", start).filter(|end| *end > start)?;
    let line = &text[start..end];
    let next = find_from(text, TITLE_COL, end);
    // Header cells of the table share the class but have no link.
    let Some(link) = line.find("<a href=") else {
        return Some(Row {
            title: "",
            artist: None,
            duration: 0,
            next,
        });
    };
    let (title_end, title) = element_text(line, link)?;

    let artist = if has_artist {
        find_from(line, TITLE_COL, title_end)
            .and_then(|col| find_from(line, "<a href=", col))
            .and_then(|link| element_text(line, link))
            .map(|(_, artist)| artist)
    } else {
        None
    };
    let duration = find_from(line, "class=\"runtimeCol\"", title_end)
        .and_then(|col| element_text(line, col + 18))
        .map(|(_, runtime)| duration_of(runtime))
        .unwrap_or(0);

    Some(Row {
        title,
        artist,
        duration,
        next,
    })
}

fn list_row(text: &str, start: usize) -> Option<Row<'_>> {
    let cell = find_from(text, "<td>", start)?;
    let end = find_from(text, "</td>", cell).filter(|end| *end > cell)?;
    let caps = NR_TITLE_RE.captures(&text[cell + 4..end])?;
    let title = caps.get(1)?.as_str();
    Some(Row {
        title,
        artist: None,
        duration: 0,
        next: find_from(text, LIST_ROW, end),
    })
}

fn popover_row(text: &str, start: usize) -> Option<Row<'_>> {
    let link = find_from(text, "<a", start)?;
    let (end, title) = element_text(text, link)?;
    let duration = find_from(text, "<td id=\"dmusic_tracklist_duration", end)
        .and_then(|cell| {
            let cell_end = find_from(text, "</td>", cell)?;
            let runtime: String = text[cell + 1..cell_end]
                .chars()
                .filter(|c| *c != '\n' && *c != '\r')
                .collect();
            Some(duration_of(&runtime))
        })
        .unwrap_or(0);
    Some(Row {
        title,
        artist: None,
        duration,
        next: find_from(text, POPOVER, end),
    })
}

fn parse_album_page(text: &str, flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
    let mut header = FrameCollection::new();
    if flags.standard_tags {
        parse_title(text, &mut header);
    }
    let mut album_artist = parse_details(text, flags, &mut header).unwrap_or_default();

    tracks.cover_art_url.clear();
    if flags.cover_art {
        if let Some(url) = parse_cover_art(text) {
            tracks.cover_art_url = url;
        }
    }

    let has_artist = text.contains("<td>Song Title</td><td>Artist</td>");
    enum Layout {
        TitleCol,
        ListRow,
        Popover,
    }
    let layout = if let Some(start) = text.find(TITLE_COL) {
        Some((Layout::TitleCol, start))
    } else if let Some(start) = text.find(LIST_ROW) {
        Some((Layout::ListRow, start))
    } else {
        text.find(POPOVER).map(|start| (Layout::Popover, start))
    };

    let Some((layout, first)) = layout else {
        if !header.is_empty() {
            apply_header(tracks, &header);
        }
        return;
    };

    let mut parsed = Vec::new();
    let mut track_nr = 1;
    let mut start = Some(first);
    while let Some(pos) = start {
        let row = match layout {
            Layout::TitleCol => title_col_row(text, pos, has_artist),
            Layout::ListRow => list_row(text, pos),
            Layout::Popover => popover_row(text, pos),
        };
        let Some(row) = row else {
            break;
        };
        start = row.next;
        if row.title.is_empty() {
            continue;
        }

        let mut frames = header.clone();
        if row.artist.is_some() && album_artist.is_empty() {
            album_artist = header.artist().to_string();
        }
        if flags.standard_tags {
            frames.set_title(replace_html_entities(row.title));
            if let Some(artist) = row.artist.filter(|a| !a.is_empty()) {
                frames.set_artist(replace_html_entities(artist));
            }
            frames.set_track(track_nr);
        }
        if flags.additional_tags && !album_artist.is_empty() {
            frames.set_value(FrameType::AlbumArtist, album_artist.as_str());
        }
        parsed.push(ParsedTrack::new(frames, row.duration));
        track_nr += 1;
    }

    debug!(target: "amazon", tracks = parsed.len(), "amazon product page parsed");
    merge_tracks(tracks, parsed);
}

pub struct AmazonImporter {
    config: ServerImporterConfig,
}

impl AmazonImporter {
    pub fn new(config: ServerImporterConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Importer for AmazonImporter {
    fn name(&self) -> &'static str {
        "Amazon"
    }

    fn additional_tags(&self) -> bool {
        true
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        Some(&self.config)
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery {
        FindQuery::Request(server_request(
            &self.config,
            format!(
                "/gp/search/ref=sr_adv_m_pop/?search-alias=popular&field-artist={}&field-title={}",
                encode_url_query(artist),
                encode_url_query(album)
            ),
        ))
    }

    fn track_list_query(&self, category: &str, id: &str, _flags: ImportFlags) -> HttpRequest {
        server_request(&self.config, format!("/{category}/{id}"))
    }

    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel) {
        let text = decode_with_fallback(data).replace('\r', "");
        albums.clear();
        let mut end = 0;
        while let Some(product) = CAT_ID_TITLE_RE.captures_at(&text, end) {
            end = product.get(0).map(|m| m.end()).unwrap_or(text.len());
            let Some(by) = find_from(&text, ">by <", end) else {
                break;
            };
            let Some(artist) = NEXT_ELEMENT_RE.captures_at(&text, by + 4) else {
                break;
            };
            end = artist.get(0).map(|m| m.end()).unwrap_or(text.len());
            albums.append_item(
                format!("{} - {}", &artist[1], &product[1]),
                &product[2],
                &product[3],
            );
        }
    }

    fn parse_album_results(&self, data: &[u8], flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
        parse_album_page(&decode_with_fallback(data), flags, tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rows_are_numbered_titles() {
        let page = concat!(
            "<span id=\"productTitle\" class=\"a-size-large\">Into the Wild [Explicit]</span>\n",
            "<tr class=\"listRowEven\">\n<td>\n1. Before the Devil Knows You&#39;re Dead\n</td>\n",
            "<tr class=\"listRowOdd\">\n<td>\n2. Second Song\n</td>\n"
        );
        let mut tracks = ImportTrackDataVector::new();
        parse_album_page(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks.tracks[0].frames.album(), "Into the Wild");
        assert_eq!(tracks.tracks[0].frames.title(), "Before the Devil Knows You're Dead");
        assert_eq!(tracks.tracks[1].frames.track(), 2);
    }

    #[test]
    fn popover_rows_carry_durations() {
        let page = concat!(
            "<div id=\"a-popover-trackTitlePopover_1\"><a href=\"#\">First</a></div>",
            "<td id=\"dmusic_tracklist_duration_1\">\n4:31\n</td>",
            "<div id=\"a-popover-trackTitlePopover_2\"><a href=\"#\">Second</a></div>",
            "<td id=\"dmusic_tracklist_duration_2\">\n1:02\n</td>"
        );
        let mut tracks = ImportTrackDataVector::new();
        parse_album_page(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks.tracks[0].import_duration, 271);
        assert_eq!(tracks.tracks[1].frames.title(), "Second");
        assert_eq!(tracks.tracks[1].import_duration, 62);
    }

    #[test]
    fn oversized_runtime_is_dropped() {
        let page = concat!(
            "<div id=\"a-popover-trackTitlePopover_1\"><a href=\"#\">Loop</a></div>",
            "<td id=\"dmusic_tracklist_duration_1\">\n99999999:00\n</td>"
        );
        let mut tracks = ImportTrackDataVector::new();
        parse_album_page(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks.tracks[0].frames.title(), "Loop");
        assert_eq!(tracks.tracks[0].import_duration, 0);
    }

    #[test]
    fn header_only_page_fills_slots() {
        let page = "<span id=\"productTitle\">Solo</span>\n";
        let mut tracks = ImportTrackDataVector::new();
        tracks.tracks.push(Default::default());
        tracks.tracks.push(Default::default());
        parse_album_page(page, ImportFlags::ALL, &mut tracks);

        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.frames.album() == "Solo"));
    }
}
