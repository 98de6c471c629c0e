// SPDX-License-Identifier: GPL-3.0-or-later

//! gnudb.org (freedb protocol) importer and the CDDB parsing shared with
//! TrackType.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use trackimport_config::ServerImporterConfig;
use trackimport_domain::{genres, AlbumListModel, FrameCollection, ImportTrackDataVector};
use trackimport_http::HttpRequest;

use crate::html::decode_with_fallback;
use crate::importer::{encode_url_query, server_request, FindQuery, ImportFlags, Importer};
use crate::merge::{merge_tracks, ParsedTrack};

/// CD frames per second.
const FRAMES_PER_SECOND: u32 = 75;
const CLIENT: &str = concat!("trackimport+", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref LINE_SEP_RE: Regex = Regex::new(r"[\r\n]+").expect("line separator regex is valid");
    static ref CAT_ID_TITLE_RE: Regex =
        Regex::new(r"^([a-z]+)\s+([0-9a-f]+)\s+(.*)$").expect("match line regex is valid");
    static ref GNUDB_URL_RE: Regex = Regex::new(r"^https://gnudb\.org/([a-z]+)/([0-9a-f]+)$")
        .expect("gnudb url regex is valid");
    static ref DISC_LENGTH_RE: Regex =
        Regex::new(r"Disc length:\s*(\d+)").expect("disc length regex is valid");
    static ref FRAME_OFFSET_RE: Regex = Regex::new(r"#\s*(\d+)").expect("offset regex is valid");
    static ref DTITLE_RE: Regex =
        Regex::new(r"DTITLE=\s*(\S[^\r\n]*\S)\s*/\s*(\S[^\r\n]*\S)[\r\n]")
            .expect("dtitle regex is valid");
    static ref EXTD_YEAR_RE: Regex =
        Regex::new(r"EXTD=[^\r\n]*YEAR:\s*(\d+)\D").expect("extd year regex is valid");
    static ref EXTD_GENRE_RE: Regex =
        Regex::new(r"EXTD=[^\r\n]*ID3G:\s*(\d+)\D").expect("extd genre regex is valid");
    static ref DYEAR_RE: Regex = Regex::new(r"DYEAR=(\d+)").expect("dyear regex is valid");
    static ref DGENRE_RE: Regex = Regex::new(r"DGENRE=([^\r\n]+)").expect("dgenre regex is valid");
    static ref TTITLE_RE: Regex =
        Regex::new(r"TTITLE(\d+)=([^\r\n]+)[\r\n]").expect("ttitle regex is valid");
}

/// Track lengths in seconds from the frame offsets and the disc length of
/// an xmcd entry.
pub(crate) fn track_durations(text: &str) -> Vec<u32> {
    let mut durations = Vec::new();
    let Some(disc_length) = DISC_LENGTH_RE.captures(text) else {
        return durations;
    };
    let disc_length_pos = disc_length.get(0).map(|m| m.start()).unwrap_or(0);
    let disc_seconds: u32 = disc_length[1].parse().unwrap_or(0);
    let Some(offsets_pos) = text.find("Track frame offsets") else {
        return durations;
    };

    let mut last_offset = None;
    for caps in FRAME_OFFSET_RE.captures_iter(&text[offsets_pos..]) {
        let start = caps.get(0).map(|m| m.start() + offsets_pos).unwrap_or(0);
        if start >= disc_length_pos {
            break;
        }
        let offset: u32 = caps[1].parse().unwrap_or(0);
        if let Some(last) = last_offset {
            durations.push(offset.saturating_sub(last) / FRAMES_PER_SECOND);
        }
        last_offset = Some(offset);
    }
    if let Some(last) = last_offset {
        let disc_frames = disc_seconds.checked_mul(FRAMES_PER_SECOND);
        durations.push(disc_frames.map_or(0, |frames| frames.saturating_sub(last) / FRAMES_PER_SECOND));
    }
    durations
}

fn album_frames(text: &str) -> FrameCollection {
    let mut frames = FrameCollection::new();
    if let Some(caps) = DTITLE_RE.captures(text) {
        frames.set_artist(&caps[1]);
        frames.set_album(&caps[2]);
    }
    if let Some(caps) = EXTD_YEAR_RE.captures(text) {
        frames.set_year(caps[1].parse().unwrap_or(0));
    }
    if let Some(name) = EXTD_GENRE_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .and_then(genres::name)
    {
        frames.set_genre(name);
    }
    if let Some(caps) = DYEAR_RE.captures(text) {
        frames.set_year(caps[1].parse().unwrap_or(0));
    }
    if let Some(caps) = DGENRE_RE.captures(text) {
        frames.set_genre(genres::name_string(caps[1].trim()));
    }
    frames
}

/// Merge an xmcd entry into `tracks`. Long titles are split over several
/// `TTITLEn=` lines and joined again.
pub(crate) fn parse_cddb_album(data: &[u8], tracks: &mut ImportTrackDataVector) {
    let text = decode_with_fallback(data);
    let durations = track_durations(&text);
    let header = album_frames(&text);

    let mut titles: BTreeMap<u32, String> = BTreeMap::new();
    for caps in TTITLE_RE.captures_iter(&text) {
        if let Ok(index) = caps[1].parse::<u32>() {
            titles.entry(index).or_default().push_str(&caps[2]);
        }
    }

    tracks.cover_art_url.clear();
    let mut parsed = Vec::new();
    let mut index = 0;
    while let Some(title) = titles.get(&index) {
        let mut frames = header.clone();
        frames.set_track(index + 1);
        frames.set_title(title.as_str());
        let duration = durations.get(index as usize).copied().unwrap_or(0);
        parsed.push(ParsedTrack::new(frames, duration));
        index += 1;
    }

    debug!(target: "freedb", tracks = parsed.len(), "cddb entry parsed");
    merge_tracks(tracks, parsed);
}

/// `hello` user/host part and the optional `User-Email` header for a
/// configured address.
fn hello(config: &ServerImporterConfig) -> (String, Option<String>) {
    match config.token().filter(|token| token.contains('@')) {
        Some(email) => (email.replace('@', "+"), Some(email.to_string())),
        None => ("noname+localhost".to_string(), None),
    }
}

/// CGI request with the protocol parameters appended to `command`.
pub(crate) fn cddb_request(config: &ServerImporterConfig, command: &str) -> HttpRequest {
    let (name_host, email) = hello(config);
    let path = format!(
        "{}?{}&hello={}+{}&proto=6",
        config.cgi_path, command, name_host, CLIENT
    );
    let request = server_request(config, path);
    match email {
        Some(email) => request.header("User-Email", email),
        None => request,
    }
}

pub(crate) fn cddb_read_request(config: &ServerImporterConfig, category: &str, id: &str) -> HttpRequest {
    cddb_request(config, &format!("cmd=cddb+read+{category}+{id}"))
}

pub struct FreedbImporter {
    config: ServerImporterConfig,
}

impl FreedbImporter {
    pub fn new(config: ServerImporterConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Importer for FreedbImporter {
    fn name(&self) -> &'static str {
        "gnudb.org"
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        Some(&self.config)
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery {
        if let Some(caps) = GNUDB_URL_RE.captures(artist) {
            let mut albums = AlbumListModel::new();
            albums.append_item(artist, &caps[1], &caps[2]);
            return FindQuery::Direct(albums);
        }
        FindQuery::Request(cddb_request(
            &self.config,
            &format!(
                "cmd=search&artist={}&album={}",
                encode_url_query(artist),
                encode_url_query(album)
            ),
        ))
    }

    fn track_list_query(&self, category: &str, id: &str, _flags: ImportFlags) -> HttpRequest {
        cddb_read_request(&self.config, category, id)
    }

    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel) {
        let text = decode_with_fallback(data);
        albums.clear();
        let mut in_entries = false;
        for line in LINE_SEP_RE.split(&text) {
            if in_entries {
                if line == "." {
                    break;
                }
                if let Some(caps) = CAT_ID_TITLE_RE.captures(line) {
                    albums.append_item(&caps[3], &caps[1], &caps[2]);
                }
            } else if line.starts_with("200 Found") {
                in_entries = true;
            }
        }
    }

    fn parse_album_results(&self, data: &[u8], _flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
        parse_cddb_album(data, tracks);
    }
}
