// SPDX-License-Identifier: GPL-3.0-or-later

//! MusicBrainz web service (XML, version 2).

use async_trait::async_trait;
use lazy_static::lazy_static;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use trackimport_config::ServerImporterConfig;
use trackimport_domain::{
    genres, AlbumListModel, FrameCollection, FrameType, ImportTrackDataVector,
};
use trackimport_http::HttpRequest;

use crate::html::decode_with_fallback;
use crate::importer::{percent_encode, server_request, FindQuery, ImportFlags, Importer};
use crate::merge::{merge_tracks, ParsedTrack};

const RELEASE_LINK_PREFIX: &str = "https://musicbrainz.org/";
const USER_AGENT: &str = concat!("trackimport/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    static ref DATE_RE: Regex =
        Regex::new(r"^(\d{4})(?:-\d{2})?(?:-\d{2})?$").expect("date regex is valid");
    static ref AMAZON_PRODUCT_RE: Regex = Regex::new(r"https://www\.amazon\.[^/]+/gp/product/")
        .expect("amazon product regex is valid");
}

/// Relation types stored in a single frame.
const RELATION_TO_TYPE: &[(&str, FrameType)] = &[
    ("composer", FrameType::Composer),
    ("conductor", FrameType::Conductor),
    ("performing orchestra", FrameType::AlbumArtist),
    ("lyricist", FrameType::Lyricist),
    ("publisher", FrameType::Publisher),
    ("remixer", FrameType::Remixer),
];

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(rename = "release-list", default)]
    release_list: Option<ReleaseList>,
    #[serde(default)]
    release: Option<Release>,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseList {
    #[serde(default)]
    release: Vec<Release>,
}

#[derive(Debug, Default, Deserialize)]
struct Release {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Option<ArtistCredit>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    asin: Option<String>,
    #[serde(rename = "label-info-list", default)]
    label_info_list: Option<LabelInfoList>,
    #[serde(rename = "medium-list", default)]
    medium_list: Option<MediumList>,
    #[serde(rename = "relation-list", default)]
    relation_lists: Vec<RelationList>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistCredit {
    #[serde(rename = "name-credit", default)]
    name_credits: Vec<NameCredit>,
}

impl ArtistCredit {
    fn first_artist(&self) -> Option<&Artist> {
        self.name_credits.first().and_then(|c| c.artist.as_ref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct NameCredit {
    #[serde(default)]
    artist: Option<Artist>,
}

#[derive(Debug, Default, Deserialize)]
struct Artist {
    #[serde(default)]
    name: String,
    #[serde(rename = "genre-list", default)]
    genre_list: Option<GenreList>,
}

#[derive(Debug, Default, Deserialize)]
struct GenreList {
    #[serde(default)]
    genre: Vec<Genre>,
}

#[derive(Debug, Default, Deserialize)]
struct Genre {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct LabelInfoList {
    #[serde(rename = "label-info", default)]
    label_infos: Vec<LabelInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelInfo {
    #[serde(rename = "catalog-number", default)]
    catalog_number: Option<String>,
    #[serde(default)]
    label: Option<Label>,
}

#[derive(Debug, Default, Deserialize)]
struct Label {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct MediumList {
    #[serde(rename = "@count", default)]
    count: Option<String>,
    #[serde(default)]
    medium: Vec<Medium>,
}

#[derive(Debug, Default, Deserialize)]
struct Medium {
    #[serde(default)]
    position: Option<String>,
    #[serde(rename = "track-list", default)]
    track_list: Option<TrackList>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackList {
    #[serde(default)]
    track: Vec<Track>,
}

#[derive(Debug, Default, Deserialize)]
struct Track {
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    length: Option<String>,
    #[serde(default)]
    recording: Option<Recording>,
}

#[derive(Debug, Default, Deserialize)]
struct Recording {
    #[serde(default)]
    title: String,
    #[serde(default)]
    length: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Option<ArtistCredit>,
    #[serde(rename = "genre-list", default)]
    genre_list: Option<GenreList>,
    #[serde(rename = "relation-list", default)]
    relation_lists: Vec<RelationList>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationList {
    #[serde(rename = "@target-type", default)]
    target_type: String,
    #[serde(default)]
    relation: Vec<Relation>,
}

#[derive(Debug, Default, Deserialize)]
struct Relation {
    #[serde(rename = "@type", default)]
    relation_type: String,
    #[serde(default)]
    target: Option<Text>,
    #[serde(default)]
    artist: Option<Artist>,
    #[serde(rename = "attribute-list", default)]
    attribute_list: Option<AttributeList>,
    #[serde(default)]
    work: Option<Work>,
}

#[derive(Debug, Default, Deserialize)]
struct AttributeList {
    #[serde(default)]
    attribute: Vec<Text>,
}

#[derive(Debug, Default, Deserialize)]
struct Work {
    #[serde(rename = "relation-list", default)]
    relation_lists: Vec<RelationList>,
}

/// Element whose attributes are of no interest.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Uppercase the first letter and every letter after a space.
fn upper_case_first_letters(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_word_start = c == ' ';
    }
    result
}

/// Capitalize a MusicBrainz genre tag like "heavy metal" so that it can be
/// found in the genre table.
fn fix_up_genre(genre: &str) -> String {
    let mut result = String::with_capacity(genre.len());
    let mut capitalize = true;
    for c in genre.chars() {
        if capitalize {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        capitalize = matches!(c, '-' | ' ' | '&');
    }
    result
        .replace(" And ", " & ")
        .replace("Ebm", "EBM")
        .replace("Edm", "EDM")
        .replace("Idm", "IDM")
        .replace("Uk", "UK")
}

fn parse_genres(genre_list: Option<&GenreList>) -> String {
    genre_list
        .map(|list| genres::canonical_list(list.genre.iter().map(|genre| fix_up_genre(&genre.name))))
        .unwrap_or_default()
}

fn add_involved_people(frames: &mut FrameCollection, frame_type: FrameType, role: &str, name: &str) {
    frames.add_involved_people(frame_type, &upper_case_first_letters(role), name);
}

fn parse_credits(relation_list: &RelationList, frames: &mut FrameCollection) {
    for relation in &relation_list.relation {
        let artist = relation.artist.as_ref().map(|a| a.name.as_str()).unwrap_or("");
        if artist.is_empty() {
            continue;
        }
        let relation_type = relation.relation_type.as_str();
        match relation_type {
            "instrument" => {
                if let Some(attributes) = &relation.attribute_list {
                    let instrument = attributes
                        .attribute
                        .first()
                        .map(|a| a.value.as_str())
                        .unwrap_or("");
                    add_involved_people(frames, FrameType::Performer, instrument, artist);
                }
            }
            "vocal" => add_involved_people(frames, FrameType::Performer, relation_type, artist),
            _ => {
                if let Some((_, frame_type)) =
                    RELATION_TO_TYPE.iter().find(|(t, _)| *t == relation_type)
                {
                    frames.set_value(*frame_type, artist);
                } else if relation_type != "tribute" {
                    add_involved_people(frames, FrameType::Arranger, relation_type, artist);
                }
            }
        }
    }
}

/// Picture URL of an Amazon product link.
fn cover_art_from_link(target: &str) -> String {
    let mut url = AMAZON_PRODUCT_RE
        .replace(target, "http://images.amazon.com/images/P/")
        .into_owned();
    if !url.ends_with(".jpg") {
        url.push_str(".jpg");
    }
    url
}

fn parse_year(date: &str) -> u32 {
    match DATE_RE.captures(date) {
        Some(caps) => caps[1].parse().unwrap_or(0),
        None => date.parse().unwrap_or(0),
    }
}

fn parse_metadata(data: &[u8]) -> Option<Metadata> {
    let text = decode_with_fallback(data);
    let xml = match (text.find("<?xml"), text.find("</metadata>")) {
        (Some(start), Some(end)) if end > start => &text[start..end + "</metadata>".len()],
        _ => &text[..],
    };
    match from_str::<Metadata>(xml) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            debug!(target: "musicbrainz", error = %e, "musicbrainz response is not valid XML");
            None
        }
    }
}

fn header_frames(release: &Release, flags: ImportFlags, tracks: &mut ImportTrackDataVector) -> FrameCollection {
    let mut header = FrameCollection::new();
    let release_artist = release.artist_credit.as_ref().and_then(ArtistCredit::first_artist);

    if flags.standard_tags {
        header.set_album(release.title.as_str());
        if let Some(artist) = release_artist {
            header.set_artist(artist.name.as_str());
            let genre = parse_genres(artist.genre_list.as_ref());
            if !genre.is_empty() {
                header.set_genre(genre);
            }
        }
        if let Some(date) = release.date.as_deref().filter(|d| !d.is_empty()) {
            let year = parse_year(date);
            if year != 0 {
                header.set_year(year);
            }
        }
    }

    tracks.cover_art_url.clear();
    if flags.cover_art {
        if let Some(asin) = release.asin.as_deref().filter(|a| !a.is_empty()) {
            tracks.cover_art_url = format!("http://www.amazon.com/dp/{asin}");
        }
    }

    if flags.additional_tags {
        if let Some(label_info) = release
            .label_info_list
            .as_ref()
            .and_then(|list| list.label_infos.first())
        {
            if let Some(label) = label_info.label.as_ref().filter(|l| !l.name.is_empty()) {
                header.set_value(FrameType::Publisher, label.name.as_str());
            }
            if let Some(catalog_number) = label_info.catalog_number.as_deref().filter(|c| !c.is_empty()) {
                header.set_value(FrameType::CatalogNumber, catalog_number);
            }
        }
        if let Some(country) = release.country.as_deref().filter(|c| !c.is_empty()) {
            header.set_value(FrameType::ReleaseCountry, country);
        }
    }

    for relation_list in &release.relation_lists {
        match relation_list.target_type.as_str() {
            "artist" if flags.additional_tags => parse_credits(relation_list, &mut header),
            "url" if flags.cover_art => {
                for relation in &relation_list.relation {
                    if matches!(relation.relation_type.as_str(), "cover art link" | "amazon asin") {
                        let target = relation.target.as_ref().map(|t| t.value.as_str()).unwrap_or("");
                        tracks.cover_art_url = cover_art_from_link(target);
                    }
                }
            }
            _ => {}
        }
    }

    header
}

fn recording_frames(
    recording: &Recording,
    header: &FrameCollection,
    flags: ImportFlags,
    frames: &mut FrameCollection,
) -> Option<u32> {
    if flags.standard_tags {
        frames.set_title(recording.title.as_str());
    }
    if let Some(artist) = recording.artist_credit.as_ref().and_then(ArtistCredit::first_artist) {
        if !artist.name.is_empty() {
            if flags.standard_tags {
                frames.set_artist(artist.name.as_str());
            }
            if flags.additional_tags {
                frames.set_value(FrameType::AlbumArtist, header.artist());
            }
        }
        let genre = parse_genres(artist.genre_list.as_ref());
        if flags.standard_tags && !genre.is_empty() {
            frames.set_genre(genre);
        }
    }
    let genre = parse_genres(recording.genre_list.as_ref());
    if flags.standard_tags && !genre.is_empty() {
        frames.set_genre(genre);
    }
    if flags.additional_tags {
        for relation_list in &recording.relation_lists {
            match relation_list.target_type.as_str() {
                "artist" => parse_credits(relation_list, frames),
                "work" => {
                    let work_relations = relation_list
                        .relation
                        .first()
                        .and_then(|r| r.work.as_ref())
                        .and_then(|w| w.relation_lists.first());
                    if let Some(work_relations) = work_relations {
                        parse_credits(work_relations, frames);
                    }
                }
                _ => {}
            }
        }
    }
    recording.length.as_deref().and_then(|l| l.parse().ok())
}

fn parse_release(release: &Release, flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
    let header = header_frames(release, flags, tracks);

    let Some(medium_list) = &release.medium_list else {
        return;
    };
    let medium_count: u32 = medium_list
        .count
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);

    let mut parsed = Vec::new();
    let mut frames = header.clone();
    let mut disc_nr = 1;
    let mut track_nr = 1;
    for medium in &medium_list.medium {
        if let Some(position) = medium.position.as_deref().and_then(|p| p.parse().ok()) {
            disc_nr = position;
        }
        let track_list = medium.track_list.as_ref().map(|l| l.track.as_slice()).unwrap_or(&[]);
        for track in track_list {
            if medium_count > 1 && flags.additional_tags {
                frames.set_value(FrameType::Disc, disc_nr.to_string());
            }
            if let Some(position) = track.position.as_deref().and_then(|p| p.parse().ok()) {
                track_nr = position;
            }
            if flags.standard_tags {
                frames.set_track(track_nr);
            }
            let mut length: u32 = track
                .length
                .as_deref()
                .and_then(|l| l.parse().ok())
                .unwrap_or(0);
            if let Some(recording) = &track.recording {
                if let Some(recording_length) = recording_frames(recording, &header, flags, &mut frames) {
                    length = recording_length;
                }
            }
            parsed.push(ParsedTrack::new(frames, length / 1000));
            track_nr += 1;
            frames = header.clone();
        }
        disc_nr += 1;
    }

    debug!(target: "musicbrainz", tracks = parsed.len(), "musicbrainz release parsed");
    merge_tracks(tracks, parsed);
}

/// Quote a search term containing spaces.
fn quoted(term: &str) -> String {
    if term.contains(' ') {
        format!("\"{term}\"")
    } else {
        term.to_string()
    }
}

pub struct MusicBrainzImporter {
    config: ServerImporterConfig,
}

impl MusicBrainzImporter {
    pub fn new(config: ServerImporterConfig) -> Self {
        Self { config }
    }

    fn request(&self, path: String) -> HttpRequest {
        server_request(&self.config, path).header("User-Agent", USER_AGENT)
    }
}

#[async_trait]
impl Importer for MusicBrainzImporter {
    fn name(&self) -> &'static str {
        "MusicBrainz Release"
    }

    fn additional_tags(&self) -> bool {
        true
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        Some(&self.config)
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery {
        // A release link entered as artist is a result on its own.
        if let Some(rest) = artist.strip_prefix(RELEASE_LINK_PREFIX) {
            if let Some(cat_end) = rest.find('/').filter(|pos| *pos > 0) {
                let mut albums = AlbumListModel::new();
                albums.append_item(artist, &rest[..cat_end], &rest[cat_end + 1..]);
                return FindQuery::Direct(albums);
            }
        }

        let mut path = String::from("/ws/2/release?query=");
        if !artist.is_empty() {
            let mut artist_query = quoted(artist);
            if !album.is_empty() {
                artist_query.push_str(" AND ");
            }
            path.push_str("artist:");
            path.push_str(&percent_encode(&artist_query));
        }
        if !album.is_empty() {
            path.push_str("release:");
            path.push_str(&percent_encode(&quoted(album)));
        }
        FindQuery::Request(self.request(path))
    }

    fn track_list_query(&self, category: &str, id: &str, flags: ImportFlags) -> HttpRequest {
        let mut path = format!("/ws/2/{category}/{id}?inc=");
        if flags.additional_tags {
            path.push_str(
                "artist-credits+labels+recordings+genres+media+isrcs+discids+\
                 artist-rels+label-rels+recording-rels+release-rels",
            );
        } else {
            path.push_str("artists+recordings+genres");
        }
        if flags.cover_art {
            path.push_str("+url-rels");
        }
        if flags.additional_tags {
            path.push_str("+work-rels+recording-level-rels+work-level-rels");
        }
        self.request(path)
    }

    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel) {
        let Some(metadata) = parse_metadata(data) else {
            return;
        };
        albums.clear();
        let releases = metadata.release_list.map(|l| l.release).unwrap_or_default();
        for release in releases {
            let name = release
                .artist_credit
                .as_ref()
                .and_then(ArtistCredit::first_artist)
                .map(|a| a.name.as_str())
                .unwrap_or("");
            albums.append_item(format!("{} - {}", name, release.title), "release", release.id);
        }
    }

    fn parse_album_results(&self, data: &[u8], flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
        if let Some(release) = parse_metadata(data).and_then(|m| m.release) {
            parse_release(&release, flags, tracks);
        }
    }
}
