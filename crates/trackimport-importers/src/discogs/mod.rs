// SPDX-License-Identifier: GPL-3.0-or-later

//! Discogs importer.
//!
//! With an API token the JSON API is queried, otherwise the web site is
//! scraped. Both deliver the same frames.

mod credits;
pub mod json;
pub mod page;

use async_trait::async_trait;
use trackimport_config::{DiscogsConfig, ServerImporterConfig};
use trackimport_domain::{genres, AlbumListModel, ImportTrackDataVector};
use trackimport_http::HttpRequest;

use crate::html::decode_with_fallback;
use crate::importer::{encode_url_query, percent_encode, server_request, FindQuery, ImportFlags, Importer};

const API_USER_AGENT: &str = concat!("trackimport/", env!("CARGO_PKG_VERSION"));

/// First candidate with an ID3v1 number, under its table name, or the first
/// candidate when none is known.
pub(crate) fn first_known_genre<S: AsRef<str>>(candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .find_map(|c| genres::name(genres::number(c.as_ref())))
        .map(str::to_string)
        .or_else(|| candidates.first().map(|c| c.as_ref().to_string()))
}

/// Short form of a format description as shown in release listings.
fn abbreviate_format(format: &str) -> &str {
    match format {
        "Limited Edition" => "Ltd",
        "Enhanced" => "Enh",
        "Digipak" => "Dig",
        "Reissue" => "RE",
        "Remastered" => "RM",
        "Repress" => "RP",
        "Compilation" => "Comp",
        "Picture Disc" => "Pic",
        "Single Sided" => "S/Sided",
        "Numbered" => "Num",
        "Gatefold" => "Gat",
        "Etched" => "Etch",
        "Test Pressing" => "TP",
        "Deluxe Edition" => "Dlx",
        "Special Edition" => "S/Edition",
        "Partially Mixed" => "P/Mixed",
        "Unofficial Release" => "Unofficial",
        other => other,
    }
}

/// Album list text "Artist - Title (Year) [Formats]", year and formats
/// left out when the listing has none.
pub(crate) fn release_title<S: AsRef<str>>(title: &str, year: &str, formats: &[S]) -> String {
    let mut text = title.to_string();
    if !year.is_empty() {
        text.push_str(&format!(" ({year})"));
    }
    let formats: Vec<&str> = formats
        .iter()
        .map(|f| abbreviate_format(f.as_ref().trim()))
        .filter(|f| !f.is_empty())
        .collect();
    if !formats.is_empty() {
        text.push_str(&format!(" [{}]", formats.join(", ")));
    }
    text
}

pub struct DiscogsImporter {
    config: DiscogsConfig,
}

impl DiscogsImporter {
    pub fn new(config: DiscogsConfig) -> Self {
        Self { config }
    }

    fn token(&self) -> Option<&str> {
        self.config.settings.token()
    }

    fn api_request(&self, token: &str, path: String) -> HttpRequest {
        HttpRequest::get(
            self.config.settings.scheme.as_str(),
            self.config.api_server.as_str(),
            path,
        )
        .header("User-Agent", API_USER_AGENT)
        .header("Authorization", format!("Discogs token={token}"))
    }
}

#[async_trait]
impl Importer for DiscogsImporter {
    fn name(&self) -> &'static str {
        "Discogs"
    }

    fn additional_tags(&self) -> bool {
        true
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        Some(&self.config.settings)
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery {
        let terms = encode_url_query(&format!("{artist} {album}"));
        let request = match self.token() {
            Some(token) => self.api_request(
                token,
                format!("/database/search?type=release&title&q={terms}"),
            ),
            None => server_request(
                &self.config.settings,
                format!("/search?type=releases&q={terms}&btn=Search"),
            ),
        };
        FindQuery::Request(request)
    }

    fn track_list_query(&self, category: &str, id: &str, _flags: ImportFlags) -> HttpRequest {
        match self.token() {
            Some(token) => self.api_request(token, format!("/{}/{}", percent_encode(category), id)),
            None => server_request(&self.config.settings, format!("/{category}/{id}")),
        }
    }

    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel) {
        if self.token().is_some() {
            json::parse_find_results(data, albums);
        } else {
            page::parse_find_results(&decode_with_fallback(data), albums);
        }
    }

    fn parse_album_results(&self, data: &[u8], flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
        if self.token().is_some() {
            json::parse_album_results(data, flags, tracks);
        } else {
            page::parse_album_results(&decode_with_fallback(data), flags, tracks);
        }
    }
}
