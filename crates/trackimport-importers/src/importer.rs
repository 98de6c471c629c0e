// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use tracing::debug;
use trackimport_config::ServerImporterConfig;
use trackimport_domain::{AlbumListModel, ImportTrackDataVector};
use trackimport_http::{HttpRequest, HttpTransport};

use crate::error::Result;

/// Characters left as they are by query encoding, everything else is escaped.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

lazy_static! {
    static ref SPACES_RE: Regex = Regex::new(" +").expect("spaces regex is valid");
}

/// Data classes requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportFlags {
    pub standard_tags: bool,
    pub additional_tags: bool,
    pub cover_art: bool,
}

impl ImportFlags {
    pub const NONE: ImportFlags = ImportFlags {
        standard_tags: false,
        additional_tags: false,
        cover_art: false,
    };

    pub const ALL: ImportFlags = ImportFlags {
        standard_tags: true,
        additional_tags: true,
        cover_art: true,
    };

    pub fn new(standard_tags: bool, additional_tags: bool, cover_art: bool) -> Self {
        Self {
            standard_tags,
            additional_tags,
            cover_art,
        }
    }

    pub fn is_empty(self) -> bool {
        !(self.standard_tags || self.additional_tags || self.cover_art)
    }

    pub fn union(self, other: ImportFlags) -> Self {
        Self::new(
            self.standard_tags || other.standard_tags,
            self.additional_tags || other.additional_tags,
            self.cover_art || other.cover_art,
        )
    }

    pub fn intersection(self, other: ImportFlags) -> Self {
        Self::new(
            self.standard_tags && other.standard_tags,
            self.additional_tags && other.additional_tags,
            self.cover_art && other.cover_art,
        )
    }

    /// Classes set here but not in `other`.
    pub fn difference(self, other: ImportFlags) -> Self {
        Self::new(
            self.standard_tags && !other.standard_tags,
            self.additional_tags && !other.additional_tags,
            self.cover_art && !other.cover_art,
        )
    }
}

/// How a find operation is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindQuery {
    /// Send the request and parse the response.
    Request(HttpRequest),
    /// The search key already identifies a release.
    Direct(AlbumListModel),
}

/// Uniform contract of an import source.
///
/// Query building and response parsing are source specific; [`Importer::find`]
/// and [`Importer::get_track_list`] combine them with a transport. An importer
/// holds no state between calls, the album list and the track data are owned
/// by the caller.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Name used to select the importer in batch profiles.
    fn name(&self) -> &'static str;

    /// Whether the source delivers additional tags and cover art.
    fn additional_tags(&self) -> bool {
        false
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        None
    }

    /// Data classes the source can deliver at all.
    fn capabilities(&self) -> ImportFlags {
        let additional = self.additional_tags();
        ImportFlags::new(true, additional, additional)
    }

    /// Classes to request outside of batch profiles: the capabilities,
    /// narrowed by the per-server `additional_tags` and `cover_art` settings.
    fn default_flags(&self) -> ImportFlags {
        let configured = self.config().map_or(ImportFlags::ALL, |config| {
            ImportFlags::new(true, config.additional_tags, config.cover_art)
        });
        configured.intersection(self.capabilities())
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery;

    fn track_list_query(&self, category: &str, id: &str, flags: ImportFlags) -> HttpRequest;

    /// Replace the contents of `albums` with the candidates found in `data`.
    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel);

    /// Merge the release in `data` into `tracks`.
    fn parse_album_results(&self, data: &[u8], flags: ImportFlags, tracks: &mut ImportTrackDataVector);

    async fn find(
        &self,
        transport: &dyn HttpTransport,
        artist: &str,
        album: &str,
    ) -> Result<AlbumListModel> {
        let mut albums = AlbumListModel::new();
        match self.find_query(artist, album) {
            FindQuery::Direct(direct) => {
                debug!(target: "import", importer = self.name(), "search key is a release link");
                albums = direct;
            }
            FindQuery::Request(request) => {
                let body = transport.fetch(&request).await?;
                self.parse_find_results(&body, &mut albums);
            }
        }
        debug!(target: "import", importer = self.name(), albums = albums.len(), "find finished");
        Ok(albums)
    }

    async fn get_track_list(
        &self,
        transport: &dyn HttpTransport,
        category: &str,
        id: &str,
        flags: ImportFlags,
        tracks: &mut ImportTrackDataVector,
    ) -> Result<()> {
        let request = self.track_list_query(category, id, flags);
        let body = transport.fetch(&request).await?;
        self.parse_album_results(&body, flags, tracks);
        debug!(
            target: "import",
            importer = self.name(),
            tracks = tracks.len(),
            "track list received"
        );
        Ok(())
    }
}

/// Encode a search string for a URL query: runs of spaces collapse and
/// become `+`, reserved characters are percent-encoded.
pub fn encode_url_query(query: &str) -> String {
    let collapsed = SPACES_RE.replace_all(query, " ");
    utf8_percent_encode(&collapsed, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

/// Percent-encode a single value without turning spaces into `+`.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ENCODE_SET).to_string()
}

/// GET request to the server configured for an importer.
pub(crate) fn server_request(config: &ServerImporterConfig, path: impl Into<String>) -> HttpRequest {
    HttpRequest::get(config.scheme.as_str(), config.server.as_str(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_search_terms() {
        assert_eq!(encode_url_query("amon amarth  avenger"), "amon+amarth+avenger");
        assert_eq!(encode_url_query("AC/DC & Co"), "AC%2FDC+%26+Co");
        assert_eq!(encode_url_query("Björk"), "Bj%C3%B6rk");
        assert_eq!(encode_url_query("Catharsis / Imago"), "Catharsis+%2F+Imago");
    }

    #[test]
    fn flag_set_operations() {
        let requested = ImportFlags::new(true, true, false);
        let imported = ImportFlags::new(true, false, false);
        assert_eq!(requested.difference(imported), ImportFlags::new(false, true, false));
        assert_eq!(requested.intersection(ImportFlags::ALL), requested);
        assert_eq!(imported.union(ImportFlags::new(false, false, true)), ImportFlags::new(true, false, true));
        assert!(ImportFlags::NONE.is_empty());
        assert!(!requested.is_empty());
    }

    struct Configured {
        config: ServerImporterConfig,
        capable: bool,
    }

    #[async_trait]
    impl Importer for Configured {
        fn name(&self) -> &'static str {
            "Configured"
        }

        fn additional_tags(&self) -> bool {
            self.capable
        }

        fn config(&self) -> Option<&ServerImporterConfig> {
            Some(&self.config)
        }

        fn find_query(&self, _artist: &str, _album: &str) -> FindQuery {
            FindQuery::Direct(AlbumListModel::new())
        }

        fn track_list_query(&self, category: &str, id: &str, _flags: ImportFlags) -> HttpRequest {
            HttpRequest::get("http", "localhost", format!("/{category}/{id}"))
        }

        fn parse_find_results(&self, _data: &[u8], _albums: &mut AlbumListModel) {}

        fn parse_album_results(&self, _data: &[u8], _flags: ImportFlags, _tracks: &mut ImportTrackDataVector) {}
    }

    #[test]
    fn default_flags_follow_server_settings() {
        let mut config = ServerImporterConfig::new("localhost", "http", "");
        let importer = Configured { config: config.clone(), capable: true };
        assert_eq!(importer.default_flags(), ImportFlags::ALL);

        config.cover_art = false;
        let importer = Configured { config: config.clone(), capable: true };
        assert_eq!(importer.default_flags(), ImportFlags::new(true, true, false));

        config.cover_art = true;
        let importer = Configured { config, capable: false };
        assert_eq!(importer.capabilities(), ImportFlags::new(true, false, false));
        assert_eq!(importer.default_flags(), ImportFlags::new(true, false, false));
    }
}
