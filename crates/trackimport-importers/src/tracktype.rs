// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use trackimport_config::ServerImporterConfig;
use trackimport_domain::{AlbumListModel, ImportTrackDataVector};
use trackimport_http::HttpRequest;

use crate::freedb::{cddb_read_request, cddb_request, parse_cddb_album};
use crate::html::decode_with_fallback;
use crate::importer::{encode_url_query, FindQuery, ImportFlags, Importer};

lazy_static! {
    static ref LINE_SEP_RE: Regex = Regex::new(r"[\r\n]+").expect("line separator regex is valid");
    static ref MATCH_RE: Regex = Regex::new(r"^([a-z]+)\s+([0-9a-f]+)\s+([^/]+ / .+)$")
        .expect("match line regex is valid");
}

/// TrackType.org, a CDDB server which also answers `cddb album` searches.
pub struct TrackTypeImporter {
    config: ServerImporterConfig,
}

impl TrackTypeImporter {
    pub fn new(config: ServerImporterConfig) -> Self {
        Self { config }
    }
}

fn append_match(line: &str, albums: &mut AlbumListModel) {
    if let Some(caps) = MATCH_RE.captures(line) {
        albums.append_item(&caps[3], &caps[1], &caps[2]);
    }
}

#[async_trait]
impl Importer for TrackTypeImporter {
    fn name(&self) -> &'static str {
        "TrackType.org"
    }

    fn config(&self) -> Option<&ServerImporterConfig> {
        Some(&self.config)
    }

    fn find_query(&self, artist: &str, album: &str) -> FindQuery {
        let terms = encode_url_query(&format!("{artist} / {album}"));
        FindQuery::Request(cddb_request(&self.config, &format!("cmd=cddb+album+{terms}")))
    }

    fn track_list_query(&self, category: &str, id: &str, _flags: ImportFlags) -> HttpRequest {
        cddb_read_request(&self.config, category, id)
    }

    /// Accepts "210 exact matches" / "211 close matches" blocks and a
    /// single "200 categ discid dtitle" answer.
    fn parse_find_results(&self, data: &[u8], albums: &mut AlbumListModel) {
        let text = decode_with_fallback(data);
        albums.clear();
        let mut in_entries = false;
        for line in LINE_SEP_RE.split(&text) {
            if line == "." {
                break;
            }
            if in_entries {
                append_match(line, albums);
            } else if line.starts_with("21") && line.contains(" match") {
                in_entries = true;
            } else if let Some(rest) = line.strip_prefix("200 ") {
                append_match(rest, albums);
            }
        }
    }

    fn parse_album_results(&self, data: &[u8], _flags: ImportFlags, tracks: &mut ImportTrackDataVector) {
        parse_cddb_album(data, tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer() -> TrackTypeImporter {
        TrackTypeImporter::new(ServerImporterConfig::new("tracktype.org", "http", "/~cddb/cddb.cgi"))
    }

    #[test]
    fn find_query_uses_album_command() {
        let FindQuery::Request(request) = importer().find_query("Catharsis", "Imago") else {
            panic!("expected a request");
        };
        assert_eq!(request.host, "tracktype.org");
        assert!(request
            .path
            .starts_with("/~cddb/cddb.cgi?cmd=cddb+album+Catharsis+%2F+Imago&hello=noname+localhost+"));
    }

    #[test]
    fn parses_match_blocks() {
        let mut albums = AlbumListModel::new();
        importer().parse_find_results(
            b"211 close matches found\r\nrock 920b810c Catharsis / Imago\r\nnot a match line\r\n.\r\n",
            &mut albums,
        );
        assert_eq!(albums.len(), 1);
        assert_eq!(albums.items()[0].id, "920b810c");

        importer().parse_find_results(b"200 misc 8f0a6b0b Catharsis / Imago\r\n", &mut albums);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums.items()[0].category, "misc");

        importer().parse_find_results(b"202 No match found\r\n", &mut albums);
        assert!(albums.is_empty());
    }
}
