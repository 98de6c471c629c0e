// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use trackimport_config::ServerImporterConfig;
use trackimport_domain::{AlbumListModel, ImportTrackDataVector};
use trackimport_http::HttpClient;
use trackimport_importers::{FreedbImporter, ImportFlags, Importer, TrackTypeImporter};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIND_TEXT: &str = include_str!("fixtures/freedb_find.txt");
const READ_TEXT: &str = include_str!("fixtures/freedb_read.txt");
const TRACKTYPE_FIND_TEXT: &str = include_str!("fixtures/tracktype_find.txt");

fn config(server: &str) -> ServerImporterConfig {
    ServerImporterConfig::new(server, "http", "/~cddb/cddb.cgi")
}

#[test]
fn find_lists_matches() {
    let mut albums = AlbumListModel::new();
    FreedbImporter::new(config("gnudb.gnudb.org")).parse_find_results(FIND_TEXT.as_bytes(), &mut albums);

    assert_eq!(albums.len(), 3);
    let first = &albums.items()[0];
    assert_eq!(first.text, "Catharsis / Imago");
    assert_eq!(first.category, "rock");
    assert_eq!(first.id, "920b810c");
    assert_eq!(albums.items()[2].text, "Catharsis / Imago (Japanese Edition)");
}

#[test]
fn entry_fills_tracks() {
    let mut tracks = ImportTrackDataVector::new();
    FreedbImporter::new(config("gnudb.gnudb.org")).parse_album_results(
        READ_TEXT.as_bytes(),
        ImportFlags::ALL,
        &mut tracks,
    );

    assert_eq!(tracks.len(), 12);
    let durations: Vec<u32> = tracks.iter().map(|t| t.import_duration).collect();
    assert_eq!(
        durations,
        vec![64, 312, 295, 263, 280, 241, 305, 198, 274, 330, 222, 161]
    );
    let third = &tracks.tracks[2].frames;
    assert_eq!(third.title(), "Tales of the Dead Hope");
    assert_eq!(third.track(), 3);
    assert_eq!(third.artist(), "Catharsis");
    assert_eq!(third.album(), "Imago");
    assert_eq!(third.year(), 1999);
    assert_eq!(third.genre(), "Power Metal");
}

#[test]
fn tracktype_lists_close_matches() {
    let mut albums = AlbumListModel::new();
    TrackTypeImporter::new(config("tracktype.org"))
        .parse_find_results(TRACKTYPE_FIND_TEXT.as_bytes(), &mut albums);

    assert_eq!(albums.len(), 2);
    assert_eq!(albums.items()[1].category, "misc");
    assert_eq!(albums.items()[1].id, "920b810c");
}

#[tokio::test]
async fn round_trip_through_cgi() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/~cddb/cddb.cgi"))
        .and(query_param("cmd", "search"))
        .and(query_param("artist", "Catharsis"))
        .and(query_param("album", "Imago"))
        .and(query_param("proto", "6"))
        .and(header("user-email", "someone@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FIND_TEXT))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~cddb/cddb.cgi"))
        .and(query_param("cmd", "cddb read rock 920b810c"))
        .respond_with(ResponseTemplate::new(200).set_body_string(READ_TEXT))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config(server.uri().trim_start_matches("http://"));
    config.token = Some("someone@example.com".to_string());
    let importer = FreedbImporter::new(config);
    let client = HttpClient::builder()
        .rate_limit_interval(Duration::from_millis(0))
        .build()
        .expect("client should build");

    let albums = importer
        .find(&client, "Catharsis", "Imago")
        .await
        .expect("find should succeed");
    assert_eq!(albums.len(), 3);

    let first = &albums.items()[0];
    let mut tracks = ImportTrackDataVector::new();
    importer
        .get_track_list(&client, &first.category, &first.id, ImportFlags::ALL, &mut tracks)
        .await
        .expect("track list should be fetched");
    assert_eq!(tracks.len(), 12);
}
