// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use trackimport_config::ServerImporterConfig;
use trackimport_domain::{format_duration, AlbumListModel, FrameType, ImportTrackDataVector};
use trackimport_http::HttpClient;
use trackimport_importers::{ImportFlags, Importer, MusicBrainzImporter};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_XML: &str = include_str!("fixtures/musicbrainz_search.xml");
const RELEASE_XML: &str = include_str!("fixtures/musicbrainz_release.xml");

fn importer() -> MusicBrainzImporter {
    MusicBrainzImporter::new(ServerImporterConfig::new("musicbrainz.org", "https", ""))
}

#[test]
fn search_lists_releases() {
    let mut albums = AlbumListModel::new();
    importer().parse_find_results(SEARCH_XML.as_bytes(), &mut albums);

    assert_eq!(albums.len(), 3);
    let second = &albums.items()[1];
    assert_eq!(second.text, "Wizard - Odin");
    assert_eq!(second.category, "release");
    assert_eq!(second.id, "978c7ed1-a854-4ef2-bd4e-e7c1317be854");
}

#[test]
fn release_fills_tracks() {
    let mut tracks = ImportTrackDataVector::new();
    importer().parse_album_results(RELEASE_XML.as_bytes(), ImportFlags::ALL, &mut tracks);

    assert_eq!(tracks.len(), 11);
    let lengths = [
        "5:19", "4:53", "6:02", "5:42", "5:08", "4:01", "5:01", "5:06", "5:21", "5:40", "3:53",
    ];
    for (row, length) in lengths.iter().enumerate() {
        let track = &tracks.tracks[row];
        assert_eq!(format_duration(track.import_duration), *length);
        assert_eq!(track.frames.track(), row as u32 + 1);
        assert_eq!(track.frames.artist(), "Wizard");
        assert_eq!(track.frames.album(), "Odin");
        assert_eq!(track.frames.year(), 2003);
        assert_eq!(track.frames.get(FrameType::AlbumArtist), "Wizard");
        assert_eq!(track.frames.get(FrameType::CatalogNumber), "LMP 0303-054 CD");
        assert_eq!(track.frames.get(FrameType::Publisher), "Limb Music Products");
        assert_eq!(track.frames.get(FrameType::ReleaseCountry), "DE");
    }
    assert_eq!(tracks.tracks[4].frames.title(), "Loki's Punishment");
    assert_eq!(
        tracks.cover_art_url,
        "http://www.amazon.de/gp/product/B00008OUEN.jpg"
    );
}

#[test]
fn standard_tags_only() {
    let mut tracks = ImportTrackDataVector::new();
    importer().parse_album_results(
        RELEASE_XML.as_bytes(),
        ImportFlags::new(true, false, false),
        &mut tracks,
    );

    assert_eq!(tracks.len(), 11);
    let frames = &tracks.tracks[0].frames;
    assert_eq!(frames.title(), "The Prophecy");
    assert!(!frames.contains(FrameType::Publisher));
    assert!(!frames.contains(FrameType::AlbumArtist));
    assert!(tracks.cover_art_url.is_empty());
}

#[test]
fn garbage_keeps_existing_tracks() {
    let mut tracks = ImportTrackDataVector::new();
    importer().parse_album_results(RELEASE_XML.as_bytes(), ImportFlags::ALL, &mut tracks);
    importer().parse_album_results(b"<html>Service Unavailable</html>", ImportFlags::ALL, &mut tracks);
    assert_eq!(tracks.len(), 11);
}

#[tokio::test]
async fn round_trip_through_web_service() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ws/2/release"))
        .and(query_param("query", "artist:Wizard AND release:Odin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_XML))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/2/release/978c7ed1-a854-4ef2-bd4e-e7c1317be854"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELEASE_XML))
        .expect(1)
        .mount(&server)
        .await;

    let host = server.uri().trim_start_matches("http://").to_string();
    let importer = MusicBrainzImporter::new(ServerImporterConfig::new(&host, "http", ""));
    let client = HttpClient::builder()
        .rate_limit_interval(Duration::from_millis(0))
        .build()
        .expect("client should build");

    let albums = importer
        .find(&client, "Wizard", "Odin")
        .await
        .expect("find should succeed");
    let release = albums.get(1).expect("second release should be listed");

    let mut tracks = ImportTrackDataVector::new();
    importer
        .get_track_list(&client, &release.category, &release.id, ImportFlags::ALL, &mut tracks)
        .await
        .expect("track list should be fetched");
    assert_eq!(tracks.len(), 11);
}
