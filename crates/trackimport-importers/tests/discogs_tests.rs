// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use trackimport_config::DiscogsConfig;
use trackimport_domain::{format_duration, split_string_list, AlbumListModel, FrameType, ImportTrackDataVector};
use trackimport_http::HttpClient;
use trackimport_importers::{DiscogsImporter, ImportFlags, Importer};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_JSON: &str = include_str!("fixtures/discogs_search.json");
const RELEASE_JSON: &str = include_str!("fixtures/discogs_release.json");
const SEARCH_HTML: &str = include_str!("fixtures/discogs_search.html");
const RELEASE_HTML: &str = include_str!("fixtures/discogs_release.html");
const ODIN_RELEASE: &str = "Wizard - Odin (2003) [CD, Album, Enh, Ltd, Dig]";

fn importer(token: Option<&str>) -> DiscogsImporter {
    let mut config = DiscogsConfig::default();
    config.settings.token = token.map(str::to_string);
    DiscogsImporter::new(config)
}

fn test_client() -> HttpClient {
    HttpClient::builder()
        .rate_limit_interval(Duration::from_millis(0))
        .build()
        .expect("client should build")
}

#[test]
fn api_search_lists_releases() {
    let mut albums = AlbumListModel::new();
    importer(Some("token")).parse_find_results(SEARCH_JSON.as_bytes(), &mut albums);

    assert_eq!(albums.len(), 10);
    let first = &albums.items()[0];
    assert_eq!(first.text, ODIN_RELEASE);
    assert_eq!(first.category, "releases");
    assert_eq!(first.id, "2487778");
    assert_eq!(albums.items()[3].text, "Wizard - Odin (2003) [Vinyl, LP, Pic, Ltd]");
    assert_eq!(albums.items()[5].text, "Desaster - Lost In The Ages (1994) [Cassette, S/Sided]");
}

#[test]
fn api_release_fills_tracks() {
    let mut tracks = ImportTrackDataVector::new();
    importer(Some("token")).parse_album_results(RELEASE_JSON.as_bytes(), ImportFlags::ALL, &mut tracks);

    assert_eq!(tracks.len(), 14);
    let lengths = [
        "5:19", "4:53", "6:02", "5:43", "5:08", "4:01", "5:01", "5:06", "5:21", "5:40", "3:53",
    ];
    for (row, length) in lengths.iter().enumerate() {
        let track = &tracks.tracks[row];
        assert_eq!(format_duration(track.import_duration), *length);
        assert_eq!(track.frames.track(), row as u32 + 1);
        assert_eq!(track.frames.artist(), "Wizard");
        assert_eq!(track.frames.album(), "Odin");
        assert_eq!(track.frames.year(), 2003);
        assert_eq!(track.frames.genre(), "Heavy Metal");
        assert_eq!(track.frames.get(FrameType::CatalogNumber), "LMP 0303-054 Ltd. CD");
        assert_eq!(track.frames.get(FrameType::Media), "CD");
        assert_eq!(track.frames.get(FrameType::Publisher), "LMP");
        assert_eq!(track.frames.get(FrameType::ReleaseCountry), "Germany");
    }
    assert_eq!(tracks.tracks[0].frames.title(), "The Prophecy");
    assert_eq!(tracks.tracks[13].frames.title(), "Betrayer");
    assert_eq!(tracks.tracks[13].import_duration, 0);
    assert_eq!(
        tracks.cover_art_url,
        "http://api.discogs.com/image/R-2487778-1293847958.jpeg"
    );
}

#[test]
fn web_search_skips_image_links() {
    let mut albums = AlbumListModel::new();
    importer(None).parse_find_results(SEARCH_HTML.as_bytes(), &mut albums);

    assert_eq!(albums.len(), 3);
    assert_eq!(albums.items()[0].text, ODIN_RELEASE);
    assert_eq!(albums.items()[0].category, "Wizard-Odin/release");
    assert_eq!(albums.items()[0].id, "2487778");
    assert_eq!(albums.items()[1].text, "Wizard - Odin");
    assert_eq!(albums.items()[2].text, "Wizard - Thor");
    assert_eq!(albums.items()[2].id, "2487767");
}

#[test]
fn web_release_fills_tracks_and_credits() {
    let mut tracks = ImportTrackDataVector::new();
    importer(None).parse_album_results(RELEASE_HTML.as_bytes(), ImportFlags::ALL, &mut tracks);

    assert_eq!(tracks.len(), 13);
    let first = &tracks.tracks[0].frames;
    assert_eq!(first.title(), "The Prophecy");
    assert_eq!(first.artist(), "Wizard");
    assert_eq!(first.album(), "Odin");
    assert_eq!(first.year(), 2003);
    assert_eq!(first.genre(), "Heavy Metal");
    assert_eq!(first.get(FrameType::Publisher), "LMP");
    assert_eq!(first.get(FrameType::Media), "CD, Album, Limited Edition, Enhanced");
    assert_eq!(
        split_string_list(first.get(FrameType::Performer)),
        vec!["Bass", "Volker Leson", "Vocals", "Sven D'Anna"]
    );
    assert_eq!(
        split_string_list(first.get(FrameType::Arranger)),
        vec!["Producer", "Achim Köhler"]
    );
    assert_eq!(tracks.tracks[0].import_duration, 319);

    assert_eq!(tracks.tracks[2].frames.get(FrameType::Lyricist), "Sven D'Anna");
    assert!(!tracks.tracks[3].frames.contains(FrameType::Lyricist));
    assert_eq!(tracks.tracks[6].frames.title(), "Thor's Hammer");
    assert_eq!(tracks.tracks[12].frames.track(), 13);
    assert_eq!(
        tracks.cover_art_url,
        "http://www.discogs.com/image/R-150-2487778-1293847958.jpeg"
    );
}

#[test]
fn standard_tags_only_leave_out_credits() {
    let mut tracks = ImportTrackDataVector::new();
    importer(None).parse_album_results(
        RELEASE_HTML.as_bytes(),
        ImportFlags::new(true, false, false),
        &mut tracks,
    );

    assert_eq!(tracks.len(), 13);
    let frames = &tracks.tracks[0].frames;
    assert_eq!(frames.title(), "The Prophecy");
    assert!(!frames.contains(FrameType::Publisher));
    assert!(!frames.contains(FrameType::Performer));
    assert!(tracks.cover_art_url.is_empty());
}

#[tokio::test]
async fn api_round_trip_sends_token() {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();

    Mock::given(method("GET"))
        .and(path("/database/search"))
        .and(query_param("q", "Wizard Odin"))
        .and(header("authorization", "Discogs token=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_JSON))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/releases/2487778"))
        .and(header("authorization", "Discogs token=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELEASE_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = DiscogsConfig::default();
    config.settings.scheme = "http".to_string();
    config.settings.server = host.clone();
    config.settings.token = Some("secret".to_string());
    config.api_server = host;
    let importer = DiscogsImporter::new(config);
    let client = test_client();

    let albums = importer
        .find(&client, "Wizard", "Odin")
        .await
        .expect("find should succeed");
    assert_eq!(albums.len(), 10);

    let first = &albums.items()[0];
    assert_eq!(first.text, ODIN_RELEASE);
    let mut tracks = ImportTrackDataVector::new();
    importer
        .get_track_list(&client, &first.category, &first.id, ImportFlags::ALL, &mut tracks)
        .await
        .expect("track list should be fetched");
    assert_eq!(tracks.len(), 14);
    assert_eq!(tracks.tracks[0].frames.title(), "The Prophecy");
    assert_eq!(format_duration(tracks.tracks[0].import_duration), "5:19");
    assert_eq!(tracks.tracks[0].frames.year(), 2003);
    assert!(tracks.tracks[0].frames.genre().contains("Heavy Metal"));
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = DiscogsConfig::default();
    config.settings.scheme = "http".to_string();
    config.settings.server = server.uri().trim_start_matches("http://").to_string();
    let importer = DiscogsImporter::new(config);

    let result = importer.find(&test_client(), "Wizard", "Odin").await;
    assert!(result.is_err());
}
