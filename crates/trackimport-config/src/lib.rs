// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Minimum spacing between two requests to the same importer.
    pub min_request_interval_ms: u64,
    /// Number of responses kept in memory; 0 disables the cache.
    pub response_cache_capacity: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("trackimport/", env!("CARGO_PKG_VERSION")).to_string(),
            min_request_interval_ms: 1000,
            response_cache_capacity: 256,
        }
    }
}

/// Connection settings of one import server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerImporterConfig {
    /// Host with optional port.
    pub server: String,
    pub scheme: String,
    pub cgi_path: String,
    /// API token; for freedb servers an address containing `@` used in the hello string.
    pub token: Option<String>,
    pub additional_tags: bool,
    pub cover_art: bool,
}

impl ServerImporterConfig {
    pub fn new(server: &str, scheme: &str, cgi_path: &str) -> Self {
        Self {
            server: server.to_string(),
            scheme: scheme.to_string(),
            cgi_path: cgi_path.to_string(),
            token: None,
            additional_tags: true,
            cover_art: true,
        }
    }

    /// Token with surrounding whitespace removed, `None` when empty.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

impl Default for ServerImporterConfig {
    fn default() -> Self {
        Self::new("", "http", "")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscogsConfig {
    #[serde(flatten)]
    pub settings: ServerImporterConfig,
    /// Host of the JSON API, used when a token is configured.
    pub api_server: String,
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            settings: ServerImporterConfig::new("www.discogs.com", "https", ""),
            api_server: "api.discogs.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportersConfig {
    pub musicbrainz: ServerImporterConfig,
    pub discogs: DiscogsConfig,
    pub amazon: ServerImporterConfig,
    pub freedb: ServerImporterConfig,
    pub tracktype: ServerImporterConfig,
}

impl Default for ImportersConfig {
    fn default() -> Self {
        Self {
            musicbrainz: ServerImporterConfig::new("musicbrainz.org", "https", ""),
            discogs: DiscogsConfig::default(),
            amazon: ServerImporterConfig::new("www.amazon.com", "https", ""),
            freedb: ServerImporterConfig::new("gnudb.gnudb.org", "http", "/~cddb/cddb.cgi"),
            tracktype: ServerImporterConfig::new("tracktype.org", "http", "/~cddb/cddb.cgi"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub enable_time_difference_check: bool,
    /// Seconds a file may differ from an import to keep its slot.
    pub max_time_difference: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            enable_time_difference_check: true,
            max_time_difference: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    /// `"Name:Accuracy:Flags;..."` with flags `S` (standard), `A` (additional), `C` (cover art).
    pub sources: String,
}

impl ProfileConfig {
    fn new(name: &str, sources: &str) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub profiles: Vec<ProfileConfig>,
    pub profile_index: usize,
    /// Format used to derive artist and album from a path when the tags are empty.
    pub filename_format: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            profiles: vec![
                ProfileConfig::new(
                    "All",
                    "MusicBrainz Release:75:SAC;Discogs:75:SAC;Amazon:75:SAC;gnudb.org:75:S;TrackType.org:75:S",
                ),
                ProfileConfig::new("MusicBrainz", "MusicBrainz Release:75:SAC"),
                ProfileConfig::new("Discogs", "Discogs:75:SAC"),
                ProfileConfig::new("Cover Art", "Amazon:75:C;Discogs:75:C;MusicBrainz Release:75:C"),
                ProfileConfig::new("Custom Profile", ""),
            ],
            profile_index: 0,
            filename_format: "%{artist} - %{album}/%{track} %{title}".to_string(),
        }
    }
}

impl BatchConfig {
    /// Profile by name, or the one at `profile_index` when no name is given.
    pub fn profile(&self, name: Option<&str>) -> Option<&ProfileConfig> {
        match name {
            Some(name) => self.profiles.iter().find(|p| p.name == name),
            None => self.profiles.get(self.profile_index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureUrlRule {
    /// Regular expression which must match the whole URL.
    pub pattern: String,
    /// Replacement with `${n}` capture references.
    pub replacement: String,
}

impl PictureUrlRule {
    fn new(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverArtConfig {
    /// Downloads smaller than this are not treated as images.
    pub min_image_size: usize,
    pub picture_url_rules: Vec<PictureUrlRule>,
}

impl Default for CoverArtConfig {
    fn default() -> Self {
        Self {
            min_image_size: 1024,
            picture_url_rules: vec![
                PictureUrlRule::new(r"http://images\.google\.com/.*imgurl=([^&]+)&.*", "${1}"),
                PictureUrlRule::new(
                    r"http://rds\.yahoo\.com/.*%26imgurl=((?:[^%]|%[^2]|%2[^6])+).*",
                    "http%253A%252F%252F${1}",
                ),
                PictureUrlRule::new(
                    r"http://rds\.yahoo\.com/.*&imgurl=([^&]+)&.*",
                    "http%3A%2F%2F${1}",
                ),
                PictureUrlRule::new(
                    r"https?://(?:www\.)?amazon\.(?:com|co\.uk|de|fr).*/(?:dp|ASIN|images|product|-)/([A-Z0-9]+).*",
                    "http://images.amazon.com/images/P/${1}.01._SCLZZZZZZZ_.jpg",
                ),
                PictureUrlRule::new(
                    r"http://musicbrainz\.org/misc/redirects/.*&asin=([A-Z0-9]+).*",
                    "http://images.amazon.com/images/P/${1}.01._SCLZZZZZZZ_.jpg",
                ),
                PictureUrlRule::new(
                    r"http://www\.freecovers\.net/view/(\d+)/([0-9a-f]+)/.*",
                    "http://www.freecovers.net/preview/${1}/${2}/big.jpg",
                ),
                PictureUrlRule::new(
                    r"http://cdbaby\.com/cd/(\w)(\w)(\w+)",
                    "http://cdbaby.name/${1}/${2}/${1}${2}${3}.jpg",
                ),
                PictureUrlRule::new(
                    r"http://www\.jamendo\.com/en/album/(\d+)",
                    "http://imgjam.com/albums/${1}/covers/1.0.jpg",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub http: HttpConfig,
    pub importers: ImportersConfig,
    pub matching: MatchingConfig,
    pub batch: BatchConfig,
    pub cover_art: CoverArtConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: TRACKIMPORT_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TRACKIMPORT_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(
        target: "config",
        profiles = config.batch.profiles.len(),
        "configuration loaded"
    );
    Ok(config)
}
