// SPDX-License-Identifier: GPL-3.0-or-later

mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trackimport_application::{
    calculate_accuracy, match_with_length, match_with_title, match_with_track, BatchImporter,
    FilenameFormat, InMemoryEventBus,
};
use trackimport_config::{load as load_config, AppConfig, TelemetryConfig};
use trackimport_domain::BatchImportProfile;
use trackimport_http::HttpClient;
use trackimport_importers::ImporterRegistry;

use crate::manifest::{BatchAlbumOutput, BatchOutput, ImportAlbumOutput, Manifest, TrackOutput};

#[derive(Debug, Parser)]
#[command(name = "trackimport", version, about = "Import album track data from online sources")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, env = "TRACKIMPORT_CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a batch import profile over every album of a manifest
    Batch {
        #[arg(long, short)]
        manifest: PathBuf,
        /// Profile name, defaults to the configured profile index
        #[arg(long, short)]
        profile: Option<String>,
    },
    /// Fetch one release per album from a single source and align it to the files
    Import {
        #[arg(long, short)]
        manifest: PathBuf,
        /// Importer name, e.g. "MusicBrainz Release"
        #[arg(long, short)]
        source: String,
        /// Position of the release in the search results
        #[arg(long, default_value_t = 0)]
        album_index: usize,
        #[arg(long = "match", value_enum, default_value_t = MatchMode::Length)]
        match_mode: MatchMode,
    },
    /// List importers and batch profiles
    Sources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchMode {
    None,
    Length,
    Track,
    Title,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry);

    match cli.command {
        Command::Batch { manifest, profile } => {
            run_batch(&config, &manifest, profile.as_deref()).await
        }
        Command::Import {
            manifest,
            source,
            album_index,
            match_mode,
        } => run_import(&config, &manifest, &source, album_index, match_mode).await,
        Command::Sources => list_sources(&config),
    }
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if telemetry.json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_batch(config: &AppConfig, manifest: &Path, profile: Option<&str>) -> Result<()> {
    let manifest = Manifest::load(manifest)?;
    let profile_config = config
        .batch
        .profile(profile)
        .with_context(|| format!("unknown batch profile {}", profile.unwrap_or("(default)")))?;
    let profile = BatchImportProfile::from_sources_str(&profile_config.name, &profile_config.sources);
    let format = FilenameFormat::new(&config.batch.filename_format)
        .context("invalid batch filename format")?;
    let client = Arc::new(HttpClient::from_config(&config.http)?);

    let mut importer = BatchImporter::new(
        ImporterRegistry::from_config(&config.importers),
        client.clone(),
        client,
        InMemoryEventBus::new(),
    )
    .with_cover_art(&config.cover_art)
    .with_filename_format(format);

    let abort = importer.abort_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: "cli", "interrupt received, aborting batch import");
            abort.abort();
        }
    });

    info!(target: "cli", profile = %profile.name, albums = manifest.albums.len(), "starting batch import");
    let report = importer.run(&profile, manifest.track_lists()).await;
    interrupt.abort();

    let albums = report
        .track_lists
        .iter()
        .zip(report.albums)
        .map(|(tracks, summary)| BatchAlbumOutput {
            summary,
            tracks: tracks.iter().map(TrackOutput::stored).collect(),
        })
        .collect();
    print_json(&BatchOutput {
        run_id: report.run_id.to_string(),
        aborted: report.aborted,
        albums,
        events: importer.publisher().drain(),
    })
}

async fn run_import(
    config: &AppConfig,
    manifest: &Path,
    source: &str,
    album_index: usize,
    match_mode: MatchMode,
) -> Result<()> {
    let manifest = Manifest::load(manifest)?;
    let registry = ImporterRegistry::from_config(&config.importers);
    let importer = registry.get(source)?;
    let client = HttpClient::from_config(&config.http)?;
    let flags = importer.default_flags();

    let mut output = Vec::new();
    for tracks in manifest.track_lists() {
        let mut album = ImportAlbumOutput {
            artist: tracks.artist(),
            album: tracks.album(),
            ..ImportAlbumOutput::default()
        };
        if album.artist.is_empty() && album.album.is_empty() {
            warn!(target: "cli", "album without artist and album tags skipped");
            album.tracks = tracks.iter().map(TrackOutput::imported).collect();
            output.push(album);
            continue;
        }

        let candidates = match importer.find(&client, &album.artist, &album.album).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(target: "cli", artist = %album.artist, album = %album.album, error = %e, "search failed");
                album.tracks = tracks.iter().map(TrackOutput::imported).collect();
                output.push(album);
                continue;
            }
        };
        let Some(release) = candidates.get(album_index).cloned() else {
            warn!(target: "cli", artist = %album.artist, album = %album.album, found = candidates.len(), "no release at requested index");
            album.tracks = tracks.iter().map(TrackOutput::imported).collect();
            output.push(album);
            continue;
        };

        let mut fetched = tracks.clone();
        if let Err(e) = importer
            .get_track_list(&client, &release.category, &release.id, flags, &mut fetched)
            .await
        {
            warn!(target: "cli", release = %release.text, error = %e, "track list query failed");
        }

        album.matched = match match_mode {
            MatchMode::None => true,
            MatchMode::Length => match_with_length(
                &mut fetched,
                config.matching.enable_time_difference_check,
                config.matching.max_time_difference,
            ),
            MatchMode::Track => match_with_track(&mut fetched),
            MatchMode::Title => match_with_title(&mut fetched),
        };
        if !album.matched {
            warn!(target: "cli", release = %release.text, "could not match imported tracks to files");
        }

        album.accuracy = calculate_accuracy(&fetched);
        album.release = Some(release.text);
        album.cover_art_url = fetched.cover_art_url.clone();
        album.tracks = fetched.iter().map(TrackOutput::imported).collect();
        output.push(album);
    }
    print_json(&output)
}

fn list_sources(config: &AppConfig) -> Result<()> {
    #[derive(Serialize)]
    struct Sources<'a> {
        importers: Vec<&'a str>,
        profiles: Vec<BatchImportProfile>,
    }

    let registry = ImporterRegistry::from_config(&config.importers);
    let profiles = config
        .batch
        .profiles
        .iter()
        .map(|p| BatchImportProfile::from_sources_str(&p.name, &p.sources))
        .collect();
    print_json(&Sources {
        importers: registry.names().collect(),
        profiles,
    })
}
