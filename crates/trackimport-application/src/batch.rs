// SPDX-License-Identifier: GPL-3.0-or-later

//! Batch import of several albums through a profile of sources.
//!
//! [`BatchImporter`] walks the album groups one by one. For each group it
//! tries the sources of the profile in order: find candidate releases, fetch
//! their track lists until one is accurate enough, then fetch cover art. A
//! source only delivers the data classes which are still missing for the
//! group, so later sources fill in what earlier ones could not.
//!
//! Exactly one request is outstanding at any time. An abort cancels it and
//! stops the walk before anything else is written to the files.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use trackimport_config::CoverArtConfig;
use trackimport_domain::{
    AlbumListItem, AlbumListModel, BatchImportProfile, BatchRunId, FrameCollection, ImportEvent,
    ImportEventKind, ImportTrackDataVector, PictureFrame, ProfileSource,
};
use trackimport_http::{HttpTransport, ImageDownloader};
use trackimport_importers::{ImportFlags, Importer, ImporterRegistry};

use crate::accuracy::calculate_accuracy;
use crate::cover_art::PictureUrlMapper;
use crate::events::EventPublisher;
use crate::filename_format::FilenameFormat;

/// Reported instead of a URL when a download is not a usable picture.
pub const INVALID_FILE: &str = "Invalid File";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    CheckNextTrackList,
    CheckNextSource,
    GettingAlbumList,
    CheckNextAlbum,
    GettingTracks,
    GettingCover,
    CheckIfDone,
    ImportAborted,
}

/// Requests the abort of a running batch import from another task.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// What was imported for one album group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlbumImportSummary {
    pub artist: String,
    pub album: String,
    /// Importer whose track list was accepted.
    pub tag_source: Option<String>,
    pub accuracy: Option<u8>,
    pub standard_tags: bool,
    pub additional_tags: bool,
    pub cover_art: bool,
    pub cover_art_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchImportReport {
    pub run_id: BatchRunId,
    pub aborted: bool,
    /// Album groups in input order, accepted track lists replace the input.
    pub track_lists: Vec<ImportTrackDataVector>,
    pub albums: Vec<AlbumImportSummary>,
}

/// Progress of one call to [`BatchImporter::run`].
struct Run {
    id: BatchRunId,
    profile: BatchImportProfile,
    track_lists: Vec<ImportTrackDataVector>,
    albums: Vec<AlbumImportSummary>,
    list_index: Option<usize>,
    source_index: Option<usize>,
    source: Option<ProfileSource>,
    importer: Option<Arc<dyn Importer>>,
    album_list: AlbumListModel,
    album_index: Option<usize>,
    item: Option<AlbumListItem>,
    artist: String,
    album: String,
    requested: ImportFlags,
    imported: ImportFlags,
    /// Data classes asked for by the last track list request.
    pending: ImportFlags,
    cover_art_url: String,
}

fn next_index(current: Option<usize>) -> usize {
    current.map_or(0, |i| i + 1)
}

pub struct BatchImporter<P: EventPublisher> {
    registry: ImporterRegistry,
    transport: Arc<dyn HttpTransport>,
    downloader: Arc<dyn ImageDownloader>,
    publisher: P,
    picture_urls: PictureUrlMapper,
    min_image_size: usize,
    filename_format: Option<FilenameFormat>,
    state: BatchState,
    abort_tx: Arc<watch::Sender<bool>>,
}

impl<P: EventPublisher> BatchImporter<P> {
    pub fn new(
        registry: ImporterRegistry,
        transport: Arc<dyn HttpTransport>,
        downloader: Arc<dyn ImageDownloader>,
        publisher: P,
    ) -> Self {
        let cover_art = CoverArtConfig::default();
        let (abort_tx, _) = watch::channel(false);
        Self {
            registry,
            transport,
            downloader,
            publisher,
            picture_urls: PictureUrlMapper::from_config(&cover_art),
            min_image_size: cover_art.min_image_size,
            filename_format: None,
            state: BatchState::Idle,
            abort_tx: Arc::new(abort_tx),
        }
    }

    pub fn with_cover_art(mut self, config: &CoverArtConfig) -> Self {
        self.picture_urls = PictureUrlMapper::from_config(config);
        self.min_image_size = config.min_image_size;
        self
    }

    /// Format used to derive artist and album from the path of the first
    /// file when a group has no such tags.
    pub fn with_filename_format(mut self, format: FilenameFormat) -> Self {
        self.filename_format = Some(format);
        self
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: Arc::clone(&self.abort_tx),
        }
    }

    pub fn abort(&self) {
        self.abort_tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        self.state == BatchState::ImportAborted || *self.abort_tx.borrow()
    }

    /// Leave the aborted state so that the importer can run again.
    pub fn clear_aborted(&mut self) {
        if self.is_aborted() {
            self.abort_tx.send_replace(false);
            self.state = BatchState::Idle;
        }
    }

    /// Import `track_lists`, one album group each, using the sources of `profile`.
    #[instrument(skip_all, fields(profile = %profile.name, albums = track_lists.len()))]
    pub async fn run(
        &mut self,
        profile: &BatchImportProfile,
        track_lists: Vec<ImportTrackDataVector>,
    ) -> BatchImportReport {
        let mut run = Run {
            id: BatchRunId::new(),
            profile: profile.clone(),
            albums: vec![AlbumImportSummary::default(); track_lists.len()],
            track_lists,
            list_index: None,
            source_index: None,
            source: None,
            importer: None,
            album_list: AlbumListModel::new(),
            album_index: None,
            item: None,
            artist: String::new(),
            album: String::new(),
            requested: ImportFlags::NONE,
            imported: ImportFlags::NONE,
            pending: ImportFlags::NONE,
            cover_art_url: String::new(),
        };
        info!(target: "batch", run_id = %run.id, "batch import started");
        self.report(&run, ImportEventKind::Started, &profile.name);

        self.state = BatchState::CheckNextTrackList;
        loop {
            if *self.abort_tx.borrow() {
                self.state = BatchState::ImportAborted;
            }
            let next = match self.state {
                BatchState::Idle => break,
                BatchState::CheckNextTrackList => self.check_next_track_list(&mut run),
                BatchState::CheckNextSource => self.check_next_source(&mut run),
                BatchState::GettingAlbumList => self.get_album_list(&mut run).await,
                BatchState::CheckNextAlbum => self.check_next_album(&mut run),
                BatchState::GettingTracks => self.get_tracks(&mut run).await,
                BatchState::GettingCover => self.get_cover(&mut run).await,
                BatchState::CheckIfDone => {
                    if run.requested.difference(run.imported).is_empty() {
                        BatchState::CheckNextTrackList
                    } else {
                        BatchState::CheckNextAlbum
                    }
                }
                BatchState::ImportAborted => {
                    warn!(target: "batch", run_id = %run.id, "batch import aborted");
                    self.report(&run, ImportEventKind::Aborted, "");
                    break;
                }
            };
            self.state = next;
        }

        BatchImportReport {
            run_id: run.id,
            aborted: self.state == BatchState::ImportAborted,
            track_lists: run.track_lists,
            albums: run.albums,
        }
    }

    fn report(&self, run: &Run, kind: ImportEventKind, text: &str) {
        debug!(target: "batch", run_id = %run.id, event = kind.event_name(), text, "import event");
        self.publisher.publish(&ImportEvent::import(run.id, kind, text));
    }

    /// Run `future` unless the import is aborted first. An abort raised
    /// while the future completes also discards its output.
    async fn cancellable<F: Future>(&self, future: F) -> Option<F::Output> {
        let mut rx = self.abort_tx.subscribe();
        let output = tokio::select! {
            biased;
            _ = wait_for_abort(&mut rx) => return None,
            output = future => output,
        };
        (!*self.abort_tx.borrow()).then_some(output)
    }

    fn check_next_track_list(&self, run: &mut Run) -> BatchState {
        loop {
            let index = next_index(run.list_index);
            run.list_index = Some(index);
            let Some(tracks) = run.track_lists.get(index) else {
                break;
            };
            if tracks.is_empty() {
                continue;
            }
            let mut artist = tracks.artist();
            let mut album = tracks.album();
            if artist.is_empty() && album.is_empty() {
                let from_path = self.filename_format.as_ref().and_then(|format| {
                    let file = tracks.tracks.first()?.file()?;
                    format.parse(file.abs_path())
                });
                if let Some(frames) = from_path {
                    artist = frames.artist().to_string();
                    album = frames.album().to_string();
                }
            }
            if artist.is_empty() && album.is_empty() {
                debug!(target: "batch", index, "album group has no search key");
                continue;
            }

            let summary = &mut run.albums[index];
            summary.artist = artist.clone();
            summary.album = album.clone();
            run.artist = artist;
            run.album = album;
            run.source_index = None;
            run.imported = ImportFlags::NONE;
            return BatchState::CheckNextSource;
        }

        info!(target: "batch", run_id = %run.id, "batch import finished");
        self.report(run, ImportEventKind::Finished, "");
        BatchState::Idle
    }

    fn check_next_source(&self, run: &mut Run) -> BatchState {
        run.importer = None;
        run.source = None;
        loop {
            let index = next_index(run.source_index);
            run.source_index = Some(index);
            let Some(source) = run.profile.sources.get(index) else {
                break;
            };
            let Ok(importer) = self.registry.get(&source.name) else {
                debug!(target: "batch", source = %source.name, "no importer for profile source");
                continue;
            };
            run.requested =
                ImportFlags::new(source.standard_tags, source.additional_tags, source.cover_art)
                    .intersection(importer.capabilities());
            run.source = Some(source.clone());
            run.importer = Some(importer);
            break;
        }

        match &run.importer {
            Some(importer) => {
                self.report(run, ImportEventKind::SourceSelected, importer.name());
                BatchState::GettingAlbumList
            }
            None => BatchState::CheckNextTrackList,
        }
    }

    async fn get_album_list(&self, run: &mut Run) -> BatchState {
        run.album_index = None;
        run.album_list.clear();
        let Some(importer) = run.importer.clone() else {
            return BatchState::CheckNextSource;
        };
        let query = format!("{} - {}", run.artist, run.album);
        self.report(run, ImportEventKind::QueryingAlbumList, &query);

        let find = importer.find(self.transport.as_ref(), &run.artist, &run.album);
        match self.cancellable(find).await {
            None => BatchState::ImportAborted,
            Some(Ok(albums)) => {
                debug!(target: "batch", importer = importer.name(), albums = albums.len(), "album list received");
                run.album_list = albums;
                BatchState::CheckNextAlbum
            }
            Some(Err(e)) => {
                warn!(target: "batch", importer = importer.name(), error = %e, "album list query failed");
                self.report(run, ImportEventKind::Error, &e.to_string());
                BatchState::CheckNextAlbum
            }
        }
    }

    fn check_next_album(&self, run: &mut Run) -> BatchState {
        run.item = None;
        loop {
            let index = next_index(run.album_index);
            run.album_index = Some(index);
            let Some(item) = run.album_list.get(index) else {
                break;
            };
            if !item.id.is_empty() {
                run.item = Some(item.clone());
                break;
            }
        }
        if run.item.is_some() {
            BatchState::GettingTracks
        } else {
            BatchState::CheckNextSource
        }
    }

    async fn get_tracks(&self, run: &mut Run) -> BatchState {
        run.cover_art_url.clear();
        run.pending = ImportFlags::NONE;
        let (Some(importer), Some(item), Some(index)) =
            (run.importer.clone(), run.item.clone(), run.list_index)
        else {
            return BatchState::CheckNextSource;
        };
        self.report(run, ImportEventKind::FetchingTrackList, &item.text);

        let pending = run.requested.difference(run.imported);
        run.pending = pending;
        // Standard tags are always fetched, the accuracy is measured with them.
        let flags = ImportFlags::new(!pending.is_empty(), pending.additional_tags, pending.cover_art);

        let mut fetched = run.track_lists[index].clone();
        let fetch = importer.get_track_list(
            self.transport.as_ref(),
            &item.category,
            &item.id,
            flags,
            &mut fetched,
        );
        match self.cancellable(fetch).await {
            None => return BatchState::ImportAborted,
            Some(Err(e)) => {
                warn!(target: "batch", importer = importer.name(), error = %e, "track list query failed");
                self.report(run, ImportEventKind::Error, &e.to_string());
                return BatchState::GettingCover;
            }
            Some(Ok(())) => {}
        }

        let accuracy = calculate_accuracy(&fetched);
        let accuracy_text = match accuracy {
            Some(percent) => format!("Accuracy {percent}%"),
            None => "Accuracy Unknown".to_string(),
        };
        self.report(run, ImportEventKind::TrackListReceived, &accuracy_text);

        run.cover_art_url = std::mem::take(&mut fetched.cover_art_url);
        let required = run.source.as_ref().map_or(100, |s| s.required_accuracy);
        if !accuracy.is_some_and(|percent| percent >= required) {
            info!(
                target: "batch",
                album = %item.text,
                accuracy = ?accuracy,
                required,
                "track list rejected"
            );
            return BatchState::GettingCover;
        }

        let tags = ImportFlags::new(pending.standard_tags, pending.additional_tags, false);
        if *self.abort_tx.borrow() {
            return BatchState::ImportAborted;
        }
        if !tags.is_empty() {
            commit_tags(&fetched, tags);
            run.track_lists[index] = fetched;
            let summary = &mut run.albums[index];
            summary.tag_source = Some(importer.name().to_string());
            summary.accuracy = accuracy;
            summary.standard_tags |= tags.standard_tags;
            summary.additional_tags |= tags.additional_tags;
            info!(target: "batch", album = %item.text, importer = importer.name(), "track list accepted");
        }
        run.imported = run.imported.union(tags);
        BatchState::GettingCover
    }

    async fn get_cover(&self, run: &mut Run) -> BatchState {
        let Some(index) = run.list_index else {
            return BatchState::CheckIfDone;
        };
        if !run.pending.cover_art || run.cover_art_url.is_empty() {
            return BatchState::CheckIfDone;
        }
        let Some(image_url) = self.picture_urls.image_url(&run.cover_art_url) else {
            debug!(target: "batch", url = %run.cover_art_url, "no picture URL for cover art link");
            return BatchState::CheckIfDone;
        };
        let cover_art_url = run.cover_art_url.clone();
        self.report(run, ImportEventKind::FetchingCoverArt, &cover_art_url);

        let image = match self.cancellable(self.downloader.download(&image_url)).await {
            None => return BatchState::ImportAborted,
            Some(Err(e)) => {
                warn!(target: "batch", url = %image_url, error = %e, "cover art download failed");
                self.report(run, ImportEventKind::Error, &e.to_string());
                return BatchState::CheckIfDone;
            }
            Some(Ok(image)) => image,
        };

        if image.data.len() < self.min_image_size || !image.mime_type.starts_with("image") {
            debug!(
                target: "batch",
                url = %image.url,
                size = image.data.len(),
                mime_type = %image.mime_type,
                "download is not a cover picture"
            );
            self.report(run, ImportEventKind::CoverArtReceived, INVALID_FILE);
            return BatchState::CheckIfDone;
        }

        self.report(run, ImportEventKind::CoverArtReceived, &image.url);
        let picture = PictureFrame::cover_front(image.mime_type, image.data);
        for file in run.track_lists[index]
            .iter()
            .filter_map(|track| track.file())
            .filter(|file| file.supports_pictures())
        {
            file.add_picture(picture.clone());
        }
        run.imported.cover_art = true;
        let summary = &mut run.albums[index];
        summary.cover_art = true;
        summary.cover_art_url = Some(image.url);
        BatchState::CheckIfDone
    }
}

async fn wait_for_abort(rx: &mut watch::Receiver<bool>) {
    loop {
        let aborted = *rx.borrow_and_update();
        if aborted {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Write the accepted frames of `flags` to the files of the enabled slots.
fn commit_tags(tracks: &ImportTrackDataVector, flags: ImportFlags) {
    for track in tracks.iter().filter(|track| track.enabled) {
        let Some(file) = track.file() else {
            continue;
        };
        let mut frames = FrameCollection::new();
        for (frame_type, value) in track.frames.iter() {
            let wanted = if frame_type.is_standard() {
                flags.standard_tags
            } else {
                flags.additional_tags
            };
            if wanted {
                frames.set_value(frame_type, value);
            }
        }
        file.set_frames(&frames);
    }
}
