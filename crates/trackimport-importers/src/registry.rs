// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use trackimport_config::ImportersConfig;

use crate::amazon::AmazonImporter;
use crate::discogs::DiscogsImporter;
use crate::error::{ImportError, Result};
use crate::freedb::FreedbImporter;
use crate::importer::Importer;
use crate::musicbrainz::MusicBrainzImporter;
use crate::tracktype::TrackTypeImporter;

/// Importers available to batch profiles, looked up by [`Importer::name`].
#[derive(Default, Clone)]
pub struct ImporterRegistry {
    importers: HashMap<String, Arc<dyn Importer>>,
    /// Registration order, used for listing.
    order: Vec<String>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in importer configured from `config`.
    pub fn from_config(config: &ImportersConfig) -> Self {
        let mut registry = Self::new();
        registry.register(MusicBrainzImporter::new(config.musicbrainz.clone()));
        registry.register(DiscogsImporter::new(config.discogs.clone()));
        registry.register(AmazonImporter::new(config.amazon.clone()));
        registry.register(FreedbImporter::new(config.freedb.clone()));
        registry.register(TrackTypeImporter::new(config.tracktype.clone()));
        registry
    }

    /// Register an importer, replacing one with the same name.
    pub fn register(&mut self, importer: impl Importer + 'static) {
        self.register_arc(Arc::new(importer));
    }

    pub fn register_arc(&mut self, importer: Arc<dyn Importer>) {
        let name = importer.name().to_string();
        info!(target: "registry", importer = %name, "registering importer");
        if self.importers.insert(name.clone(), importer).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Importer>> {
        self.importers
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::UnknownImporter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.importers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
