// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Candidate album returned by a find query.
///
/// `category` and `id` are source-defined tokens replayed into the track
/// list query of the same source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumListItem {
    pub text: String,
    pub category: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumListModel {
    items: Vec<AlbumListItem>,
}

impl AlbumListModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn append_item(
        &mut self,
        text: impl Into<String>,
        category: impl Into<String>,
        id: impl Into<String>,
    ) {
        self.items.push(AlbumListItem {
            text: text.into(),
            category: category.into(),
            id: id.into(),
        });
    }

    pub fn items(&self) -> &[AlbumListItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&AlbumListItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
