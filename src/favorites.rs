use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::mapping::favorite_from_movie;
use crate::types::Movie;

/// Display-relevant projection of a [`Movie`] kept in the favorites set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Option<Vec<i64>>,
}

/// Insertion-ordered set of favorites keyed by movie id.
///
/// Entries are replaced wholesale, never edited: removing and re-adding a
/// movie projects it again from whatever snapshot is passed in.
#[derive(Debug, Clone, Default)]
pub struct FavoritesSet {
    order: BTreeMap<u64, FavoriteEntry>,
    index: HashMap<i64, u64>,
    next_seq: u64,
}

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries; the first entry for an id wins.
    pub fn from_entries(entries: impl IntoIterator<Item = FavoriteEntry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            if !set.has(entry.id) {
                set.insert(entry);
            }
        }
        set
    }

    /// Remove `movie` if present, add it otherwise. Returns whether it is a favorite afterwards.
    pub fn toggle(&mut self, movie: &Movie) -> bool {
        if self.remove(movie.id) {
            return false;
        }
        self.insert(favorite_from_movie(movie));
        true
    }

    pub fn has(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&FavoriteEntry> {
        self.index.get(&id).and_then(|seq| self.order.get(seq))
    }

    /// Entries in insertion order.
    pub fn list(&self) -> Vec<FavoriteEntry> {
        self.order.values().cloned().collect()
    }

    /// Snapshot handed to a [`crate::storage::FavoritesStore`].
    pub fn entries(&self) -> Vec<FavoriteEntry> {
        self.list()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteEntry> {
        self.order.values()
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn remove(&mut self, id: i64) -> bool {
        match self.index.remove(&id) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    fn insert(&mut self, entry: FavoriteEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(entry.id, seq);
        self.order.insert(seq, entry);
    }
}

/// Whether a favorites view should be reachable; an empty set redirects away.
pub fn favorites_view_allowed(favorites: &FavoritesSet) -> bool {
    favorites.count() > 0
}
