use crate::models::{Favorite, Movie, SortDirection};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed keys the store namespaces its data under.
pub const FAVORITES_KEY: &str = "favorites_v2";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable key/value storage: string keys to string payloads. Mutations
/// persist before returning.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed storage: one JSON object per store file, rewritten whole on
/// every mutation. An unreadable file degrades to an empty map.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable store file {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        self.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Sort keys available on the favorites view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteSortKey {
    Added,
    Title,
    Rating,
}

impl FavoriteSortKey {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => FavoriteSortKey::Title,
            "rating" => FavoriteSortKey::Rating,
            _ => FavoriteSortKey::Added,
        }
    }
}

/// Owns the favorites side-table and the theme preference, both persisted
/// through an injected `Storage` implementation.
pub struct Store {
    storage: Box<dyn Storage>,
}

impl Store {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(Box::new(FileStorage::open(path)?)))
    }

    /// Current favorites in save order. A missing or corrupt payload reads
    /// as an empty list.
    pub fn favorites(&self) -> Vec<Favorite> {
        let Some(payload) = self.storage.get(FAVORITES_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&payload).unwrap_or_else(|e| {
            warn!("Discarding unreadable favorites payload: {}", e);
            Vec::new()
        })
    }

    fn save_favorites(&mut self, favorites: &[Favorite]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(favorites)?;
        self.storage.set(FAVORITES_KEY, &payload)
    }

    /// Saves a copy of the movie with the current timestamp. Adding an
    /// already-favorited id is a no-op returning the unchanged list.
    pub fn add(&mut self, movie: &Movie) -> Result<Vec<Favorite>, StorageError> {
        let mut favorites = self.favorites();
        if favorites.iter().any(|f| f.movie.id == movie.id) {
            debug!("Movie {} already favorited", movie.id);
            return Ok(favorites);
        }
        favorites.push(Favorite {
            movie: movie.clone(),
            saved_at: Utc::now(),
        });
        self.save_favorites(&favorites)?;
        Ok(favorites)
    }

    /// Removing a non-member id is a no-op.
    pub fn remove(&mut self, id: &str) -> Result<Vec<Favorite>, StorageError> {
        let mut favorites = self.favorites();
        let before = favorites.len();
        favorites.retain(|f| f.movie.id != id);
        if favorites.len() != before {
            self.save_favorites(&favorites)?;
        }
        Ok(favorites)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites().iter().any(|f| f.movie.id == id)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(FAVORITES_KEY)
    }

    pub fn theme(&self) -> Option<Theme> {
        self.storage.get(THEME_KEY).and_then(|t| Theme::parse(&t))
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set(THEME_KEY, theme.label())
    }

    /// Flips the persisted theme, treating an unset preference as the
    /// given default.
    pub fn toggle_theme(&mut self, default: Theme) -> Result<Theme, StorageError> {
        let next = self.theme().unwrap_or(default).flipped();
        self.set_theme(next)?;
        Ok(next)
    }
}

/// Favorites-view refinement: same matcher as the main pipeline, applied
/// to the saved copies.
pub fn filter_favorites(favorites: &[Favorite], query: &str) -> Vec<Favorite> {
    let query = query.trim().to_lowercase();
    favorites
        .iter()
        .filter(|f| query.is_empty() || f.movie.search_haystack().contains(&query))
        .cloned()
        .collect()
}

pub fn sort_favorites(
    mut favorites: Vec<Favorite>,
    key: FavoriteSortKey,
    direction: SortDirection,
) -> Vec<Favorite> {
    favorites.sort_by(|a, b| {
        let ordering = match key {
            FavoriteSortKey::Added => a.saved_at.cmp(&b.saved_at),
            FavoriteSortKey::Title => a.movie.title.to_lowercase().cmp(&b.movie.title.to_lowercase()),
            FavoriteSortKey::Rating => a
                .movie
                .rating
                .unwrap_or(0.0)
                .total_cmp(&b.movie.rating.unwrap_or(0.0)),
        };
        direction.apply(ordering)
    });
    favorites
}
