//! Catalog storage behind a small repository trait.
//!
//! The reconciler only ever looks items up by subpath, inserts new ones and
//! rewrites existing ones, so that is all a store has to provide. Uniqueness of
//! `subpath` is the store's job; a second insert of the same subpath must come
//! back as [`CatalogError::UniqueViolation`] rather than a generic failure.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

use crate::media::library::MediaItem;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog already has an entry for {subpath}")]
    UniqueViolation { subpath: String },
    #[error("no catalog entry for {subpath}")]
    NotFound { subpath: String },
    #[error("catalog row has unknown media kind {0:?}")]
    BadKind(String),
    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("catalog lock poisoned")]
    Poisoned,
}

pub trait CatalogStore: Send + Sync {
    fn find_by_subpath(&self, subpath: &str) -> Result<Option<MediaItem>, CatalogError>;

    /// Insert a new item and return its id.
    fn insert(&self, item: &MediaItem) -> Result<i64, CatalogError>;

    /// Overwrite the stored attributes of the item with the same subpath.
    fn update(&self, item: &MediaItem) -> Result<(), CatalogError>;

    fn len(&self) -> Result<usize, CatalogError>;

    fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.len()? == 0)
    }
}
