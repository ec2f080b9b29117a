use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::catalog::{CatalogError, CatalogStore};
use crate::media::library::MediaItem;

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<String, MediaItem>,
    next_id: i64,
}

/// In-process catalog keyed by subpath. Used by tests and `--database :memory:`
/// style deployments that do not care about persistence.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalog {
    fn find_by_subpath(&self, subpath: &str) -> Result<Option<MediaItem>, CatalogError> {
        let inner = self.inner.lock().map_err(|_| CatalogError::Poisoned)?;
        Ok(inner.items.get(subpath).cloned())
    }

    fn insert(&self, item: &MediaItem) -> Result<i64, CatalogError> {
        let mut inner = self.inner.lock().map_err(|_| CatalogError::Poisoned)?;
        if inner.items.contains_key(&item.subpath) {
            return Err(CatalogError::UniqueViolation {
                subpath: item.subpath.clone(),
            });
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let mut stored = item.clone();
        stored.id = Some(id);
        inner.items.insert(stored.subpath.clone(), stored);
        Ok(id)
    }

    fn update(&self, item: &MediaItem) -> Result<(), CatalogError> {
        let mut inner = self.inner.lock().map_err(|_| CatalogError::Poisoned)?;
        let Some(stored) = inner.items.get_mut(&item.subpath) else {
            return Err(CatalogError::NotFound {
                subpath: item.subpath.clone(),
            });
        };
        let id = stored.id;
        *stored = item.clone();
        stored.id = id;
        Ok(())
    }

    fn len(&self) -> Result<usize, CatalogError> {
        let inner = self.inner.lock().map_err(|_| CatalogError::Poisoned)?;
        Ok(inner.items.len())
    }
}
