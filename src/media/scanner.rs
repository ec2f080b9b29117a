use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use walkdir::WalkDir;

use crate::catalog::{CatalogError, CatalogStore};
use crate::config::{ExtensionSets, LibraryConfig};
use crate::media::library::MediaItem;
use crate::media::mime::{classify, MediaKind};
use crate::media::paths::{basename, extension_lower, join_subpath, resolve_under};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("directory not found: {0}")]
    NotFound(String),
    #[error("cannot read directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Case-insensitive ordering shared by folders and files.
fn sort_key(name: &str) -> (String, &str) {
    (name.to_uppercase(), name)
}

fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

/// One non-recursive snapshot of a directory. Everything derived from a
/// listing (media, subtitle matches) is computed from the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Sub-directories, hidden (dot) folders excluded.
    pub folders: Vec<String>,
    /// Every non-directory entry, recognized or not.
    pub files: Vec<String>,
}

impl DirectoryListing {
    pub fn read(dir: &Path) -> std::io::Result<Self> {
        let mut folders = Vec::new();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("Skipping non UTF-8 name in {}", dir.display());
                continue;
            };
            // metadata() follows symlinks, so a linked folder browses like a real one
            let is_dir = match std::fs::metadata(entry.path()) {
                Ok(m) => m.is_dir(),
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if is_dir {
                if !name.starts_with('.') {
                    folders.push(name);
                }
            } else {
                files.push(name);
            }
        }
        Ok(Self::from_names(folders, files))
    }

    pub fn from_names(mut folders: Vec<String>, mut files: Vec<String>) -> Self {
        sort_names(&mut folders);
        sort_names(&mut files);
        Self { folders, files }
    }
}

/// A change the catalog needs so that it matches the current directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogMutation {
    Insert(MediaItem),
    Update(MediaItem),
}

/// Outcome of planning one directory: the media list to show and the catalog
/// writes needed to get there. `mutations` is empty when the catalog is current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub media: Vec<MediaItem>,
    pub mutations: Vec<CatalogMutation>,
}

/// Subtitle-presence policy for one media file.
///
/// Videos have subtitles when a sidecar shares their basename, or when their
/// container is listed in `embedded_subtitles` (the `.mkv` heuristic). Books
/// never have subtitles.
pub fn subtitle_flag(
    filename: &str,
    kind: MediaKind,
    subtitle_basenames: &HashSet<&str>,
    exts: &ExtensionSets,
) -> bool {
    match kind {
        MediaKind::Video => {
            subtitle_basenames.contains(basename(filename))
                || extension_lower(filename)
                    .is_some_and(|ext| exts.embedded_subtitles.contains(&ext))
        }
        MediaKind::Book | MediaKind::Subtitle => false,
    }
}

/// Decide, without touching any store, what one directory listing means for
/// the catalog.
///
/// `files` are entry names of the directory at `dir_subpath`; `existing` maps
/// subpaths to what the catalog holds today. Running the returned mutations and
/// planning again with the same listing yields no mutations.
pub fn plan(
    files: &[String],
    dir_subpath: &str,
    existing: &HashMap<String, MediaItem>,
    exts: &ExtensionSets,
) -> Reconciliation {
    let mut candidates: Vec<(&str, MediaKind)> = Vec::new();
    let mut subtitle_basenames: HashSet<&str> = HashSet::new();
    for name in files {
        match classify(name, exts) {
            Some(MediaKind::Subtitle) => {
                subtitle_basenames.insert(basename(name));
            }
            Some(kind) => candidates.push((name.as_str(), kind)),
            None => {}
        }
    }
    candidates.sort_by(|a, b| sort_key(a.0).cmp(&sort_key(b.0)));

    let mut out = Reconciliation::default();
    for (filename, kind) in candidates {
        let subpath = join_subpath(dir_subpath, filename);
        let has_subtitles = subtitle_flag(filename, kind, &subtitle_basenames, exts);

        match existing.get(&subpath) {
            None => {
                let item = MediaItem::new(subpath, kind, has_subtitles);
                out.mutations.push(CatalogMutation::Insert(item.clone()));
                out.media.push(item);
            }
            Some(stored) if stored.has_subtitles != has_subtitles || stored.kind != kind => {
                let item = MediaItem {
                    has_subtitles,
                    kind,
                    ..stored.clone()
                };
                out.mutations.push(CatalogMutation::Update(item.clone()));
                out.media.push(item);
            }
            Some(stored) => out.media.push(stored.clone()),
        }
    }
    out
}

/// Counts of catalog writes performed by one reconcile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub inserted: usize,
    pub updated: usize,
}

/// A browsed directory: its folders and its reconciled media.
#[derive(Debug, Clone)]
pub struct DirectoryView {
    pub folders: Vec<String>,
    pub media: Vec<MediaItem>,
}

/// Statistics for the startup summary line.
#[derive(Debug, Default, Clone)]
pub struct SweepStats {
    pub directories: usize,
    pub media: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// Keeps the catalog in step with the library directories.
#[derive(Clone)]
pub struct Reconciler {
    config: Arc<LibraryConfig>,
    store: Arc<dyn CatalogStore>,
}

impl Reconciler {
    pub fn new(config: Arc<LibraryConfig>, store: Arc<dyn CatalogStore>) -> Self {
        Self { config, store }
    }

    /// Reconcile one directory listing against the catalog and return its
    /// media in display order, ids filled in.
    pub fn reconcile_directory(
        &self,
        files: &[String],
        subpath: &str,
    ) -> Result<Vec<MediaItem>, CatalogError> {
        self.reconcile_counted(files, subpath).map(|(media, _)| media)
    }

    fn reconcile_counted(
        &self,
        files: &[String],
        subpath: &str,
    ) -> Result<(Vec<MediaItem>, Applied), CatalogError> {
        let exts = &self.config.extensions;
        let mut existing = HashMap::new();
        for name in files {
            if matches!(classify(name, exts), Some(MediaKind::Video | MediaKind::Book)) {
                let item_subpath = join_subpath(subpath, name);
                if let Some(item) = self.store.find_by_subpath(&item_subpath)? {
                    existing.insert(item_subpath, item);
                }
            }
        }

        let Reconciliation { mut media, mutations } = plan(files, subpath, &existing, exts);
        let mut applied = Applied::default();
        let mut ids: HashMap<String, i64> = HashMap::new();
        for mutation in mutations {
            match mutation {
                CatalogMutation::Insert(item) => {
                    if let Some(id) = self.insert_or_update(&item, &mut applied)? {
                        ids.insert(item.subpath, id);
                    }
                }
                CatalogMutation::Update(item) => {
                    self.store.update(&item)?;
                    applied.updated += 1;
                    tracing::debug!(
                        "{}: has_subtitles -> {}",
                        item.subpath,
                        item.has_subtitles
                    );
                }
            }
        }
        for item in media.iter_mut().filter(|i| i.id.is_none()) {
            item.id = ids.get(&item.subpath).copied();
        }
        Ok((media, applied))
    }

    /// Insert a new item. If another request inserted the same subpath first,
    /// fall back to updating that row with the flag derived here.
    fn insert_or_update(
        &self,
        item: &MediaItem,
        applied: &mut Applied,
    ) -> Result<Option<i64>, CatalogError> {
        match self.store.insert(item) {
            Ok(id) => {
                applied.inserted += 1;
                tracing::debug!("catalogued {} (id {})", item.subpath, id);
                Ok(Some(id))
            }
            Err(CatalogError::UniqueViolation { subpath }) => {
                tracing::debug!("{} was inserted concurrently, reconciling instead", subpath);
                let Some(stored) = self.store.find_by_subpath(&subpath)? else {
                    return Err(CatalogError::NotFound { subpath });
                };
                if stored.has_subtitles != item.has_subtitles || stored.kind != item.kind {
                    self.store.update(item)?;
                    applied.updated += 1;
                }
                Ok(stored.id)
            }
            Err(e) => Err(e),
        }
    }

    /// Read the directory at `subpath` once and reconcile it.
    pub fn browse(&self, subpath: &str) -> Result<DirectoryView, ScanError> {
        let subpath = subpath.trim_matches('/');
        let dir = resolve_under(&self.config.root, subpath)
            .filter(|p| p.is_dir())
            .ok_or_else(|| ScanError::NotFound(subpath.to_string()))?;
        let listing = DirectoryListing::read(&dir).map_err(|source| ScanError::Io {
            path: dir.clone(),
            source,
        })?;
        let media = self.reconcile_directory(&listing.files, subpath)?;
        Ok(DirectoryView {
            folders: listing.folders,
            media,
        })
    }

    /// Reconcile every visible directory under the library root.
    /// Unreadable directories log a warning and are skipped.
    pub fn sweep(&self) -> SweepStats {
        let start = Instant::now();
        let root = &self.config.root;
        let mut stats = SweepStats::default();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = match entry {
                Ok(e) if e.file_type().is_dir() => e,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Cannot access entry: {}", e);
                    continue;
                }
            };
            let Some(subpath) = relative_subpath(root, entry.path()) else {
                tracing::warn!("Skipping non UTF-8 directory {}", entry.path().display());
                continue;
            };
            let listing = match DirectoryListing::read(entry.path()) {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!("Cannot read directory {}: {}", entry.path().display(), e);
                    stats.failed += 1;
                    continue;
                }
            };
            match self.reconcile_counted(&listing.files, &subpath) {
                Ok((media, applied)) => {
                    stats.directories += 1;
                    stats.media += media.len();
                    stats.inserted += applied.inserted;
                    stats.updated += applied.updated;
                }
                Err(e) => {
                    tracing::warn!("Cannot reconcile {}: {}", entry.path().display(), e);
                    stats.failed += 1;
                }
            }
        }

        stats.elapsed_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Swept {} directories, {} media ({} new, {} updated) in {:.1}s",
            stats.directories,
            stats.media,
            stats.inserted,
            stats.updated,
            stats.elapsed_secs
        );
        stats
    }
}

/// `/`-joined path of `path` relative to `root`, `""` for the root itself.
fn relative_subpath(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
