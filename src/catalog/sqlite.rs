use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::catalog::{CatalogError, CatalogStore};
use crate::media::library::MediaItem;
use crate::media::mime::MediaKind;

/// SQLite-backed catalog. `subpath` carries a UNIQUE constraint, which is what
/// keeps two concurrent reconciles of the same directory from duplicating rows.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        tracing::debug!("Catalog database opened at {}", path.display());
        Self::with_connection(conn)
    }

    /// Catalog that lives only as long as the process.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CatalogError> {
        // another process holding the file: wait instead of failing with SQLITE_BUSY
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS media (
                media_id        INTEGER PRIMARY KEY AUTOINCREMENT,
                subpath         TEXT NOT NULL UNIQUE,
                filename        TEXT NOT NULL,
                kind            TEXT NOT NULL,
                has_subtitles   INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_media_filename ON media(filename)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, bool)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }
}

fn into_item(
    (id, subpath, filename, kind, has_subtitles): (i64, String, String, String, bool),
) -> Result<MediaItem, CatalogError> {
    let kind = MediaKind::parse(&kind).ok_or(CatalogError::BadKind(kind))?;
    Ok(MediaItem {
        id: Some(id),
        subpath,
        filename,
        kind,
        has_subtitles,
    })
}

impl CatalogStore for SqliteCatalog {
    fn find_by_subpath(&self, subpath: &str) -> Result<Option<MediaItem>, CatalogError> {
        let conn = self.conn.lock().map_err(|_| CatalogError::Poisoned)?;
        let row = conn
            .query_row(
                "SELECT media_id, subpath, filename, kind, has_subtitles
                 FROM media WHERE subpath = ?1",
                params![subpath],
                Self::row_to_item,
            )
            .optional()?;
        row.map(into_item).transpose()
    }

    fn insert(&self, item: &MediaItem) -> Result<i64, CatalogError> {
        let conn = self.conn.lock().map_err(|_| CatalogError::Poisoned)?;
        let result = conn.execute(
            "INSERT INTO media (subpath, filename, kind, has_subtitles)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.subpath,
                item.filename,
                item.kind.as_str(),
                item.has_subtitles
            ],
        );
        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(CatalogError::UniqueViolation {
                    subpath: item.subpath.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&self, item: &MediaItem) -> Result<(), CatalogError> {
        let conn = self.conn.lock().map_err(|_| CatalogError::Poisoned)?;
        let changed = conn.execute(
            "UPDATE media SET filename = ?2, kind = ?3, has_subtitles = ?4
             WHERE subpath = ?1",
            params![
                item.subpath,
                item.filename,
                item.kind.as_str(),
                item.has_subtitles
            ],
        )?;
        if changed == 0 {
            return Err(CatalogError::NotFound {
                subpath: item.subpath.clone(),
            });
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, CatalogError> {
        let conn = self.conn.lock().map_err(|_| CatalogError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
