use mediashelf::catalog::{CatalogError, CatalogStore, MemoryCatalog, SqliteCatalog};
use mediashelf::media::library::MediaItem;
use mediashelf::media::mime::MediaKind;

fn exercise_store(store: &dyn CatalogStore) {
    let item = MediaItem::new("shows/ep1.mkv", MediaKind::Video, true);
    assert!(store.find_by_subpath("shows/ep1.mkv").unwrap().is_none());

    let id = store.insert(&item).unwrap();
    let found = store.find_by_subpath("shows/ep1.mkv").unwrap().unwrap();
    assert_eq!(found.id, Some(id));
    assert_eq!(found.filename, "ep1.mkv");
    assert_eq!(found.kind, MediaKind::Video);
    assert!(found.has_subtitles);

    match store.insert(&item) {
        Err(CatalogError::UniqueViolation { subpath }) => assert_eq!(subpath, "shows/ep1.mkv"),
        other => panic!("expected UniqueViolation, got {other:?}"),
    }

    let updated = MediaItem { has_subtitles: false, ..found };
    store.update(&updated).unwrap();
    let found = store.find_by_subpath("shows/ep1.mkv").unwrap().unwrap();
    assert!(!found.has_subtitles);
    assert_eq!(found.id, Some(id), "update keeps the row id");

    let missing = MediaItem::new("nope.mp4", MediaKind::Video, false);
    assert!(matches!(store.update(&missing), Err(CatalogError::NotFound { .. })));

    store.insert(&MediaItem::new("book.epub", MediaKind::Book, false)).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert!(!store.is_empty().unwrap());
}

#[test]
fn memory_catalog_contract() {
    exercise_store(&MemoryCatalog::new());
}

#[test]
fn sqlite_catalog_contract() {
    exercise_store(&SqliteCatalog::open_in_memory().unwrap());
}

#[test]
fn sqlite_catalog_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    {
        let store = SqliteCatalog::open(&path).unwrap();
        store.insert(&MediaItem::new("a.epub", MediaKind::Book, false)).unwrap();
    }
    let store = SqliteCatalog::open(&path).unwrap();
    let item = store.find_by_subpath("a.epub").unwrap().unwrap();
    assert_eq!(item.kind, MediaKind::Book);
    assert_eq!(store.len().unwrap(), 1);
}
