use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediashelf::catalog::{CatalogStore, MemoryCatalog};
use mediashelf::config::LibraryConfig;
use mediashelf::http::{build_router, state::AppState};

const SRT: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello\n";

/// Library layout used by most tests:
///   film.mp4 (+ film.srt), Clip.mkv, book.epub, notes.txt, shows/ep1.mp4, .hidden/
fn library() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("film.mp4"), b"0123456789").unwrap();
    fs::write(root.join("film.srt"), SRT).unwrap();
    fs::write(root.join("Clip.mkv"), b"mkv").unwrap();
    fs::write(root.join("book.epub"), b"epub").unwrap();
    fs::write(root.join("notes.txt"), b"txt").unwrap();
    fs::create_dir(root.join("shows")).unwrap();
    fs::write(root.join("shows").join("ep1.mp4"), b"ep").unwrap();
    fs::create_dir(root.join(".hidden")).unwrap();
    dir
}

fn make_app(root: &Path) -> (axum::Router, Arc<MemoryCatalog>) {
    let store = Arc::new(MemoryCatalog::new());
    let state = AppState::new(LibraryConfig::new(root), store.clone());
    (build_router(state), store)
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// ── GET /api/browse ───────────────────────────────────────────────────────────

#[tokio::test]
async fn browse_root_lists_folders_and_media() {
    let lib = library();
    let (app, store) = make_app(lib.path());
    let response = get(app, "/api/browse").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["subpath"], "");
    assert_eq!(json["folders"], serde_json::json!(["shows"]));
    let names: Vec<&str> = json["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["book.epub", "Clip.mkv", "film.mp4"]);
    assert_eq!(json["media"][0]["kind"], "book");
    assert_eq!(json["media"][1]["has_subtitles"], true);
    assert_eq!(json["media"][2]["has_subtitles"], true);
    assert_eq!(store.len().unwrap(), 3);
}

#[tokio::test]
async fn browse_subdirectory_reports_parent() {
    let lib = library();
    let (app, store) = make_app(lib.path());
    let json = body_json(get(app, "/api/browse/shows").await).await;
    assert_eq!(json["subpath"], "shows");
    assert_eq!(json["parent"], "");
    assert_eq!(json["media"][0]["subpath"], "shows/ep1.mp4");
    assert_eq!(json["media"][0]["has_subtitles"], false);
    assert!(store.find_by_subpath("shows/ep1.mp4").unwrap().is_some());
}

#[tokio::test]
async fn browse_mp4_only_filter() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let json = body_json(get(app, "/api/browse?mp4_only=true").await).await;
    let media = json["media"].as_array().unwrap();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0]["filename"], "film.mp4");
}

#[tokio::test]
async fn browse_missing_folder_returns_404() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    assert_eq!(get(app, "/api/browse/nope").await.status(), StatusCode::NOT_FOUND);
}

// ── GET /api/play ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn play_video_converts_subtitles() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let response = get(app, "/api/play/film.mp4").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["name"], "film");
    assert_eq!(json["kind"], "video");
    assert_eq!(json["media_url"], "/media/film.mp4");
    assert_eq!(json["subtitle_url"], "/media/film.vtt");
    assert_eq!(json["has_subtitles"], true);
    assert!(lib.path().join("film.vtt").is_file());
}

#[tokio::test]
async fn play_video_without_sidecar() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let json = body_json(get(app, "/api/play/shows/ep1.mp4").await).await;
    assert_eq!(json["subtitle_url"], "");
    assert_eq!(json["has_subtitles"], false);
}

#[tokio::test]
async fn play_book() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let json = body_json(get(app, "/api/play/book.epub").await).await;
    assert_eq!(json["kind"], "book");
    assert_eq!(json["media_url"], "/media/book.epub");
    assert_eq!(json["has_subtitles"], false);
}

#[tokio::test]
async fn play_missing_or_unsupported_returns_404() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    assert_eq!(get(app.clone(), "/api/play/none.mp4").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(app, "/api/play/notes.txt").await.status(), StatusCode::NOT_FOUND);
}

// ── GET/HEAD /media/{*subpath} ────────────────────────────────────────────────

#[tokio::test]
async fn media_full_get() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let response = get(app, "/media/film.mp4").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    assert_eq!(response.headers()["accept-ranges"], "bytes");
    assert_eq!(response.headers()["content-length"], "10");
    assert_eq!(body_bytes(response).await, b"0123456789");
}

#[tokio::test]
async fn media_range_get_returns_206() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/film.mp4")
                .header("range", "bytes=2-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()["content-range"], "bytes 2-5/10");
    assert_eq!(response.headers()["content-length"], "4");
    assert_eq!(body_bytes(response).await, b"2345");
}

#[tokio::test]
async fn media_unsatisfiable_range_returns_416() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/film.mp4")
                .header("range", "bytes=50-60")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()["content-range"], "bytes */10");
}

#[tokio::test]
async fn media_head_has_headers_and_no_body() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    let response = app
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/media/book.epub")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/epub+zip");
    assert_eq!(response.headers()["content-length"], "4");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn media_missing_or_directory_returns_404() {
    let lib = library();
    let (app, _) = make_app(lib.path());
    assert_eq!(get(app.clone(), "/media/none.mp4").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(app.clone(), "/media/shows").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get(app, "/media/shows/../../../etc/passwd").await.status(),
        StatusCode::NOT_FOUND
    );
}
