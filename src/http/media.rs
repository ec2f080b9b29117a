use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use http_range_header::parse_range_header;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use crate::http::state::AppState;
use crate::media::mime::content_type;
use crate::media::paths::resolve_under;

/// A library file resolved from a request subpath.
struct ServedFile {
    path: PathBuf,
    size: u64,
    mime: &'static str,
}

/// Map the request subpath to a regular file under the library root.
/// Returns None for traversal attempts, directories and missing files.
async fn lookup_file(state: &AppState, subpath: &str) -> Option<ServedFile> {
    let path = resolve_under(&state.config.root, subpath)?;
    let meta = tokio::fs::metadata(&path).await.ok()?;
    if !meta.is_file() {
        return None;
    }
    Some(ServedFile {
        mime: content_type(&path),
        size: meta.len(),
        path,
    })
}

/// Headers present on every media response (GET + HEAD).
fn file_headers(file: &ServedFile) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static(file.mime),
    );
    headers.insert(
        axum::http::header::CONTENT_LENGTH,
        HeaderValue::from(file.size),
    );
    headers.insert(
        axum::http::header::ACCEPT_RANGES,
        HeaderValue::from_static("bytes"),
    );
    headers
}

fn unsatisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [("content-range", format!("bytes */{}", size))],
    )
        .into_response()
}

/// HEAD /media/{*subpath} — headers only, the file is not opened.
pub async fn serve_media_head(
    State(state): State<AppState>,
    Path(subpath): Path<String>,
) -> Response {
    match lookup_file(&state, &subpath).await {
        Some(file) => (StatusCode::OK, file_headers(&file)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /media/{*subpath} — stream the full file or one byte range (RFC 7233).
pub async fn serve_media_get(
    State(state): State<AppState>,
    Path(subpath): Path<String>,
    req_headers: HeaderMap,
) -> Response {
    let Some(file) = lookup_file(&state, &subpath).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let headers = file_headers(&file);

    if let Some(range_val) = req_headers.get(axum::http::header::RANGE) {
        let Ok(range_str) = range_val.to_str() else {
            return unsatisfiable(file.size);
        };
        return range_response(&file, range_str, headers).await;
    }

    let handle = match tokio::fs::File::open(&file.path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to open file {}: {}", file.path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let body = Body::from_stream(ReaderStream::new(handle));
    (StatusCode::OK, headers, body).into_response()
}

/// 206 Partial Content for the first satisfiable range, 416 otherwise.
/// Multi-range requests are answered with their first range only.
async fn range_response(file: &ServedFile, range_str: &str, mut headers: HeaderMap) -> Response {
    let Ok(parsed) = parse_range_header(range_str) else {
        return unsatisfiable(file.size);
    };
    let Ok(ranges) = parsed.validate(file.size) else {
        return unsatisfiable(file.size);
    };
    let Some(first) = ranges.into_iter().next() else {
        return unsatisfiable(file.size);
    };

    let start = *first.start();
    let end = *first.end(); // inclusive
    let length = end - start + 1;

    let mut handle = match tokio::fs::File::open(&file.path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Range response: failed to open file {}: {}", file.path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let Err(e) = handle.seek(std::io::SeekFrom::Start(start)).await {
        tracing::error!("Range response: failed to seek in file {}: {}", file.path.display(), e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let content_range = format!("bytes {}-{}/{}", start, end, file.size);
    headers.insert(
        axum::http::header::CONTENT_RANGE,
        HeaderValue::from_str(&content_range)
            .unwrap_or_else(|_| HeaderValue::from_static("bytes 0-0/0")),
    );
    headers.insert(
        axum::http::header::CONTENT_LENGTH,
        HeaderValue::from(length),
    );

    let body = Body::from_stream(ReaderStream::new(handle.take(length)));
    (StatusCode::PARTIAL_CONTENT, headers, body).into_response()
}
