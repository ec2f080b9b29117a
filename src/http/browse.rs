use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::state::AppState;
use crate::media::library::MediaItem;
use crate::media::mime::{classify, MediaKind};
use crate::media::paths::{file_name, parent_subpath, resolve_under, strip_extension};
use crate::media::scanner::ScanError;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    /// Keep only `.mp4` items (the formats every browser plays natively).
    #[serde(default)]
    pub mp4_only: bool,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub subpath: String,
    /// Subpath for the "back" link; `""` is the library root.
    pub parent: String,
    pub folders: Vec<String>,
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub name: String,
    pub kind: MediaKind,
    pub media_url: String,
    pub subtitle_url: String,
    pub has_subtitles: bool,
}

/// GET /api/browse
pub async fn browse_root(state: State<AppState>, query: Query<BrowseQuery>) -> Response {
    browse(state, String::new(), query).await
}

/// GET /api/browse/{*subpath}
pub async fn browse_dir(
    state: State<AppState>,
    Path(subpath): Path<String>,
    query: Query<BrowseQuery>,
) -> Response {
    browse(state, subpath, query).await
}

async fn browse(
    State(state): State<AppState>,
    subpath: String,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let subpath = subpath.trim_matches('/').to_string();
    let reconciler = state.reconciler.clone();
    let dir = subpath.clone();
    // Directory listing and catalog round trips are blocking I/O
    let view = match tokio::task::spawn_blocking(move || reconciler.browse(&dir)).await {
        Ok(Ok(view)) => view,
        Ok(Err(ScanError::NotFound(_))) => {
            return (StatusCode::NOT_FOUND, "Folder not found").into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Browse {:?} failed: {}", subpath, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Err(e) => {
            tracing::error!("Browse task for {:?} panicked: {}", subpath, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut media = view.media;
    if query.mp4_only {
        media.retain(|m| m.filename.to_ascii_lowercase().ends_with(".mp4"));
    }

    Json(BrowseResponse {
        parent: parent_subpath(&subpath).to_string(),
        subpath,
        folders: view.folders,
        media,
    })
    .into_response()
}

/// GET /api/play/{*subpath} — player data for a video or book.
pub async fn play(State(state): State<AppState>, Path(subpath): Path<String>) -> Response {
    let subpath = subpath.trim_matches('/').to_string();
    let Some(path) = resolve_under(&state.config.root, &subpath) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !path.is_file() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let kind = match classify(file_name(&subpath), &state.config.extensions) {
        Some(k @ (MediaKind::Video | MediaKind::Book)) => k,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let media_url = state.config.media_url(&subpath);
    let name = strip_extension(&subpath).to_string();

    let subtitles = if kind == MediaKind::Video {
        let resolver = state.subtitles.clone();
        let target = subpath.clone();
        match tokio::task::spawn_blocking(move || resolver.resolve(&target)).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!("Subtitle task for {:?} panicked: {}", subpath, e);
                crate::subtitle::SubtitleResolution::unavailable()
            }
        }
    } else {
        crate::subtitle::SubtitleResolution::unavailable()
    };

    Json(PlayResponse {
        name,
        kind,
        media_url,
        subtitle_url: subtitles.url,
        has_subtitles: subtitles.available,
    })
    .into_response()
}
