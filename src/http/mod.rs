pub mod browse;
pub mod media;
pub mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let media_route = format!("{}/{{*subpath}}", state.config.media_url_prefix);
    Router::new()
        .route("/api/browse", get(browse::browse_root))
        .route("/api/browse/{*subpath}", get(browse::browse_dir))
        .route("/api/play/{*subpath}", get(browse::play))
        .route(&media_route, get(media::serve_media_get).head(media::serve_media_head))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
