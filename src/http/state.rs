use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::LibraryConfig;
use crate::media::scanner::Reconciler;
use crate::subtitle::SubtitleResolver;

/// Shared application state injected into all route handlers via axum::extract::State.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LibraryConfig>,
    pub reconciler: Reconciler,
    pub subtitles: SubtitleResolver,
}

impl AppState {
    pub fn new(config: LibraryConfig, store: Arc<dyn CatalogStore>) -> Self {
        let config = Arc::new(config);
        Self {
            reconciler: Reconciler::new(Arc::clone(&config), store),
            subtitles: SubtitleResolver::new(Arc::clone(&config)),
            config,
        }
    }
}
