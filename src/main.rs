use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;

use mediashelf::catalog::{CatalogStore, MemoryCatalog, SqliteCatalog};
use mediashelf::{cli, config, http};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\nmediashelf: forced exit");
        std::process::exit(1);
    }
}

/// `:memory:` selects the non-persistent catalog; anything else is a SQLite file.
fn open_catalog(database: &Path) -> Result<Arc<dyn CatalogStore>, mediashelf::catalog::CatalogError> {
    if database.as_os_str() == ":memory:" {
        return Ok(Arc::new(MemoryCatalog::new()));
    }
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Cannot create {}: {}", parent.display(), e);
        }
    }
    Ok(Arc::new(SqliteCatalog::open(database)?))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref())
        .and_then(|path| {
            match config::load_config(&path) {
                Ok(cfg) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    None
                }
            }
        });

    let config = config::Config::resolve(file_config, &args);

    let root = &config.library.root;
    if !root.exists() {
        eprintln!("error: path does not exist: {}", root.display());
        std::process::exit(1);
    }
    if !root.is_dir() {
        eprintln!("error: not a directory: {}", root.display());
        std::process::exit(1);
    }

    let store = open_catalog(&config.database).unwrap_or_else(|e| {
        eprintln!("error: cannot open catalog {}: {}", config.database.display(), e);
        std::process::exit(1);
    });

    tracing::info!(
        "mediashelf serving {} (catalog: {})",
        root.display(),
        config.database.display()
    );

    let state = http::state::AppState::new(config.library.clone(), store);

    if config.scan_on_start {
        let reconciler = state.reconciler.clone();
        match tokio::task::spawn_blocking(move || reconciler.sweep()).await {
            Ok(stats) if stats.failed > 0 => {
                tracing::warn!("{} directories could not be reconciled", stats.failed)
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Startup sweep panicked: {}", e),
        }
    }

    let app = http::build_router(state);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            wait_for_shutdown().await;
            tracing::info!("Shutting down, draining requests...");
            // a second Ctrl+C while draining exits immediately
            tokio::spawn(wait_for_shutdown());
        })
        .await
        .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));

    tracing::info!("Goodbye.");
}
