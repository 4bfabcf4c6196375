//! Bingo Back binary entrypoint wiring REST, WebSocket, SSE and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bingo_back::{
    config::{AppConfig, StorageConfig},
    dao::{
        board_store::{BoardStore, memory::MemoryBoardStore},
        storage::StorageError,
    },
    routes,
    services::{provisioner, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config.clone());

    // The memory backend is created once so reconnects keep its contents.
    let memory = MemoryBoardStore::new();
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        connect_store(config.clone(), memory.clone())
    }));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the configured backend and make sure the phrase pool is seeded.
async fn connect_store(
    config: AppConfig,
    memory: MemoryBoardStore,
) -> Result<Arc<dyn BoardStore>, StorageError> {
    let store: Arc<dyn BoardStore> = match config.storage() {
        #[cfg(feature = "sqlite-store")]
        StorageConfig::Sqlite {
            url,
            max_connections,
        } => {
            use bingo_back::dao::board_store::sqlite::{SqliteBoardStore, SqliteConfig};

            let sqlite_config = SqliteConfig::from_url(url, *max_connections)?;
            Arc::new(SqliteBoardStore::connect(sqlite_config).await?)
        }
        #[cfg(not(feature = "sqlite-store"))]
        StorageConfig::Sqlite { .. } => {
            tracing::warn!("built without sqlite-store; falling back to memory storage");
            Arc::new(memory)
        }
        StorageConfig::Memory => Arc::new(memory),
    };

    provisioner::seed_phrase_pool(store.as_ref(), config.phrases()).await?;
    Ok(store)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
