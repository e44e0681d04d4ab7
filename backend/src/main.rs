use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::Method,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

mod lock;
mod rest;
mod store;

use lock::StoreLock;
use rest::AppState;
use store::SheetStore;

/// Runtime configuration, read from the environment with defaults suitable
/// for a local single-user deployment.
struct Config {
    addr: SocketAddr,
    data_dir: PathBuf,
    lock_wait: Duration,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let addr = std::env::var("MONEY_MANAGER_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()?;
        let data_dir = std::env::var("MONEY_MANAGER_DATA_DIR")
            .unwrap_or_else(|_| "data".to_string())
            .into();
        let lock_wait_ms = std::env::var("MONEY_MANAGER_LOCK_WAIT_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(10_000);
        Ok(Self {
            addr,
            data_dir,
            lock_wait: Duration::from_millis(lock_wait_ms),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Config::from_env()?;
    info!("Setting up sheet store in {:?}", config.data_dir);

    let store = SheetStore::new(&config.data_dir);
    store.ensure_sheets()?;
    let state = AppState::new(store, StoreLock::new(config.lock_wait));

    // The store is reachable from browsers anywhere, like the web-app
    // deployment it replaces.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(rest::handle_get).post(rest::handle_post))
        .layer(cors)
        .with_state(state);

    info!("Starting server on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Listening on {}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
