/*
 * Responsibility
 * - Config 読み込み → RouteTable 組み立て → Router 構築
 * - Middleware の適用
 * - TcpListener の bind と axum::serve() で起動
 */
use std::net::SocketAddr;
use std::panic;

use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::ServerError;
use crate::middleware;
use crate::routing::{Route, RouteTable};

/// Everything the server needs, handed over at construction time.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub routes: Vec<Route>,
}

impl ServerConfig {
    pub fn new(addr: SocketAddr, routes: Vec<Route>) -> Self {
        Self { addr, routes }
    }
}

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing();
    init_panic_hook();

    let config = Config::from_env().map_err(ServerError::from)?;
    start(ServerConfig::new(config.addr, api::routes())).await?;

    Ok(())
}

pub async fn start(config: ServerConfig) -> Result<(), ServerError> {
    let router = build_router(config.routes)?;
    let listener = bind(config.addr).await?;

    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    tracing::info!(addr = %local_addr, "listening");

    serve(listener, router).await
}

/// Validates the routes and wraps the resulting router in HTTP middleware.
pub fn build_router(routes: Vec<Route>) -> Result<Router, ServerError> {
    let table = RouteTable::from_routes(routes)?;
    tracing::debug!(routes = table.len(), "route table built");

    Ok(middleware::http::apply(table.into_router()))
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Accepts connections on `listener` until the process exits.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    axum::serve(listener, router)
        .await
        .map_err(ServerError::Serve)
}
