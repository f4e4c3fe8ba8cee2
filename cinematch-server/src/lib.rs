mod config;
mod context;
mod docs;
mod errors;
mod movies;
mod rooms;
mod schemas;
mod serialized;
mod session;
mod sse;
mod votes;

use std::net::{Ipv6Addr, SocketAddr};

use axum::{
    http::{header, Method},
    routing::get,
    Json,
};
use log::{error, info};
use serde::Serialize;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use utoipa::ToSchema;

pub use config::*;
pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};
pub use session::SESSION_COOKIE;
pub use sse::{spawn_event_forwarder, ServerEvent, ServerSentEvents};

pub type Router = axum::Router<ServerContext>;

/// Builds the HTTP application with every route mounted
pub fn app(context: ServerContext, config: &ServerConfig) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(config.allowed_origins.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let version_one_router = Router::new()
        .nest("/rooms", rooms::router())
        .nest("/movies", movies::router())
        .nest("/votes", votes::router());

    Router::new()
        .nest("/api/v1", version_one_router)
        .route("/health", get(health))
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the cinematch server, returning once it shut down gracefully
pub async fn run_server(context: ServerContext, config: &ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);

    axum::serve(listener, app(context, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Could not listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, body = Health))
)]
pub(crate) async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
