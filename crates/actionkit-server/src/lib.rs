//! HTTP endpoints for actionkit.
//!
//! Routes:
//! - `POST {routes.execute}` - dispatch an action token
//! - `GET {routes.export}?token=` - download through a registered exporter
//! - `POST {routes.import}` - multipart upload to a registered importer
//! - `GET /components/{component}/actions?record=` - render a component's actions
//!
//! Sessions are in memory and keyed by the `actionkit_session` cookie.
//! Users authenticate with `Authorization: Bearer <token>`.

pub mod demo;
pub mod error;
mod handlers;
mod response;
mod state;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{ServerError, ServerResult};
pub use state::{AppState, INERTIA_HEADER, PANEL_HEADER, SESSION_COOKIE};

/// Build the router over the configured routes.
pub fn router(state: AppState) -> Router {
    let routes = state.services().config().routes.clone();
    Router::new()
        .route(&routes.execute, post(handlers::execute))
        .route(&routes.export, get(handlers::export))
        .route(&routes.import, post(handlers::import))
        .route("/components/:component/actions", get(handlers::component_actions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until the process stops.
pub async fn serve(state: AppState) -> ServerResult<()> {
    let bind = state.services().config().server.bind.clone();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| ServerError::InvalidAddress(bind.clone()))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
