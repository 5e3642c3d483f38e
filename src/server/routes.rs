use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use super::dto::SessionSnapshot;
use super::logging::log_requests;
use super::session::SessionHandle;
use super::ws::ws_handler;

/// Shared per-request context; the session handle is clone-cheap but the
/// context travels as one extension.
#[derive(Clone)]
pub struct ServerContext {
    pub session: SessionHandle,
}

pub struct GameServer {
    router: Router,
}

impl GameServer {
    pub fn new(session: SessionHandle) -> Self {
        let context = Arc::new(ServerContext { session });

        let router = Router::new()
            .route("/ws", get(ws_handler))
            .route("/session/snapshot", get(get_snapshot))
            .route("/health", get(health))
            .layer(
                ServiceBuilder::new()
                    .layer(axum::middleware::from_fn(log_requests))
                    .layer(CorsLayer::permissive())
                    .layer(Extension(context)),
            );

        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Full read model for clients that poll or need a resync anchor.
async fn get_snapshot(Extension(ctx): Extension<Arc<ServerContext>>) -> Json<SessionSnapshot> {
    Json(ctx.session.snapshot())
}

async fn health() -> &'static str {
    "ok"
}
