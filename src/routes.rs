//! Montagem do router
//!
//! - públicas: `/health`, `/ready`, `/status`
//! - sessão: leitura do dashboard, notificações, empresas, validação de conta
//! - admin (sessão + perfil admin): diagnóstico, sincronização, usuários

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::middleware::{require_admin, require_session};
use crate::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/api/asana/unmatched", get(list_unmatched))
        .route("/api/sync-companies", get(sync_status).post(sync_companies))
        .route("/api/admin/users", get(list_users).post(create_user))
        .route("/api/admin/users/:id", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(require_admin));

    let session_routes = Router::new()
        .route("/api/asana/trackings", get(list_trackings))
        .route("/api/asana/companies", get(list_title_companies))
        .route(
            "/api/notifications",
            get(list_notifications).post(mark_notifications_read),
        )
        .route("/api/companies", get(list_companies))
        .route("/api/auth/validate", get(validate_account))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health checks (públicos)
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))
        .merge(session_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
