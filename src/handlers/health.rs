use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "tracking-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Pronto quando o banco responde e a fonte de tarefas está configurada
pub async fn ready_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    log_integration_status_check();

    let database_status = match state.companies.ping().await {
        Ok(_) => "connected",
        Err(e) => {
            log_error(&format!("❌ Banco indisponível: {}", e));
            "disconnected"
        }
    };
    let source_status = if state.source.is_configured() {
        "configured"
    } else {
        "not_configured"
    };

    let overall_ready = database_status == "connected" && source_status == "configured";

    let response = json!({
        "ready": overall_ready,
        "service": "tracking-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "database": { "status": database_status },
            "asana": { "status": source_status }
        }
    });

    let status = if overall_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Resumo das integrações (sem segredos)
pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_integration_status_check();

    let settings = &state.settings;

    let mut asana_info = json!({
        "configured": state.source.is_configured(),
        "token_configured": settings.asana.token().is_some(),
        "projects": settings.asana.project_ids().len(),
        "max_pages": settings.asana.max_pages
    });
    if state.source.is_configured() {
        match state.source.test_connection().await {
            Ok(_) => asana_info["connection"] = json!("success"),
            Err(e) => {
                asana_info["connection"] = json!("failed");
                asana_info["error"] = json!(e.code());
            }
        }
    } else {
        asana_info["connection"] = json!("not_configured");
    }

    let cache = state.cache.stats().await;
    let uptime = (chrono::Utc::now() - state.started_at).num_seconds();

    Json(json!({
        "service": "tracking-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": uptime,
        "environment": settings.app.environment,
        "integrations": {
            "asana": asana_info,
            "database": {
                "configured": settings.database.url().is_some()
            },
            "auth": {
                "configured": settings.auth.url().is_some() && settings.auth.anon_key().is_some(),
                "admin_key_configured": settings.auth.service_role_key().is_some()
            }
        },
        "cache": {
            "entries": cache.entries,
            "hits": cache.hits,
            "misses": cache.misses,
            "ttl_secs": settings.cache.ttl_secs
        }
    }))
}
