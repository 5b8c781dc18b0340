use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

use crate::auth::{resolve_scope, SessionUser};
use crate::models::TrackingMetrics;
use crate::services::TrackingQuery;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

/// Falha transitória da fonte: 200 com lista vazia para a UI mostrar "sem dados"
fn soft_failure(err: &AppError) -> Response {
    log_warning(&format!("⚠️ Leitura degradada: {}", err));
    Json(json!({
        "success": false,
        "error": err.code(),
        "details": err.details(),
        "data": [],
        "metrics": TrackingMetrics::default()
    }))
    .into_response()
}

/// GET /api/asana/trackings?company&status&refresh
pub async fn list_trackings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<TrackingQuery>,
) -> AppResult<Response> {
    let start_time = Instant::now();
    log_request_received("/api/asana/trackings", "GET");

    let scope = resolve_scope(&user, query.company.as_deref(), state.companies.as_ref()).await?;

    match state.trackings().load(&query, &scope).await {
        Ok(response) => {
            log_request_processed(
                "/api/asana/trackings",
                200,
                start_time.elapsed().as_millis() as u64,
            );
            Ok(Json(response).into_response())
        }
        Err(e) if e.is_soft() => Ok(soft_failure(&e)),
        Err(e) => Err(e),
    }
}

/// GET /api/asana/unmatched (admin): títulos sem empresa atribuível
pub async fn list_unmatched(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    log_request_received("/api/asana/unmatched", "GET");

    match state.trackings().unmatched().await {
        Ok(records) => Ok(Json(json!({
            "success": true,
            "count": records.len(),
            "data": records
        }))
        .into_response()),
        Err(e) if e.is_soft() => Ok(soft_failure(&e)),
        Err(e) => Err(e),
    }
}

/// GET /api/asana/companies: empresas derivadas dos títulos (sem persistência)
pub async fn list_title_companies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> AppResult<Response> {
    log_request_received("/api/asana/companies", "GET");

    let names = match state.trackings().company_names().await {
        Ok(names) => names,
        Err(e) if e.is_soft() => return Ok(soft_failure(&e)),
        Err(e) => return Err(e),
    };

    let visible: Vec<String> = if user.is_admin() {
        names
    } else {
        names
            .into_iter()
            .filter(|n| crate::utils::normalization::same_company(n, &user.company_name))
            .collect()
    };

    Ok(Json(json!({
        "success": true,
        "count": visible.len(),
        "data": visible
    }))
    .into_response())
}
