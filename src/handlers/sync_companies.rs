use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;

use crate::utils::logging::*;
use crate::utils::AppResult;
use crate::AppState;

/// POST /api/sync-companies - Recria o conjunto de empresas ativas a partir do Asana
pub async fn sync_companies(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let start_time = Instant::now();
    log_request_received("/api/sync-companies", "POST");
    tracing::info!("🔄 Iniciando sincronização de empresas...");

    let report = state.company_sync().run().await?;

    log_request_processed(
        "/api/sync-companies",
        200,
        start_time.elapsed().as_millis() as u64,
    );
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Sincronização concluída: {} empresas criadas, {} reativadas",
            report.stats.created, report.stats.updated
        ),
        "stats": report.stats,
        "companies": report.companies,
        "errorDetails": report.error_details,
        "skippedTasks": report.skipped_tasks
    })))
}

/// GET /api/sync-companies - Situação persistida, sem varredura
pub async fn sync_status(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/api/sync-companies", "GET");

    let status = state.company_sync().status().await?;
    Ok(Json(json!({
        "success": true,
        "status": status
    })))
}
