use axum::{extract::State, response::Json, Extension};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::SessionUser;
use crate::utils::logging::*;
use crate::utils::AppResult;
use crate::AppState;

/// GET /api/companies - admin: todas as ativas; demais: só a própria
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> AppResult<Json<Value>> {
    log_request_received("/api/companies", "GET");

    let companies = if user.is_admin() {
        state.companies.list(true).await?
    } else {
        state
            .companies
            .find_by_id(user.company_id)
            .await?
            .into_iter()
            .collect()
    };

    Ok(Json(json!({
        "success": true,
        "count": companies.len(),
        "data": companies
    })))
}
