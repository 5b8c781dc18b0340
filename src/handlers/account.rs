use axum::{response::Json, Extension};
use serde_json::{json, Value};

use crate::auth::{SessionUser, ValidityState};
use crate::utils::logging::*;

/// GET /api/auth/validate - Conta ainda ativa?
///
/// Sessão inválida ou conta inativa já são barradas pelo middleware
/// (401 / 403 ACCOUNT_INACTIVE); aqui só chega uma conta válida.
pub async fn validate_account(Extension(user): Extension<SessionUser>) -> Json<Value> {
    log_request_received("/api/auth/validate", "GET");

    Json(json!({
        "valid": true,
        "state": ValidityState::Valid.as_str(),
        "message": "Conta ativa",
        "user": user
    }))
}
