use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::services::user_admin::{CreateUserRequest, DeleteMode, UpdateUserRequest};
use crate::utils::logging::*;
use crate::utils::AppResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    log_request_received("/api/admin/users", "POST");

    let user = state.user_admin().create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Usuário criado com sucesso",
            "user": user
        })),
    ))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/api/admin/users", "GET");

    let users = state.user_admin().list().await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users
    })))
}

/// PUT /api/admin/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<Value>> {
    log_request_received("/api/admin/users/:id", "PUT");

    let user = state.user_admin().update(id, req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Usuário atualizado com sucesso",
        "user": user
    })))
}

/// DELETE /api/admin/users/:id?hard=true|false (padrão: desativação)
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<Value>> {
    log_request_received("/api/admin/users/:id", "DELETE");

    let mode = if params.hard {
        DeleteMode::Hard
    } else {
        DeleteMode::Soft
    };
    let mode = state.user_admin().delete(actor.id, id, mode).await?;

    let message = match mode {
        DeleteMode::Soft => "Usuário desativado",
        DeleteMode::Hard => "Usuário excluído permanentemente",
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "mode": mode
    })))
}
