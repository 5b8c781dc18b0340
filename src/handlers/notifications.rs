use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{resolve_scope, SessionUser};
use crate::services::TrackingQuery;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationParams {
    pub user_id: Option<String>,
    pub company: Option<String>,
    /// Marca de leitura mantida pelo cliente (RFC 3339)
    pub last_checked: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Não-admin só lê/grava a própria marca
fn target_user(user: &SessionUser, requested: Option<&str>) -> AppResult<String> {
    let own = user.id.to_string();
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(own),
        Some(id) if id == own || user.is_admin() => Ok(id.to_string()),
        Some(_) => {
            log_access_denied(&user.email, "marca de leitura de outro usuário");
            Err(AppError::Forbidden(
                "Você só pode consultar as suas notificações".to_string(),
            ))
        }
    }
}

fn parse_last_checked(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log_warning(&format!("⚠️ lastChecked ignorado ('{}'): {}", raw, e));
            None
        }
    }
}

/// GET /api/notifications?userId&company&lastChecked
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<NotificationParams>,
) -> AppResult<Response> {
    log_request_received("/api/notifications", "GET");

    let user_id = target_user(&user, params.user_id.as_deref())?;
    let scope = resolve_scope(&user, params.company.as_deref(), state.companies.as_ref()).await?;

    // Parâmetro do cliente vence a marca guardada no servidor
    let watermark = match parse_last_checked(params.last_checked.as_deref()) {
        Some(ts) => Some(ts),
        None => state.watermarks.get(&user_id).await,
    };

    let trackings = match state.trackings().load(&TrackingQuery::default(), &scope).await {
        Ok(response) => response.data,
        Err(e) if e.is_soft() => {
            log_warning(&format!("⚠️ Notificações indisponíveis: {}", e));
            return Ok(Json(json!({
                "success": false,
                "error": e.code(),
                "details": e.details(),
                "notifications": [],
                "unreadCount": 0,
                "lastChecked": watermark
            }))
            .into_response());
        }
        Err(e) => return Err(e),
    };

    let feed = state.notifications().feed(&trackings, watermark).await;
    Ok(Json(feed).into_response())
}

/// POST /api/notifications { userId, timestamp? }: grava a marca de leitura
pub async fn mark_notifications_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<Json<serde_json::Value>> {
    log_request_received("/api/notifications", "POST");

    let user_id = target_user(&user, Some(&req.user_id))?;
    let timestamp = req.timestamp.unwrap_or_else(Utc::now);
    state.watermarks.set(&user_id, timestamp).await;

    Ok(Json(json!({
        "success": true,
        "userId": user_id,
        "lastChecked": timestamp
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use uuid::Uuid;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "ana@wcb.com".into(),
            full_name: "Ana".into(),
            role,
            company_id: Uuid::new_v4(),
            company_name: "WCB".into(),
        }
    }

    #[test]
    fn test_target_user() {
        let viewer = user(Role::Viewer);
        let own = viewer.id.to_string();

        assert_eq!(target_user(&viewer, None).unwrap(), own);
        assert_eq!(target_user(&viewer, Some(&own)).unwrap(), own);
        assert!(matches!(target_user(&viewer, Some("outro")), Err(AppError::Forbidden(_))));
        assert_eq!(target_user(&user(Role::Admin), Some("outro")).unwrap(), "outro");
    }

    #[test]
    fn test_parse_last_checked() {
        assert!(parse_last_checked(Some("2025-03-10T09:00:00Z")).is_some());
        assert!(parse_last_checked(Some("ontem")).is_none());
        assert!(parse_last_checked(Some("")).is_none());
    }
}
