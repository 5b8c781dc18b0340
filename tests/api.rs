//! Testes de rota ponta a ponta com store, identidade e fonte em memória

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use tracking_dashboard::auth::{IdentityProvider, MemoryIdentityProvider};
use tracking_dashboard::config::Settings;
use tracking_dashboard::models::{NewCompany, RawExternalTask, Role, UserProfile};
use tracking_dashboard::routes::build_router;
use tracking_dashboard::services::task_source::TaskComment;
use tracking_dashboard::services::TaskSource;
use tracking_dashboard::store::{CompanyStore, MemoryStore, UserStore};
use tracking_dashboard::utils::{AppError, AppResult};
use tracking_dashboard::AppState;

#[derive(Clone, Copy)]
enum Mode {
    Healthy,
    Unconfigured,
    Down,
}

struct StaticSource {
    mode: Mode,
}

fn sample_tasks() -> Vec<RawExternalTask> {
    let mut first = RawExternalTask::new("1", "122º WCB").with_field("Navio", "MSC Aurora");
    first.modified_at = Some(Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap());
    vec![
        first,
        RawExternalTask::new("2", "17º AMZ (IMPORTAÇÃO)").with_field("Status", "Concluído"),
        RawExternalTask::new("3", "18º AMZ"),
        RawExternalTask::new("4", "reunião semanal"),
    ]
}

#[async_trait]
impl TaskSource for StaticSource {
    fn is_configured(&self) -> bool {
        !matches!(self.mode, Mode::Unconfigured)
    }

    async fn fetch_tasks(&self) -> AppResult<Vec<RawExternalTask>> {
        match self.mode {
            Mode::Healthy => Ok(sample_tasks()),
            Mode::Unconfigured => Err(AppError::NotConfigured("sem token".into())),
            Mode::Down => Err(AppError::Upstream("asana 503".into())),
        }
    }

    async fn fetch_comments(&self, task_id: &str) -> AppResult<Vec<TaskComment>> {
        Ok(vec![TaskComment {
            id: format!("story-{}", task_id),
            author: "Marcos".into(),
            text: "Documentos enviados".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap(),
        }])
    }

    async fn test_connection(&self) -> AppResult<()> {
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: MemoryStore,
    admin_id: Uuid,
    viewer_id: Uuid,
    wcb_id: Uuid,
}

async fn add_user(
    store: &MemoryStore,
    identity: &MemoryIdentityProvider,
    email: &str,
    role: Role,
    company_id: Uuid,
    active: bool,
    token: &str,
) -> Uuid {
    let id = identity.create_identity(email, "segredo1").await.unwrap();
    identity.issue_session(token, id).await;

    let now = Utc::now();
    store
        .insert_user(UserProfile {
            id,
            email: email.into(),
            full_name: email.into(),
            role,
            active,
            company_id,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    id
}

async fn app(mode: Mode) -> TestApp {
    let store = MemoryStore::new();
    let identity = MemoryIdentityProvider::new();

    let wcb = store
        .insert(NewCompany {
            name: "WCB".into(),
            display_name: "WCB".into(),
            slug: "wcb".into(),
        })
        .await
        .unwrap();
    let amz = store
        .insert(NewCompany {
            name: "AMZ".into(),
            display_name: "AMZ".into(),
            slug: "amz".into(),
        })
        .await
        .unwrap();

    let admin_id = add_user(&store, &identity, "admin@wcb.com", Role::Admin, wcb.id, true, "admin-token").await;
    let viewer_id = add_user(&store, &identity, "viewer@amz.com", Role::Viewer, amz.id, true, "viewer-token").await;
    add_user(&store, &identity, "old@amz.com", Role::Viewer, amz.id, false, "inactive-token").await;

    let state = AppState::new(
        Settings::default(),
        Arc::new(StaticSource { mode }),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(identity),
    );

    TestApp {
        router: build_router(Arc::new(state)),
        store,
        admin_id,
        viewer_id,
        wcb_id: wcb.id,
    }
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let app = app(Mode::Healthy).await;
    let (status, body) = call(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app.router, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = app(Mode::Healthy).await;
    let (status, body) = call(&app.router, Method::GET, "/api/asana/trackings", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = call(&app.router, Method::GET, "/api/asana/trackings", Some("forjado"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_account_is_told_to_sign_out() {
    let app = app(Mode::Healthy).await;
    let (status, body) =
        call(&app.router, Method::GET, "/api/auth/validate", Some("inactive-token"), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "ACCOUNT_INACTIVE");
    assert!(body["details"].as_str().unwrap().contains("desativada"));

    let (status, body) =
        call(&app.router, Method::GET, "/api/auth/validate", Some("viewer-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["state"], "valid");
}

#[tokio::test]
async fn viewer_only_sees_own_company() {
    let app = app(Mode::Healthy).await;
    let (status, body) = call(
        &app.router,
        Method::GET,
        "/api/asana/trackings?company=WCB",
        Some("viewer-token"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["meta"]["company"], "AMZ");
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["metrics"]["completed"], 1);
    assert_eq!(body["metrics"]["effectiveRate"], 50);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["companyName"] == "AMZ"));
}

#[tokio::test]
async fn admin_sees_everything_or_a_chosen_company() {
    let app = app(Mode::Healthy).await;

    let (_, all) = call(&app.router, Method::GET, "/api/asana/trackings", Some("admin-token"), None).await;
    assert_eq!(all["meta"]["company"], "all");
    assert_eq!(all["meta"]["total"], 3);
    assert_eq!(all["meta"]["unmatched"], 1);

    let (_, wcb) = call(
        &app.router,
        Method::GET,
        "/api/asana/trackings?company=wcb",
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(wcb["meta"]["total"], 1);
    assert_eq!(wcb["data"][0]["transport"]["vessel"], "MSC Aurora");

    let (status, _) = call(
        &app.router,
        Method::GET,
        "/api/asana/trackings?company=FANTASMA",
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let app = app(Mode::Healthy).await;

    let (status, body) =
        call(&app.router, Method::GET, "/api/asana/unmatched", Some("viewer-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) =
        call(&app.router, Method::GET, "/api/asana/unmatched", Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["sourceId"], "4");
}

#[tokio::test]
async fn unconfigured_source_is_a_hard_401() {
    let app = app(Mode::Unconfigured).await;
    let (status, body) =
        call(&app.router, Method::GET, "/api/asana/trackings", Some("admin-token"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "SOURCE_NOT_CONFIGURED");

    let (status, _) = call(&app.router, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn upstream_outage_is_a_soft_failure() {
    let app = app(Mode::Down).await;
    let (status, body) =
        call(&app.router, Method::GET, "/api/asana/trackings", Some("viewer-token"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["metrics"]["total"], 0);
}

#[tokio::test]
async fn sync_companies_then_status() {
    let app = app(Mode::Healthy).await;

    let (status, body) =
        call(&app.router, Method::POST, "/api/sync-companies", Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["created"], 0);
    assert_eq!(body["stats"]["updated"], 2);
    assert_eq!(body["skippedTasks"][0]["taskId"], "4");

    let (_, body) =
        call(&app.router, Method::GET, "/api/sync-companies", Some("admin-token"), None).await;
    assert_eq!(body["status"]["counts"]["active"], 2);
}

#[tokio::test]
async fn admin_user_lifecycle() {
    let app = app(Mode::Healthy).await;

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/admin/users",
        Some("admin-token"),
        Some(json!({
            "email": "nova@wcb.com",
            "password": "segredo1",
            "confirmPassword": "segredo1",
            "fullName": "Nova Pessoa",
            "role": "operator",
            "companyId": app.wcb_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let new_id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app.router,
        Method::POST,
        "/api/admin/users",
        Some("admin-token"),
        Some(json!({
            "email": "x@wcb.com",
            "password": "123",
            "confirmPassword": "123",
            "role": "viewer",
            "companyId": app.wcb_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("senha"));

    let (_, body) = call(&app.router, Method::GET, "/api/admin/users", Some("admin-token"), None).await;
    assert_eq!(body["count"], 4);

    let (status, body) = call(
        &app.router,
        Method::PUT,
        &format!("/api/admin/users/{}", new_id),
        Some("admin-token"),
        Some(json!({ "role": "manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "manager");

    let (status, _) = call(
        &app.router,
        Method::DELETE,
        &format!("/api/admin/users/{}", app.admin_id),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app.router,
        Method::DELETE,
        &format!("/api/admin/users/{}?hard=true", new_id),
        Some("admin-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "hard");

    let new_uuid: Uuid = new_id.parse().unwrap();
    assert!(app.store.find_user(new_uuid).await.unwrap().is_none());
}

#[tokio::test]
async fn notifications_respect_watermark() {
    let app = app(Mode::Healthy).await;
    let viewer = app.viewer_id.to_string();

    let (status, body) =
        call(&app.router, Method::GET, "/api/notifications", Some("viewer-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(body["unreadCount"], 2);

    let (status, _) = call(
        &app.router,
        Method::POST,
        "/api/notifications",
        Some("viewer-token"),
        Some(json!({ "userId": viewer, "timestamp": "2025-03-12T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) =
        call(&app.router, Method::GET, "/api/notifications", Some("viewer-token"), None).await;
    assert_eq!(body["unreadCount"], 0);

    // lastChecked do cliente vence a marca do servidor
    let (_, body) = call(
        &app.router,
        Method::GET,
        "/api/notifications?lastChecked=2025-03-01T00:00:00Z",
        Some("viewer-token"),
        None,
    )
    .await;
    assert_eq!(body["unreadCount"], 2);

    let (status, _) = call(
        &app.router,
        Method::POST,
        "/api/notifications",
        Some("viewer-token"),
        Some(json!({ "userId": app.admin_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn companies_endpoint_is_scoped() {
    let app = app(Mode::Healthy).await;

    let (_, body) = call(&app.router, Method::GET, "/api/companies", Some("admin-token"), None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = call(&app.router, Method::GET, "/api/companies", Some("viewer-token"), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "AMZ");

    let (_, body) =
        call(&app.router, Method::GET, "/api/asana/companies", Some("viewer-token"), None).await;
    assert_eq!(body["data"], json!(["AMZ"]));
}
