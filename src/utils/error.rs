use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

use crate::store::StoreError;

#[derive(Debug)]
pub enum AppError {
    /// Credencial ausente ou placeholder (nunca repetido)
    NotConfigured(String),
    /// Falha transitória da API de origem já esgotadas as tentativas
    Upstream(String),
    Timeout(String),
    JsonError(serde_json::Error),
    ValidationError(String),
    Unauthorized(String),
    /// Conta inativa/removida: o cliente deve encerrar a sessão
    AccountInactive(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    DatabaseError(String),
    InternalError(String),
}

impl AppError {
    /// Código estável consumido pelo cliente (distingue erros de config, conta, rede)
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotConfigured(_) => "SOURCE_NOT_CONFIGURED",
            AppError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::JsonError(_) => "INVALID_JSON",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::AccountInactive(_) => "ACCOUNT_INACTIVE",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConfigured(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::JsonError(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive(_) => StatusCode::FORBIDDEN,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Erros de leitura que a UI mostra como "sem dados" em vez de falhar a página
    pub fn is_soft(&self) -> bool {
        matches!(self, AppError::Upstream(_) | AppError::Timeout(_))
    }

    /// Mensagem legível (vai no campo `details` da resposta)
    pub fn details(&self) -> String {
        match self {
            AppError::JsonError(err) => err.to_string(),
            AppError::NotConfigured(msg)
            | AppError::Upstream(msg)
            | AppError::Timeout(msg)
            | AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::AccountInactive(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::DatabaseError(msg)
            | AppError::InternalError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotConfigured(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::AccountInactive(msg) => write!(f, "Account inactive: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<asana::AsanaError> for AppError {
    fn from(err: asana::AsanaError) -> Self {
        use asana::AsanaError;

        match err {
            AsanaError::ConfigError(msg) => AppError::NotConfigured(msg),
            AsanaError::AuthError(msg) => {
                AppError::NotConfigured(format!("Token do Asana recusado: {}", msg))
            }
            AsanaError::NotFound(msg) => AppError::NotFound(msg),
            AsanaError::Timeout(msg) => AppError::Timeout(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::UniqueViolation(msg) => AppError::Conflict(msg),
            StoreError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = json!({
            "success": false,
            "error": self.code(),
            "details": self.details(),
            "code": self.code(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
