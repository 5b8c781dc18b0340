//! Tipos de erro para o crate asana

use thiserror::Error;

/// Erros do cliente Asana
#[derive(Debug, Error)]
pub enum AsanaError {
    /// Erro de requisição HTTP (conexão, DNS, corpo inválido)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API do Asana (status code não-2xx)
    #[error("Asana API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Rate limit (429) esgotado após todas as tentativas
    #[error("Rate limited by Asana API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Token ausente, inválido ou sem permissão (401/403)
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Recurso não encontrado (projeto, tarefa)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout de operação
    #[error("Operation timeout: {0}")]
    Timeout(String),
}

impl AsanaError {
    /// Indica se vale a pena repetir a requisição (somente leituras idempotentes)
    pub fn is_transient(&self) -> bool {
        match self {
            AsanaError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AsanaError::ApiError { status, .. } => *status >= 500,
            AsanaError::RateLimited { .. } | AsanaError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, AsanaError>;
