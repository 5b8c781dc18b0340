//! Cliente HTTP para a API do Asana

use crate::error::{AsanaError, Result};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";
const MAX_BACKOFF_MS: u64 = 30_000;

/// Política de retry para leituras idempotentes
///
/// O atraso entre tentativas dobra a cada falha: `initial_backoff_ms`,
/// `2 * initial_backoff_ms`, `4 * initial_backoff_ms`, ... (limitado a 30s).
/// Para respostas 429 com `Retry-After`, o valor do header prevalece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Atraso antes da próxima tentativa (`attempt` começa em 1)
    pub fn delay_for(&self, attempt: u32, error: &AsanaError) -> Duration {
        if let AsanaError::RateLimited {
            retry_after_secs: Some(secs),
        } = error
        {
            return Duration::from_millis((secs * 1000).min(MAX_BACKOFF_MS));
        }

        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
    }
}

/// Cliente para interagir com a API do Asana
///
/// Autenticação via Personal Access Token (header `Authorization: Bearer`).
#[derive(Clone)]
pub struct AsanaClient {
    http_client: HttpClient,
    access_token: String,
    base_url: String,
    retry: RetryPolicy,
}

impl AsanaClient {
    /// Cria um novo cliente Asana
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(access_token, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        access_token: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AsanaError::ConfigError(
                "Asana access token vazio".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| AsanaError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Aponta o cliente para outra base URL (proxy, mock de testes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Substitui a política de retry
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Executa um GET único (sem retry)
    async fn get_once(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AsanaError::Timeout(format!("GET {}", endpoint))
                } else {
                    AsanaError::HttpError(e)
                }
            })?;

        self.handle_response(response).await
    }

    /// Executa um GET com retry/backoff e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let mut attempt = 1;

        loop {
            match self.get_once(endpoint).await {
                Ok(response) => {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str(&body)?);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt, &e);
                    tracing::warn!(
                        "⚠️ Tentativa {}/{} falhou em GET {}: {}. Retry em {}ms...",
                        attempt,
                        self.retry.max_attempts,
                        endpoint,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after_secs = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Asana API error ({}): {}", status_code, error_body);

        let message = extract_error_message(&error_body);

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => AsanaError::RateLimited { retry_after_secs },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AsanaError::AuthError(message),
            StatusCode::NOT_FOUND => AsanaError::NotFound(message),
            _ => AsanaError::ApiError {
                status: status_code,
                message,
            },
        })
    }

    /// Obtém a URL base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Política de retry em uso
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

/// O Asana responde erros como `{"errors": [{"message": "..."}]}`
fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("errors")
            .and_then(|v| v.as_array())
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("message"))
            .or_else(|| json.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fast_client(server: &MockServer) -> AsanaClient {
        AsanaClient::new("test-token")
            .unwrap()
            .with_base_url(server.base_url())
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                initial_backoff_ms: 1,
            })
    }

    #[test]
    fn test_client_creation() {
        let client = AsanaClient::new("test-token").unwrap();
        assert_eq!(client.base_url(), "https://app.asana.com/api/1.0");
        assert_eq!(client.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            AsanaClient::new("  "),
            Err(AsanaError::ConfigError(_))
        ));
    }

    #[test]
    fn test_backoff_doubles_and_honors_retry_after() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff_ms: 100,
        };
        let transient = AsanaError::Timeout("x".into());
        assert_eq!(policy.delay_for(1, &transient), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2, &transient), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3, &transient), Duration::from_millis(400));

        let limited = AsanaError::RateLimited {
            retry_after_secs: Some(2),
        };
        assert_eq!(policy.delay_for(1, &limited), Duration::from_secs(2));
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"errors":[{"message":"project: Not a recognized ID"}]}"#;
        assert_eq!(extract_error_message(body), "project: Not a recognized ID");
        assert_eq!(extract_error_message("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users/me")
                    .header("Authorization", "Bearer test-token");
                then.status(200).json_body(json!({"data": {"gid": "1", "name": "Ops"}}));
            })
            .await;

        let client = fast_client(&server);
        let value: Value = client.get_json("/users/me").await.unwrap();

        mock.assert_async().await;
        assert_eq!(value["data"]["name"], "Ops");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_until_attempts_exhausted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/users/me");
                then.status(429)
                    .json_body(json!({"errors": [{"message": "Too many requests"}]}));
            })
            .await;

        let client = fast_client(&server);
        let result: Result<Value> = client.get_json("/users/me").await;

        assert!(matches!(result, Err(AsanaError::RateLimited { .. })));
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/404");
                then.status(404)
                    .json_body(json!({"errors": [{"message": "task: Unknown object"}]}));
            })
            .await;

        let client = fast_client(&server);
        let result: Result<Value> = client.get_json("/tasks/404").await;

        match result {
            Err(AsanaError::NotFound(msg)) => assert_eq!(msg, "task: Unknown object"),
            other => panic!("esperado NotFound, obtido {:?}", other.map(|_| ())),
        }
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/me");
                then.status(401)
                    .json_body(json!({"errors": [{"message": "Not Authorized"}]}));
            })
            .await;

        let client = fast_client(&server);
        let result: Result<Value> = client.get_json("/users/me").await;
        assert!(matches!(result, Err(AsanaError::AuthError(_))));
    }
}
