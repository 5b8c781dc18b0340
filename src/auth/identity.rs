//! Provedor de identidade (servidor de autenticação estilo Supabase/GoTrue)
//!
//! A verificação de tokens usa a chave restrita (anon); o provisionamento e a
//! remoção de identidades usam a chave administrativa (service role).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::settings::AuthSettings;
use crate::utils::logging::{log_error, log_info, log_warning};
use crate::utils::{AppError, AppResult};

/// Identidade autenticada (id compartilhado com o perfil)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    #[serde(default)]
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Token de sessão → identidade; token inválido/expirado → `Unauthorized`
    async fn verify_token(&self, token: &str) -> AppResult<AuthIdentity>;

    /// Cria a identidade (e-mail já confirmado) e retorna seu id
    async fn create_identity(&self, email: &str, password: &str) -> AppResult<Uuid>;

    async fn delete_identity(&self, id: Uuid) -> AppResult<()>;
}

/// Cliente HTTP do servidor de autenticação
pub struct HttpIdentityProvider {
    http_client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: Uuid,
}

impl HttpIdentityProvider {
    /// `None` quando URL ou chave anon faltam (ou são placeholders)
    pub fn from_settings(settings: &AuthSettings) -> Option<Self> {
        let base_url = settings.url()?.trim_end_matches('/').to_string();
        let anon_key = settings.anon_key()?.to_string();

        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;

        Some(Self {
            http_client,
            base_url,
            anon_key,
            service_role_key: settings.service_role_key().map(str::to_string),
        })
    }

    fn service_key(&self) -> AppResult<&str> {
        self.service_role_key.as_deref().ok_or_else(|| {
            AppError::InternalError(
                "Chave administrativa do servidor de autenticação não configurada".to_string(),
            )
        })
    }

    fn unreachable(e: reqwest::Error) -> AppError {
        log_error(&format!("❌ Servidor de autenticação inacessível: {}", e));
        if e.is_timeout() {
            AppError::Timeout("Servidor de autenticação não respondeu".to_string())
        } else {
            AppError::Upstream(format!("Falha ao conectar com o servidor de autenticação: {}", e))
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> AppResult<AuthIdentity> {
        let response = self
            .http_client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Unauthorized("Sessão inválida ou expirada".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Verificação de sessão falhou [{}]: {}",
                status, body
            )));
        }

        response
            .json::<AuthIdentity>()
            .await
            .map_err(|e| AppError::Upstream(format!("Resposta de sessão inválida: {}", e)))
    }

    async fn create_identity(&self, email: &str, password: &str) -> AppResult<Uuid> {
        let key = self.service_key()?;
        let response = self
            .http_client
            .post(format!("{}/auth/v1/admin/users", self.base_url))
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true
            }))
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log_warning(&format!("⚠️ Criação de identidade recusada [{}]: {}", status, body));

            let lowered = body.to_lowercase();
            if status == StatusCode::UNPROCESSABLE_ENTITY
                || lowered.contains("already")
                || lowered.contains("exists")
            {
                return Err(AppError::Conflict("Já existe um usuário com este e-mail".to_string()));
            }
            return Err(AppError::Upstream(format!(
                "Servidor de autenticação recusou a criação [{}]",
                status
            )));
        }

        let created: CreatedUser = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Resposta de criação inválida: {}", e)))?;

        log_info(&format!("👤 Identidade criada: {}", created.id));
        Ok(created.id)
    }

    async fn delete_identity(&self, id: Uuid) -> AppResult<()> {
        let key = self.service_key()?;
        let response = self
            .http_client
            .delete(format!("{}/auth/v1/admin/users/{}", self.base_url, id))
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            log_warning(&format!("⚠️ Identidade {} já não existia", id));
            return Ok(());
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Falha ao remover identidade {} [{}]",
                id, status
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MemoryAccount {
    email: String,
    password: String,
}

/// Provedor em memória para desenvolvimento sem servidor de auth e testes
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityProvider {
    accounts: Arc<RwLock<HashMap<Uuid, MemoryAccount>>>,
    sessions: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra uma sessão já emitida para uma identidade existente
    pub async fn issue_session(&self, token: impl Into<String>, id: Uuid) {
        self.sessions.write().await.insert(token.into(), id);
    }

    /// Login por e-mail e senha; retorna um token novo
    pub async fn sign_in(&self, email: &str, password: &str) -> Option<String> {
        let id = {
            let accounts = self.accounts.read().await;
            accounts
                .iter()
                .find(|(_, a)| a.email.eq_ignore_ascii_case(email.trim()) && a.password == password)
                .map(|(id, _)| *id)?
        };

        let token = Uuid::new_v4().simple().to_string();
        self.issue_session(token.clone(), id).await;
        Some(token)
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.accounts.read().await.contains_key(&id)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> AppResult<AuthIdentity> {
        let id = self
            .sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Sessão inválida ou expirada".to_string()))?;

        let email = self
            .accounts
            .read()
            .await
            .get(&id)
            .map(|a| a.email.clone())
            .unwrap_or_default();
        Ok(AuthIdentity { id, email })
    }

    async fn create_identity(&self, email: &str, password: &str) -> AppResult<Uuid> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email.eq_ignore_ascii_case(email.trim())) {
            return Err(AppError::Conflict("Já existe um usuário com este e-mail".to_string()));
        }

        let id = Uuid::new_v4();
        accounts.insert(
            id,
            MemoryAccount {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
        );
        Ok(id)
    }

    async fn delete_identity(&self, id: Uuid) -> AppResult<()> {
        self.accounts.write().await.remove(&id);
        self.sessions.write().await.retain(|_, owner| *owner != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider(server: &MockServer) -> HttpIdentityProvider {
        HttpIdentityProvider::from_settings(&AuthSettings {
            url: Some(server.base_url()),
            anon_key: Some("anon-key".into()),
            service_role_key: Some("service-key".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_unconfigured_provider() {
        assert!(HttpIdentityProvider::from_settings(&AuthSettings::default()).is_none());
    }

    #[tokio::test]
    async fn test_verify_token() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/auth/v1/user")
                    .header("apikey", "anon-key")
                    .header("authorization", "Bearer good");
                then.status(200)
                    .json_body(serde_json::json!({"id": id, "email": "ana@wcb.com"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/auth/v1/user")
                    .header("authorization", "Bearer expired");
                then.status(401).json_body(serde_json::json!({"msg": "invalid JWT"}));
            })
            .await;

        let provider = provider(&server);
        let identity = provider.verify_token("good").await.unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.email, "ana@wcb.com");

        assert!(matches!(
            provider.verify_token("expired").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_create_identity_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/v1/admin/users")
                    .header("authorization", "Bearer service-key");
                then.status(422)
                    .json_body(serde_json::json!({"msg": "User already registered"}));
            })
            .await;

        let result = provider(&server).create_identity("ana@wcb.com", "segredo").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_memory_provider_sessions() {
        let provider = MemoryIdentityProvider::new();
        let id = provider.create_identity("ana@wcb.com", "segredo").await.unwrap();

        assert!(provider.sign_in("ana@wcb.com", "errada").await.is_none());
        let token = provider.sign_in("ANA@wcb.com", "segredo").await.unwrap();
        assert_eq!(provider.verify_token(&token).await.unwrap().id, id);

        provider.delete_identity(id).await.unwrap();
        assert!(provider.verify_token(&token).await.is_err());
        assert!(!provider.contains(id).await);
    }
}
