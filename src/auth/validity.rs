//! Validade da conta vista pelo cliente
//!
//! Máquina de estados explícita:
//!
//! ```text
//! Unchecked ──valid──▶ Valid ──invalid──▶ InvalidPendingLogout (terminal)
//!     │                  ▲  │
//!     └─────invalid──────┼──┘   erro de rede: mantém o estado atual
//! ```
//!
//! Erro de rede nunca derruba a sessão; só uma resposta de autorização
//! (401/403 ou `valid: false`) leva a `InvalidPendingLogout`. A revalidação
//! periódica tem uma única fonte ([`ValidityMonitor`]) e publica o estado por
//! um canal `watch`.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::utils::logging::{log_info, log_warning};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ValidityState {
    Unchecked,
    Valid,
    /// O cliente deve encerrar a sessão e mostrar `reason`
    InvalidPendingLogout { reason: String },
}

/// Resultado de uma verificação
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid,
    /// Conta inativa, perfil removido ou sessão recusada
    Invalid(String),
    /// Falha de transporte ou resposta inesperada (não é veredito)
    NetworkError(String),
}

impl ValidityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityState::Unchecked => "unchecked",
            ValidityState::Valid => "valid",
            ValidityState::InvalidPendingLogout { .. } => "invalid_pending_logout",
        }
    }

    pub fn requires_logout(&self) -> bool {
        matches!(self, ValidityState::InvalidPendingLogout { .. })
    }

    pub fn transition(&self, outcome: &CheckOutcome) -> ValidityState {
        match (self, outcome) {
            (ValidityState::InvalidPendingLogout { .. }, _) => self.clone(),
            (_, CheckOutcome::Valid) => ValidityState::Valid,
            (_, CheckOutcome::Invalid(reason)) => ValidityState::InvalidPendingLogout {
                reason: reason.clone(),
            },
            (_, CheckOutcome::NetworkError(_)) => self.clone(),
        }
    }
}

#[async_trait]
pub trait AccountChecker: Send + Sync {
    async fn check(&self) -> CheckOutcome;
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Verificação via `GET /api/auth/validate` no próprio backend
pub struct HttpAccountChecker {
    http_client: Client,
    url: String,
    token: String,
}

impl HttpAccountChecker {
    pub fn new(base_url: &str, token: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("falha ao criar cliente HTTP da validação de conta")?;

        Ok(Self {
            http_client,
            url: format!("{}/api/auth/validate", base_url.trim_end_matches('/')),
            token: token.into(),
        })
    }
}

#[async_trait]
impl AccountChecker for HttpAccountChecker {
    async fn check(&self) -> CheckOutcome {
        let response = match self
            .http_client
            .get(&self.url)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CheckOutcome::NetworkError(e.to_string()),
        };

        let status = response.status();
        let body = response.json::<ValidationBody>().await.ok();
        let reason = |fallback: &str| {
            body.as_ref()
                .and_then(|b| b.details.clone().or_else(|| b.message.clone()))
                .unwrap_or_else(|| fallback.to_string())
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CheckOutcome::Invalid(reason("Sua sessão não é mais válida"))
            }
            s if s.is_success() => match &body {
                Some(b) if b.valid => CheckOutcome::Valid,
                Some(_) => CheckOutcome::Invalid(reason("Sua conta foi desativada")),
                None => CheckOutcome::NetworkError("resposta de validação ilegível".to_string()),
            },
            other => CheckOutcome::NetworkError(format!("status inesperado {}", other)),
        }
    }
}

/// Revalidação periódica com uma única fonte de agendamento
pub struct ValidityMonitor {
    checker: Arc<dyn AccountChecker>,
    interval: Duration,
    state: watch::Sender<ValidityState>,
}

impl ValidityMonitor {
    pub fn new(checker: Arc<dyn AccountChecker>, interval: Duration) -> Self {
        let (state, _) = watch::channel(ValidityState::Unchecked);
        Self {
            checker,
            interval,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ValidityState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ValidityState {
        self.state.borrow().clone()
    }

    /// Verifica agora e publica o novo estado (só quando muda)
    pub async fn check_now(&self) -> ValidityState {
        let outcome = self.checker.check().await;
        if let CheckOutcome::NetworkError(e) = &outcome {
            log_warning(&format!("⚠️ Validação de conta sem resposta: {}", e));
        }

        let next = self.state.borrow().transition(&outcome);
        self.state.send_if_modified(|current| {
            if *current != next {
                *current = next.clone();
                true
            } else {
                false
            }
        });
        next
    }

    /// Inicia o laço de revalidação; termina ao chegar no estado terminal
    pub fn spawn(self) -> MonitorHandle {
        let receiver = self.subscribe();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                if self.check_now().await.requires_logout() {
                    log_info("🔒 Conta inválida: revalidação encerrada, aguardando logout");
                    break;
                }
            }
        });

        MonitorHandle { receiver, task }
    }
}

pub struct MonitorHandle {
    receiver: watch::Receiver<ValidityState>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn receiver(&self) -> watch::Receiver<ValidityState> {
        self.receiver.clone()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}
