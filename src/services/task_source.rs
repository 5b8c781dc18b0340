//! Fonte de tarefas (Asana) vista pelo resto do serviço
//!
//! Handlers e serviços dependem só do trait [`TaskSource`]; a implementação
//! real ([`AsanaTaskSource`]) envolve o crate `asana` com timeout em toda
//! chamada de saída.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::time::Duration;

use asana::tasks::TaskManager;
use asana::{AsanaClient, RetryPolicy};

use crate::config::settings::AsanaSettings;
use crate::models::RawExternalTask;
use crate::utils::logging::{log_info, log_source_api_error, log_warning};
use crate::utils::{AppError, AppResult};

/// Comentário de uma tarefa
#[derive(Debug, Clone, PartialEq)]
pub struct TaskComment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Credenciais e projetos presentes (sem placeholders)
    fn is_configured(&self) -> bool;

    /// Varredura completa de todas as tarefas dos projetos configurados
    async fn fetch_tasks(&self) -> AppResult<Vec<RawExternalTask>>;

    /// Comentários de usuários de uma tarefa (eventos de sistema ficam de fora)
    async fn fetch_comments(&self, task_id: &str) -> AppResult<Vec<TaskComment>>;

    async fn test_connection(&self) -> AppResult<()>;
}

/// Busca comentários em lotes de `batch_size`, um lote por vez
///
/// Falhas individuais não derrubam o lote: a tarefa fica sem comentários e o
/// resultado é marcado como degradado.
pub async fn fetch_comments_batched(
    source: &dyn TaskSource,
    task_ids: &[String],
    batch_size: usize,
) -> (Vec<(String, Vec<TaskComment>)>, bool) {
    let mut results = Vec::with_capacity(task_ids.len());
    let mut degraded = false;

    for chunk in task_ids.chunks(batch_size.max(1)) {
        let fetched = join_all(chunk.iter().map(|id| source.fetch_comments(id))).await;

        for (id, outcome) in chunk.iter().zip(fetched) {
            match outcome {
                Ok(comments) => results.push((id.clone(), comments)),
                Err(e) => {
                    degraded = true;
                    log_warning(&format!("⚠️ Comentários da tarefa {} indisponíveis: {}", id, e));
                }
            }
        }
    }

    (results, degraded)
}

pub struct AsanaTaskSource {
    manager: Option<TaskManager>,
    project_ids: Vec<String>,
    max_pages: u32,
    timeout: Duration,
}

impl AsanaTaskSource {
    /// Constrói a fonte a partir das configurações
    ///
    /// Token ausente/placeholder não é erro aqui: a fonte fica "não
    /// configurada" e cada chamada responde `NotConfigured`.
    pub fn from_settings(settings: &AsanaSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));

        let manager = settings.token().and_then(|token| {
            let client = AsanaClient::with_timeouts(token, settings.timeout_secs.max(1), 5)
                .map(|c| {
                    c.with_base_url(settings.base_url.clone())
                        .with_retry_policy(RetryPolicy {
                            max_attempts: settings.retry_attempts.max(1),
                            initial_backoff_ms: settings.retry_backoff_ms,
                        })
                });

            match client {
                Ok(client) => Some(TaskManager::new(client).with_page_size(settings.page_size)),
                Err(e) => {
                    log_source_api_error("client_init", &e.to_string());
                    None
                }
            }
        });

        Self {
            manager,
            project_ids: settings.project_ids(),
            max_pages: settings.max_pages.max(1),
            timeout,
        }
    }

    fn manager(&self) -> AppResult<&TaskManager> {
        if self.project_ids.is_empty() {
            return Err(AppError::NotConfigured(
                "Nenhum projeto do Asana configurado (ASANA_PROJECT_IDS)".to_string(),
            ));
        }
        self.manager.as_ref().ok_or_else(|| {
            AppError::NotConfigured("Token do Asana não configurado (ASANA_ACCESS_TOKEN)".to_string())
        })
    }

    /// Limite total de uma varredura: retries e backoff incluídos
    fn sweep_timeout(&self) -> Duration {
        self.timeout * (self.max_pages.min(10) + 2)
    }
}

#[async_trait]
impl TaskSource for AsanaTaskSource {
    fn is_configured(&self) -> bool {
        self.manager().is_ok()
    }

    async fn fetch_tasks(&self) -> AppResult<Vec<RawExternalTask>> {
        let manager = self.manager()?;
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();

        for project_id in &self.project_ids {
            let listing = tokio::time::timeout(
                self.sweep_timeout(),
                manager.list_project_tasks(project_id, self.max_pages),
            )
            .await
            .map_err(|_| {
                AppError::Timeout(format!("Listagem do projeto {} excedeu o tempo limite", project_id))
            })?;

            let project_tasks = listing.map_err(|e| {
                log_source_api_error("list_project_tasks", &e.to_string());
                AppError::from(e)
            })?;

            for task in project_tasks {
                // Uma tarefa pode estar em mais de um projeto
                if seen.insert(task.gid.clone()) {
                    tasks.push(RawExternalTask::from(task));
                }
            }
        }

        log_info(&format!(
            "📥 {} tarefas lidas de {} projeto(s) do Asana",
            tasks.len(),
            self.project_ids.len()
        ));
        Ok(tasks)
    }

    async fn fetch_comments(&self, task_id: &str) -> AppResult<Vec<TaskComment>> {
        let manager = self.manager()?;

        let stories = tokio::time::timeout(self.timeout, manager.list_task_stories(task_id))
            .await
            .map_err(|_| AppError::Timeout(format!("Comentários da tarefa {}", task_id)))??;

        Ok(stories
            .into_iter()
            .filter(|story| story.is_comment())
            .filter_map(|story| {
                let created_at = story.created_at?;
                let text = story.text.clone().unwrap_or_default();
                if text.trim().is_empty() {
                    return None;
                }
                Some(TaskComment {
                    author: story.author_name().unwrap_or("Desconhecido").to_string(),
                    id: story.gid,
                    text,
                    created_at,
                })
            })
            .collect())
    }

    async fn test_connection(&self) -> AppResult<()> {
        let manager = self.manager()?;
        tokio::time::timeout(self.timeout, manager.test_connection())
            .await
            .map_err(|_| AppError::Timeout("Teste de conexão com o Asana".to_string()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings(server: &MockServer, token: &str) -> AsanaSettings {
        AsanaSettings {
            token: Some(token.to_string()),
            project_ids: vec!["p1".into(), "p2".into()],
            base_url: server.base_url(),
            timeout_secs: 5,
            retry_attempts: 1,
            retry_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_source() {
        let source = AsanaTaskSource::from_settings(&AsanaSettings {
            token: Some("your_asana_token".into()),
            project_ids: vec!["p1".into()],
            ..Default::default()
        });

        assert!(!source.is_configured());
        assert!(matches!(source.fetch_tasks().await, Err(AppError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_fetch_tasks_dedupes_across_projects() {
        let server = MockServer::start_async().await;
        for project in ["p1", "p2"] {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(format!("/projects/{}/tasks", project));
                    then.status(200).json_body(json!({
                        "data": [
                            {"gid": "1", "name": "122º WCB"},
                            {"gid": format!("{}-only", project), "name": "17º AMZ"}
                        ]
                    }));
                })
                .await;
        }

        let source = AsanaTaskSource::from_settings(&settings(&server, "token"));
        let tasks = source.fetch_tasks().await.unwrap();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].title.as_deref(), Some("122º WCB"));
    }

    #[tokio::test]
    async fn test_fetch_comments_keeps_only_user_comments() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/1/stories");
                then.status(200).json_body(json!({
                    "data": [
                        {"gid": "s1", "type": "comment", "resource_subtype": "comment_added",
                         "text": "Liberado", "created_at": "2025-02-01T10:00:00Z",
                         "created_by": {"gid": "u", "name": "Marcos"}},
                        {"gid": "s2", "type": "system", "resource_subtype": "assigned",
                         "text": "atribuiu", "created_at": "2025-02-01T11:00:00Z"}
                    ]
                }));
            })
            .await;

        let source = AsanaTaskSource::from_settings(&settings(&server, "token"));
        let comments = source.fetch_comments("1").await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "Marcos");
    }

    #[tokio::test]
    async fn test_batched_comments_mark_degraded_on_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/ok/stories");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/broken/stories");
                then.status(500).json_body(json!({"errors": [{"message": "boom"}]}));
            })
            .await;

        let source = AsanaTaskSource::from_settings(&settings(&server, "token"));
        let ids = vec!["ok".to_string(), "broken".to_string()];
        let (results, degraded) = fetch_comments_batched(&source, &ids, 5).await;

        assert!(degraded);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "ok");
    }
}
