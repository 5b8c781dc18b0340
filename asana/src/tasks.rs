// ============================================================================
// Task Manager - Leitura de tarefas do Asana
// ============================================================================
//
// Este módulo encapsula as leituras usadas pelo dashboard:
//
// 1. **Tarefas:**
//    - Listagem paginada de um projeto (list_project_tasks)
//    - Detalhe de uma tarefa (get_task)
//    - Stories/comentários de uma tarefa (list_task_stories)
//
// 2. **Administração:**
//    - Teste de conectividade (test_connection)
//
// # Paginação
//
// A API devolve `next_page.offset` enquanto houver mais resultados. As páginas
// são pedidas em sequência (N+1 só depois de N) e existe um teto rígido de
// páginas como válvula de segurança contra loops infinitos.

use crate::client::AsanaClient;
use crate::error::Result;
use crate::types::story::STORY_OPT_FIELDS;
use crate::types::task::TASK_OPT_FIELDS;
use crate::types::{Page, Single, Story, Task};
use serde_json::Value;

/// Tamanho máximo de página aceito pela API
pub const PAGE_SIZE: u32 = 100;

/// Gerenciador de leituras de tarefas do Asana
///
/// # Thread-Safety
///
/// Este struct implementa `Clone` e pode ser compartilhado entre threads via `Arc<>`.
#[derive(Clone)]
pub struct TaskManager {
    client: AsanaClient,
    page_size: u32,
}

impl TaskManager {
    pub fn new(client: AsanaClient) -> Self {
        Self {
            client,
            page_size: PAGE_SIZE,
        }
    }

    /// Ajusta o `limit` por página (limitado a 1..=100)
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, PAGE_SIZE);
        self
    }

    /// Cria um TaskManager a partir de um token (conveniência)
    pub fn from_token(access_token: String) -> Result<Self> {
        let client = AsanaClient::new(access_token)?;
        Ok(Self::new(client))
    }

    /// Lista todas as tarefas de um projeto
    ///
    /// # Endpoint da API
    ///
    /// `GET /projects/{project_gid}/tasks?opt_fields=...&limit=100[&offset=...]`
    ///
    /// # Argumentos
    ///
    /// - `project_gid`: ID do projeto
    /// - `max_pages`: teto de páginas; ao atingi-lo a listagem é truncada com warning
    ///
    /// # Retorno
    ///
    /// - `Ok(Vec<Task>)`: tarefas de todas as páginas lidas
    /// - `Err(AsanaError)`: falha em qualquer página (após retries)
    pub async fn list_project_tasks(&self, project_gid: &str, max_pages: u32) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0u32;

        loop {
            if pages >= max_pages {
                tracing::warn!(
                    "⚠️ Teto de {} páginas atingido no projeto {} ({} tasks lidas) - interrompendo paginação",
                    max_pages,
                    project_gid,
                    tasks.len()
                );
                break;
            }

            let mut endpoint = format!(
                "/projects/{}/tasks?opt_fields={}&limit={}",
                urlencoding::encode(project_gid),
                urlencoding::encode(TASK_OPT_FIELDS),
                self.page_size
            );
            if let Some(ref token) = offset {
                endpoint.push_str(&format!("&offset={}", urlencoding::encode(token)));
            }

            let page: Page<Task> = self.client.get_json(&endpoint).await?;
            pages += 1;

            tracing::debug!(
                "📄 Página {} do projeto {}: {} tasks",
                pages,
                project_gid,
                page.data.len()
            );
            tasks.extend(page.data);

            match page.next_page {
                Some(next) if !next.offset.is_empty() => offset = Some(next.offset),
                _ => break,
            }
        }

        tracing::info!(
            "✅ Listadas {} tasks do projeto {} em {} página(s)",
            tasks.len(),
            project_gid,
            pages
        );
        Ok(tasks)
    }

    /// Busca uma tarefa pelo ID
    ///
    /// `GET /tasks/{task_gid}?opt_fields=...`
    pub async fn get_task(&self, task_gid: &str) -> Result<Task> {
        let endpoint = format!(
            "/tasks/{}?opt_fields={}",
            urlencoding::encode(task_gid),
            urlencoding::encode(TASK_OPT_FIELDS)
        );
        let single: Single<Task> = self.client.get_json(&endpoint).await?;
        Ok(single.data)
    }

    /// Lista as stories (comentários + eventos de sistema) de uma tarefa
    ///
    /// `GET /tasks/{task_gid}/stories?opt_fields=...`
    pub async fn list_task_stories(&self, task_gid: &str) -> Result<Vec<Story>> {
        let endpoint = format!(
            "/tasks/{}/stories?opt_fields={}",
            urlencoding::encode(task_gid),
            urlencoding::encode(STORY_OPT_FIELDS)
        );
        let page: Page<Story> = self.client.get_json(&endpoint).await?;
        Ok(page.data)
    }

    /// Testa conectividade com a API do Asana
    ///
    /// `GET /users/me` — valida token e acessibilidade da API.
    pub async fn test_connection(&self) -> Result<Value> {
        let user_info: Value = self.client.get_json("/users/me").await?;
        Ok(user_info)
    }

    pub fn client(&self) -> &AsanaClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use httpmock::prelude::*;
    use serde_json::json;

    fn manager(server: &MockServer) -> TaskManager {
        let client = AsanaClient::new("test-token")
            .unwrap()
            .with_base_url(server.base_url())
            .with_retry_policy(RetryPolicy {
                max_attempts: 2,
                initial_backoff_ms: 1,
            });
        TaskManager::new(client)
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/projects/p1/tasks")
                    .query_param("limit", "100");
                then.status(200).json_body(json!({
                    "data": [
                        {"gid": "1", "name": "122º WCB", "completed": false},
                        {"gid": "2", "name": "17º AMZ (IMPORTAÇÃO)", "completed": true}
                    ],
                    "next_page": null
                }));
            })
            .await;

        let tasks = manager(&server).list_project_tasks("p1", 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tasks.len(), 2);
        assert!(tasks[1].completed);
    }

    #[tokio::test]
    async fn test_pagination_stops_at_page_ceiling() {
        let server = MockServer::start_async().await;
        // Toda resposta aponta para "mais uma página": só o teto encerra o loop
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/projects/loop/tasks");
                then.status(200).json_body(json!({
                    "data": [{"gid": "1", "name": "1º ABC"}],
                    "next_page": {"offset": "again", "path": "/projects/loop/tasks?offset=again"}
                }));
            })
            .await;

        let tasks = manager(&server).list_project_tasks("loop", 3).await.unwrap();

        assert_eq!(mock.hits_async().await, 3);
        assert_eq!(tasks.len(), 3);
    }

    #[tokio::test]
    async fn test_list_task_stories() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/42/stories");
                then.status(200).json_body(json!({
                    "data": [
                        {"gid": "s1", "type": "comment", "resource_subtype": "comment_added", "text": "ok"},
                        {"gid": "s2", "type": "system", "resource_subtype": "assigned"}
                    ]
                }));
            })
            .await;

        let stories = manager(&server).list_task_stories("42").await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories.iter().filter(|s| s.is_comment()).count(), 1);
    }

    #[tokio::test]
    async fn test_get_task_unwraps_data_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tasks/7");
                then.status(200)
                    .json_body(json!({"data": {"gid": "7", "name": "EXPOFRUT (IMPORTAÇÃO DIRETA 01.2025)"}}));
            })
            .await;

        let task = manager(&server).get_task("7").await.unwrap();
        assert_eq!(task.gid, "7");
    }
}
