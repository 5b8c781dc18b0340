//! Cliente da API Asana (1.0)
//!
//! Este crate fornece uma interface tipada para as leituras que o dashboard
//! de rastreamento precisa fazer no Asana:
//!
//! - Tarefas de um projeto, com paginação sequencial (`next_page.offset`)
//! - Detalhe de uma tarefa
//! - Stories (comentários) de uma tarefa
//! - Teste de conectividade (`/users/me`)
//!
//! Todas as leituras são idempotentes e passam pela política de retry do
//! [`AsanaClient`] (backoff exponencial para 429, 5xx, timeout e falha de conexão).
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use asana::{AsanaClient, tasks::TaskManager};
//!
//! #[tokio::main]
//! async fn main() -> asana::Result<()> {
//!     // IMPORTANTE: Ler de variáveis de ambiente (NUNCA hardcode!)
//!     let token = std::env::var("ASANA_ACCESS_TOKEN")
//!         .expect("ASANA_ACCESS_TOKEN não configurado");
//!
//!     let client = AsanaClient::new(token)?;
//!     let manager = TaskManager::new(client);
//!     let tasks = manager.list_project_tasks("1200000000000000", 50).await?;
//!     println!("{} tasks", tasks.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod tasks;
pub mod types;

pub use client::{AsanaClient, RetryPolicy};
pub use error::{AsanaError, Result};
