//! Tipos da API Asana
//!
//! Estruturas type-safe para as respostas de leitura usadas pelo dashboard:
//!
//! - **Task**: Tarefa com notas, responsável, tarefa pai e custom fields
//! - **CustomField**: Campo personalizado com todas as variantes de valor
//! - **Story**: Evento/comentário de uma tarefa
//! - **Page**: Envelope paginado `{ data, next_page }`
//!
//! ## ⚠️ Notas Importantes
//!
//! - **Datas** (`due_on`, `date_value.date`): strings `YYYY-MM-DD`
//! - **Timestamps** (`created_at`, `modified_at`): RFC3339 em UTC
//! - **Custom fields**: apenas a variante correspondente ao `resource_subtype` vem preenchida,
//!   mas `display_value` acompanha todas quando `opt_fields` o solicita

pub mod custom_field;
pub mod story;
pub mod task;

use serde::{Deserialize, Serialize};

pub use custom_field::{CustomField, DateValue, EnumOption};
pub use story::Story;
pub use task::{Assignee, ResourceRef, Task};

/// Envelope de resposta paginada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub next_page: Option<NextPage>,
}

/// Cursor da próxima página
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPage {
    pub offset: String,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub uri: Option<String>,
}

/// Envelope de resposta com um único objeto
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Single<T> {
    pub data: T,
}
