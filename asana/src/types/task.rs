//! Task types do Asana
//!
//! Somente os campos solicitados via `opt_fields` são desserializados; todo o
//! resto é ignorado pelo serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CustomField;

/// Campos pedidos à API ao listar tarefas
pub const TASK_OPT_FIELDS: &str = "name,notes,completed,completed_at,due_on,created_at,modified_at,\
assignee.name,parent.resource_type,parent.name,\
custom_fields.name,custom_fields.resource_subtype,custom_fields.display_value,\
custom_fields.text_value,custom_fields.number_value,custom_fields.enum_value.name,\
custom_fields.multi_enum_values.name,custom_fields.date_value.date";

/// Representa uma tarefa do Asana
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// ID global da tarefa
    pub gid: String,

    /// Título da tarefa (pode vir vazio)
    #[serde(default)]
    pub name: Option<String>,

    /// Notas em texto livre
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Data de entrega (`YYYY-MM-DD`)
    #[serde(default)]
    pub due_on: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub assignee: Option<Assignee>,

    /// Tarefa pai (presente apenas em subtarefas)
    #[serde(default)]
    pub parent: Option<ResourceRef>,

    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// Responsável pela tarefa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub gid: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// Referência compacta a outro recurso (`{gid, resource_type, name}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub gid: String,

    #[serde(default)]
    pub resource_type: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

impl Task {
    /// Cria uma tarefa mínima (útil em testes)
    pub fn new(gid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            name: Some(name.into()),
            notes: None,
            completed: false,
            completed_at: None,
            due_on: None,
            created_at: None,
            modified_at: None,
            assignee: None,
            parent: None,
            custom_fields: Vec::new(),
        }
    }

    /// Subtarefa = tarefa cujo pai também é uma tarefa
    pub fn is_subtask(&self) -> bool {
        self.parent
            .as_ref()
            .map(|p| p.resource_type.as_deref().unwrap_or("task") == "task")
            .unwrap_or(false)
    }
}
