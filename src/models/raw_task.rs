//! Tarefa bruta recebida da fonte, já desacoplada do formato de fio do Asana

use asana::types::{CustomField, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Valor tipado de um custom field
///
/// Exatamente uma variante é escolhida na conversão, seguindo a precedência
/// display › texto › número › enum › multi-enum › data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Enum(String),
    MultiEnum(Vec<String>),
    Date(String),
}

impl FieldValue {
    /// Representação textual usada pelo resolvedor de aliases
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) | FieldValue::Date(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::MultiEnum(values) => values.join(", "),
        }
    }

    fn from_wire(field: &CustomField) -> Option<Self> {
        if let Some(v) = non_empty(field.display_value.as_deref()) {
            return Some(FieldValue::Text(v));
        }
        if let Some(v) = non_empty(field.text_value.as_deref()) {
            return Some(FieldValue::Text(v));
        }
        if let Some(n) = field.number_value {
            return Some(FieldValue::Number(n));
        }
        if let Some(v) = field
            .enum_value
            .as_ref()
            .and_then(|e| non_empty(e.name.as_deref()))
        {
            return Some(FieldValue::Enum(v));
        }
        if let Some(options) = &field.multi_enum_values {
            let names: Vec<String> = options
                .iter()
                .filter_map(|o| non_empty(o.name.as_deref()))
                .collect();
            if !names.is_empty() {
                return Some(FieldValue::MultiEnum(names));
            }
        }
        field
            .date_value
            .as_ref()
            .and_then(|d| non_empty(d.date.as_deref()).or_else(|| non_empty(d.date_time.as_deref())))
            .map(FieldValue::Date)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldEntry {
    pub name: String,
    pub value: Option<FieldValue>,
}

impl CustomFieldEntry {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExternalTask {
    pub source_id: String,
    pub title: Option<String>,
    pub notes: String,
    pub completed: bool,
    pub assignee: Option<String>,
    pub due_on: Option<String>,
    pub parent: Option<ParentRef>,
    pub custom_fields: Vec<CustomFieldEntry>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RawExternalTask {
    /// Tarefa mínima com título (útil em testes e fixtures)
    pub fn new(source_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            title: Some(title.into()),
            notes: String::new(),
            completed: false,
            assignee: None,
            due_on: None,
            parent: None,
            custom_fields: Vec::new(),
            created_at: None,
            modified_at: None,
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.custom_fields
            .push(CustomFieldEntry::new(name, FieldValue::Text(value.to_string())));
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    /// Título aparado; `None` quando ausente ou vazio
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Subtarefa cujo pai também é uma tarefa
    pub fn is_subtask(&self) -> bool {
        self.parent
            .as_ref()
            .map(|p| p.resource_type == "task")
            .unwrap_or(false)
    }
}

impl From<Task> for RawExternalTask {
    fn from(task: Task) -> Self {
        let custom_fields = task
            .custom_fields
            .iter()
            .filter_map(|field| {
                let name = non_empty(field.name.as_deref())?;
                Some(CustomFieldEntry {
                    name,
                    value: FieldValue::from_wire(field),
                })
            })
            .collect();

        Self {
            source_id: task.gid,
            title: task.name,
            notes: task.notes.unwrap_or_default(),
            completed: task.completed,
            assignee: task.assignee.and_then(|a| a.name),
            due_on: task.due_on,
            parent: task.parent.map(|p| ParentRef {
                id: p.gid,
                resource_type: p.resource_type.unwrap_or_else(|| "task".into()),
            }),
            custom_fields,
            created_at: task.created_at,
            modified_at: task.modified_at,
        }
    }
}
