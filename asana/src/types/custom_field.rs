//! Custom Fields do Asana
//!
//! Cada campo traz o valor em uma variante específica conforme o
//! `resource_subtype` (`text`, `number`, `enum`, `multi_enum`, `date`, `people`).
//! O `display_value` é a renderização textual que o próprio Asana calcula.

use serde::{Deserialize, Serialize};

/// Representa um custom field de uma tarefa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    /// ID do custom field
    #[serde(default)]
    pub gid: Option<String>,

    /// Nome do campo (ex: "EXPORTADOR", "Navio", "ETD")
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub resource_subtype: Option<String>,

    #[serde(default)]
    pub display_value: Option<String>,

    #[serde(default)]
    pub text_value: Option<String>,

    #[serde(default)]
    pub number_value: Option<f64>,

    #[serde(default)]
    pub enum_value: Option<EnumOption>,

    #[serde(default)]
    pub multi_enum_values: Option<Vec<EnumOption>>,

    #[serde(default)]
    pub date_value: Option<DateValue>,
}

/// Opção de enum/multi-enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumOption {
    #[serde(default)]
    pub gid: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Valor de campo data (`{ "date": "YYYY-MM-DD", "date_time": ... }`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub date_time: Option<String>,
}

impl CustomField {
    /// Cria um campo texto (útil em testes)
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            resource_subtype: Some("text".to_string()),
            text_value: Some(value.into()),
            ..Self::empty()
        }
    }

    /// Cria um campo enum (útil em testes)
    pub fn enumeration(name: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            resource_subtype: Some("enum".to_string()),
            enum_value: Some(EnumOption {
                gid: None,
                name: Some(option.into()),
            }),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            gid: None,
            name: None,
            resource_subtype: None,
            display_value: None,
            text_value: None,
            number_value: None,
            enum_value: None,
            multi_enum_values: None,
            date_value: None,
        }
    }
}
