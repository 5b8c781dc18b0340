//! Stories (histórico e comentários) de uma tarefa

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::ResourceRef;

/// Campos pedidos à API ao listar stories
pub const STORY_OPT_FIELDS: &str = "created_at,created_by.name,text,type,resource_subtype";

/// Evento de uma tarefa (comentário ou mudança de sistema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub gid: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_by: Option<ResourceRef>,

    #[serde(default)]
    pub text: Option<String>,

    /// `comment` ou `system`
    #[serde(default, rename = "type")]
    pub story_type: Option<String>,

    /// ex: `comment_added`, `assigned`, `due_date_changed`
    #[serde(default)]
    pub resource_subtype: Option<String>,
}

impl Story {
    /// Comentário escrito por um usuário (não evento de sistema)
    pub fn is_comment(&self) -> bool {
        self.resource_subtype.as_deref() == Some("comment_added")
            || self.story_type.as_deref() == Some("comment")
    }

    pub fn author_name(&self) -> Option<&str> {
        self.created_by.as_ref().and_then(|u| u.name.as_deref())
    }
}
