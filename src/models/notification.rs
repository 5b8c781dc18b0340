use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comentário recente de um processo, marcado como novo ou lido
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// ID da story no Asana
    pub id: String,
    pub task_id: String,
    pub tracking_id: String,
    pub title: String,
    pub company_name: String,
    pub author: String,
    /// Prévia truncada do comentário
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_new: bool,
}
