use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    /// Nome canônico (maiúsculo, único)
    pub name: String,
    pub display_name: String,
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados de inserção de uma empresa
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub display_name: String,
    pub slug: String,
}

/// Contagem de empresas por estado
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCounts {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}
