//! Persistência de empresas e perfis de usuário
//!
//! Dois backends com a mesma interface:
//! - [`PgStore`]: Postgres via sqlx (produção)
//! - [`MemoryStore`]: mapas em memória (desenvolvimento sem banco e testes)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Company, CompanyCounts, NewCompany, ProfileChanges, UserProfile};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Registro não encontrado: {0}")]
    NotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueViolation(String),

    #[error("Erro de banco de dados: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn list(&self, active_only: bool) -> StoreResult<Vec<Company>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>>;

    /// Busca pelo nome canônico exato
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Company>>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Company>>;

    /// Verifica o slug contra todas as linhas, ativas ou não
    async fn slug_exists(&self, slug: &str) -> StoreResult<bool>;

    async fn insert(&self, company: NewCompany) -> StoreResult<Company>;

    /// Marca como ativa e atualiza o nome de exibição
    async fn reactivate(&self, id: Uuid, display_name: &str) -> StoreResult<Company>;

    /// Um único UPDATE em massa; retorna quantas linhas mudaram
    async fn deactivate_all(&self) -> StoreResult<u64>;

    async fn count_by_status(&self) -> StoreResult<CompanyCounts>;

    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<UserProfile>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Comparação de e-mail sem diferenciar maiúsculas
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>>;

    async fn insert_user(&self, profile: UserProfile) -> StoreResult<UserProfile>;

    async fn update_user(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserProfile>;

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<()>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}
