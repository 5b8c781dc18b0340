use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

use super::{CompanyStore, StoreError, StoreResult, UserStore};
use crate::config::settings::DatabaseSettings;
use crate::models::{Company, CompanyCounts, NewCompany, ProfileChanges, Role, UserProfile};

const COMPANY_COLUMNS: &str = "id, name, display_name, slug, active, created_at, updated_at";
const PROFILE_COLUMNS: &str =
    "id, email, full_name, role, active, company_id, created_at, updated_at";

/// Store Postgres (tabelas `companies` e `user_profiles`, ver `migrations/`)
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre o pool com timeout de conexão
    pub async fn connect(url: &str, settings: &DatabaseSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs.max(1)))
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Aplica as migrations embutidas de `migrations/`
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("registro".to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::UniqueViolation(db.message().to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

fn company_from_row(row: &PgRow) -> Result<Company, sqlx::Error> {
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        slug: row.try_get("slug")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(UserProfile {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        role,
        active: row.try_get("active")?,
        company_id: row.try_get("company_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn companies(rows: Vec<PgRow>) -> StoreResult<Vec<Company>> {
    rows.iter()
        .map(company_from_row)
        .collect::<Result<_, _>>()
        .map_err(map_sqlx_error)
}

fn company(row: Option<PgRow>) -> StoreResult<Option<Company>> {
    row.as_ref()
        .map(company_from_row)
        .transpose()
        .map_err(map_sqlx_error)
}

fn profile(row: Option<PgRow>) -> StoreResult<Option<UserProfile>> {
    row.as_ref()
        .map(profile_from_row)
        .transpose()
        .map_err(map_sqlx_error)
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn list(&self, active_only: bool) -> StoreResult<Vec<Company>> {
        let sql = format!(
            "SELECT {} FROM companies WHERE ($1 = false OR active = true) ORDER BY name",
            COMPANY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        companies(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        company(row)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE name = $1", COMPANY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        company(row)
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE slug = $1", COMPANY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        company(row)
    }

    async fn slug_exists(&self, slug: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM companies WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(exists)
    }

    async fn insert(&self, new: NewCompany) -> StoreResult<Company> {
        let sql = format!(
            r#"
            INSERT INTO companies (id, name, display_name, slug, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, true, NOW(), NOW())
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.display_name)
            .bind(&new.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        company_from_row(&row).map_err(map_sqlx_error)
    }

    async fn reactivate(&self, id: Uuid, display_name: &str) -> StoreResult<Company> {
        let sql = format!(
            r#"
            UPDATE companies
            SET active = true, display_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(display_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::NotFound(format!("company {}", id)))?;
        company_from_row(&row).map_err(map_sqlx_error)
    }

    async fn deactivate_all(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE companies SET active = false, updated_at = NOW() WHERE active = true",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn count_by_status(&self) -> StoreResult<CompanyCounts> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE active) AS active
            FROM companies
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;
        let active: i64 = row.try_get("active").map_err(map_sqlx_error)?;
        Ok(CompanyCounts {
            total: total as u64,
            active: active as u64,
            inactive: (total - active) as u64,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> StoreResult<Vec<UserProfile>> {
        let sql = format!("SELECT {} FROM user_profiles ORDER BY email", PROFILE_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter()
            .map(profile_from_row)
            .collect::<Result<_, _>>()
            .map_err(map_sqlx_error)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM user_profiles WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        profile(row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let sql = format!(
            "SELECT {} FROM user_profiles WHERE lower(email) = lower($1)",
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        profile(row)
    }

    async fn insert_user(&self, p: UserProfile) -> StoreResult<UserProfile> {
        let sql = format!(
            r#"
            INSERT INTO user_profiles (id, email, full_name, role, active, company_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(p.id)
            .bind(&p.email)
            .bind(&p.full_name)
            .bind(p.role.as_str())
            .bind(p.active)
            .bind(p.company_id)
            .bind(p.created_at)
            .bind(p.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        profile_from_row(&row).map_err(map_sqlx_error)
    }

    async fn update_user(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserProfile> {
        let sql = format!(
            r#"
            UPDATE user_profiles
            SET full_name  = COALESCE($2, full_name),
                role       = COALESCE($3, role),
                company_id = COALESCE($4, company_id),
                active     = COALESCE($5, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(changes.full_name)
            .bind(changes.role.map(|r| r.as_str().to_string()))
            .bind(changes.company_id)
            .bind(changes.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        profile_from_row(&row).map_err(map_sqlx_error)
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE user_profiles SET active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}
