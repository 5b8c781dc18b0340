//! Administração de usuários (somente admin)
//!
//! A criação é em duas etapas: identidade no servidor de autenticação e
//! depois o perfil. Se o perfil falhar, a identidade recém-criada é removida.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::IdentityProvider;
use crate::models::{ProfileChanges, Role, UserProfile};
use crate::store::{CompanyStore, UserStore};
use crate::utils::logging::{log_error, log_info, log_validation_error, log_warning};
use crate::utils::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("regex de e-mail"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub full_name: String,
    pub role: String,
    pub company_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<Uuid>,
    pub active: Option<bool>,
}

/// Perfil com o nome da empresa para a listagem
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Perfil desativado; identidade preservada
    Soft,
    /// Perfil e identidade removidos
    Hard,
}

fn invalid(field: &str, message: &str) -> AppError {
    log_validation_error(field, message);
    AppError::ValidationError(message.to_string())
}

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>().map_err(|e| invalid("role", &e))
}

pub struct UserAdminService {
    users: Arc<dyn UserStore>,
    companies: Arc<dyn CompanyStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl UserAdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        companies: Arc<dyn CompanyStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            users,
            companies,
            identity,
        }
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<UserProfile> {
        let email = req.email.trim().to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return Err(invalid("email", "E-mail inválido"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid(
                "password",
                &format!("A senha deve ter pelo menos {} caracteres", MIN_PASSWORD_LEN),
            ));
        }
        if req.password != req.confirm_password {
            return Err(invalid("confirmPassword", "As senhas não conferem"));
        }
        let role = parse_role(&req.role)?;
        self.ensure_active_company(req.company_id).await?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Já existe um usuário com este e-mail".to_string()));
        }

        let id = self.identity.create_identity(&email, &req.password).await?;

        let now = Utc::now();
        let profile = UserProfile {
            id,
            email: email.clone(),
            full_name: req.full_name.trim().to_string(),
            role,
            active: true,
            company_id: req.company_id,
            created_at: now,
            updated_at: now,
        };

        match self.users.insert_user(profile).await {
            Ok(created) => {
                log_info(&format!("👤 Usuário criado: {} ({})", created.email, created.role));
                Ok(created)
            }
            Err(e) => {
                log_error(&format!("❌ Perfil de {} não gravado, removendo identidade: {}", email, e));
                if let Err(rollback) = self.identity.delete_identity(id).await {
                    log_error(&format!("❌ Identidade {} órfã: {}", id, rollback));
                }
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> AppResult<Vec<UserSummary>> {
        let names: HashMap<Uuid, String> = self
            .companies
            .list(false)
            .await?
            .into_iter()
            .map(|c| (c.id, c.display_name))
            .collect();

        Ok(self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|profile| UserSummary {
                company_name: names.get(&profile.company_id).cloned(),
                profile,
            })
            .collect())
    }

    pub async fn update(&self, id: Uuid, req: UpdateUserRequest) -> AppResult<UserProfile> {
        if self.users.find_user(id).await?.is_none() {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }

        let role = req.role.as_deref().map(parse_role).transpose()?;
        if let Some(company_id) = req.company_id {
            self.ensure_active_company(company_id).await?;
        }

        let changes = ProfileChanges {
            full_name: req.full_name.map(|n| n.trim().to_string()),
            role,
            company_id: req.company_id,
            active: req.active,
        };

        let updated = self.users.update_user(id, changes).await?;
        log_info(&format!("✏️ Usuário atualizado: {}", updated.email));
        Ok(updated)
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid, mode: DeleteMode) -> AppResult<DeleteMode> {
        if actor == id {
            return Err(invalid("id", "Você não pode excluir o próprio usuário"));
        }
        if self.users.find_user(id).await?.is_none() {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }

        match mode {
            DeleteMode::Soft => {
                self.users.set_user_active(id, false).await?;
                log_info(&format!("🚫 Usuário {} desativado", id));
            }
            DeleteMode::Hard => {
                self.users.delete_user(id).await?;
                if let Err(e) = self.identity.delete_identity(id).await {
                    log_warning(&format!("⚠️ Perfil {} removido, identidade mantida: {}", id, e));
                }
                log_info(&format!("🗑️ Usuário {} removido", id));
            }
        }
        Ok(mode)
    }

    async fn ensure_active_company(&self, company_id: Uuid) -> AppResult<()> {
        match self.companies.find_by_id(company_id).await? {
            Some(company) if company.active => Ok(()),
            Some(_) => Err(invalid("companyId", "A empresa selecionada está inativa")),
            None => Err(invalid("companyId", "Empresa não encontrada")),
        }
    }
}
