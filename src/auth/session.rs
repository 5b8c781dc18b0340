//! Usuário da sessão e escopo de empresa das leituras

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Role, UserProfile};
use crate::store::CompanyStore;
use crate::utils::logging::log_warning;
use crate::utils::normalization::{collapse_whitespace, same_company};
use crate::utils::{AppError, AppResult};

/// Usuário autenticado, inserido nas extensions da requisição pelo middleware
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub company_id: Uuid,
    /// Nome canônico da empresa do perfil (vazio se a empresa sumiu)
    pub company_name: String,
}

impl SessionUser {
    pub fn from_profile(profile: &UserProfile, company_name: impl Into<String>) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            company_id: profile.company_id,
            company_name: company_name.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Conjunto de registros visível a uma leitura
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyScope {
    /// Visão consolidada (somente admin)
    All,
    Company(String),
}

impl CompanyScope {
    pub fn label(&self) -> &str {
        match self {
            CompanyScope::All => "all",
            CompanyScope::Company(name) => name,
        }
    }
}

/// Decide o escopo de uma leitura
///
/// Não-admin: sempre a própria empresa (pedidos de outra empresa são
/// ignorados com aviso). Admin: a empresa pedida (nome ou slug, precisa
/// existir) ou a visão consolidada. A escolha do admin vem do cliente a cada
/// requisição e nunca é persistida.
pub async fn resolve_scope(
    user: &SessionUser,
    requested: Option<&str>,
    store: &dyn CompanyStore,
) -> AppResult<CompanyScope> {
    let requested = requested.map(str::trim).filter(|r| !r.is_empty());

    if !user.is_admin() {
        if let Some(other) = requested {
            if !same_company(other, &user.company_name) {
                log_warning(&format!(
                    "⚠️ Usuário {} pediu a empresa '{}' fora do seu escopo; usando '{}'",
                    user.email, other, user.company_name
                ));
            }
        }
        if user.company_name.is_empty() {
            return Err(AppError::Forbidden(
                "Seu perfil não está vinculado a uma empresa válida".to_string(),
            ));
        }
        return Ok(CompanyScope::Company(user.company_name.clone()));
    }

    let Some(requested) = requested else {
        return Ok(CompanyScope::All);
    };
    if requested.eq_ignore_ascii_case("all") {
        return Ok(CompanyScope::All);
    }

    let by_name = store
        .find_by_name(&collapse_whitespace(requested).to_uppercase())
        .await?;
    let company = match by_name {
        Some(company) => Some(company),
        None => store.find_by_slug(&requested.to_lowercase()).await?,
    };

    company
        .map(|c| CompanyScope::Company(c.name))
        .ok_or_else(|| AppError::NotFound(format!("Empresa '{}' não encontrada", requested)))
}
