/// Middleware de sessão para as rotas `/api/*`
///
/// Fluxo: `Authorization: Bearer <token>` → identidade no servidor de
/// autenticação → perfil local. O [`SessionUser`] resultante vai para as
/// extensions da requisição.
///
/// # Respostas
///
/// - **401 Unauthorized**: token ausente, inválido ou expirado
/// - **403 ACCOUNT_INACTIVE**: sem perfil ou perfil desativado; o cliente deve
///   encerrar a sessão e mostrar a mensagem ao usuário
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::SessionUser;
use crate::utils::logging::log_access_denied;
use crate::utils::{AppError, AppResult};
use crate::AppState;

/// Extrai o token do header `Authorization: Bearer ...`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Token → identidade → perfil ativo
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<SessionUser> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Token de acesso ausente".to_string()))?;

    let identity = state.identity.verify_token(&token).await?;

    let Some(profile) = state.users.find_user(identity.id).await? else {
        log_access_denied(&identity.email, "sem perfil");
        return Err(AppError::AccountInactive(
            "Seu perfil não foi encontrado. Sua sessão será encerrada; contate o administrador."
                .to_string(),
        ));
    };

    if !profile.active {
        log_access_denied(&profile.email, "perfil inativo");
        return Err(AppError::AccountInactive(
            "Sua conta foi desativada. Sua sessão será encerrada; contate o administrador."
                .to_string(),
        ));
    }

    let company_name = state
        .companies
        .find_by_id(profile.company_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    Ok(SessionUser::from_profile(&profile, company_name))
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, request.headers()).await?;
    tracing::debug!("✅ Sessão válida: {} ({})", user.email, user.role);

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
