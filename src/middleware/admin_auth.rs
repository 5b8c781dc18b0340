/// Middleware de autorização para endpoints administrativos
///
/// Roda depois de [`super::require_session`]: lê o [`SessionUser`] das
/// extensions e só deixa passar o perfil `admin`.
///
/// # Respostas
///
/// - **401 Unauthorized**: sem sessão (middleware de sessão ausente na rota)
/// - **403 Forbidden**: sessão válida, perfil sem permissão
use axum::{extract::Request, middleware::Next, response::Response};

use crate::auth::SessionUser;
use crate::utils::logging::log_access_denied;
use crate::utils::AppError;

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let Some(user) = request.extensions().get::<SessionUser>() else {
        return Err(AppError::Unauthorized("Sessão ausente".to_string()));
    };

    if !user.is_admin() {
        log_access_denied(&user.email, &format!("perfil {} em rota de admin", user.role));
        return Err(AppError::Forbidden(
            "Acesso restrito a administradores".to_string(),
        ));
    }

    tracing::debug!("✅ Admin access granted: {}", user.email);
    Ok(next.run(request).await)
}
