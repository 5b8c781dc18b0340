/// Middleware layer para o Axum router
///
/// Este módulo contém middleware customizados para:
/// - Sessão (token → identidade → perfil ativo)
/// - Autorização de endpoints administrativos

pub mod admin_auth;
pub mod session_auth;

pub use admin_auth::require_admin;
pub use session_auth::{authenticate, bearer_token, require_session};
