//! # Autenticação e autorização
//!
//! ## Estrutura:
//! - `identity.rs`: provedor de identidade (verificação de token, provisionamento)
//! - `session.rs`: usuário da sessão e escopo de empresa
//! - `validity.rs`: máquina de estados de validade da conta (lado cliente)

pub mod identity;
pub mod session;
pub mod validity;

pub use identity::{AuthIdentity, HttpIdentityProvider, IdentityProvider, MemoryIdentityProvider};
pub use session::{resolve_scope, CompanyScope, SessionUser};
pub use validity::{AccountChecker, CheckOutcome, HttpAccountChecker, ValidityMonitor, ValidityState};
