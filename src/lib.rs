// Biblioteca do backend do dashboard de rastreamento
// Expõe módulos para uso em testes e no binário

pub mod auth;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use auth::IdentityProvider;
use services::{
    CompanySyncService, NotificationService, ResponseCache, TaskSource, TrackingResponse,
    TrackingService, UserAdminService, WatermarkStore,
};
use store::{CompanyStore, UserStore};

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub source: Arc<dyn TaskSource>,
    pub companies: Arc<dyn CompanyStore>,
    pub users: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Respostas de trackings por combinação de filtros
    pub cache: ResponseCache<TrackingResponse>,
    /// Marcas de leitura das notificações por usuário
    pub watermarks: WatermarkStore,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        source: Arc<dyn TaskSource>,
        companies: Arc<dyn CompanyStore>,
        users: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let cache = ResponseCache::new(settings.cache.ttl_secs, settings.cache.max_entries);
        let watermarks = WatermarkStore::new(
            settings.notifications.watermark_ttl_days,
            settings.notifications.max_watermarks,
        );

        Self {
            settings,
            source,
            companies,
            users,
            identity,
            cache,
            watermarks,
            started_at: Utc::now(),
        }
    }

    pub fn trackings(&self) -> TrackingService {
        TrackingService::new(self.source.clone(), self.cache.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.source.clone(), self.settings.notifications.clone())
    }

    pub fn company_sync(&self) -> CompanySyncService {
        CompanySyncService::new(self.source.clone(), self.companies.clone())
    }

    pub fn user_admin(&self) -> UserAdminService {
        UserAdminService::new(self.users.clone(), self.companies.clone(), self.identity.clone())
    }
}
