/// Backend do dashboard de rastreamento marítimo
///
/// Arquitetura:
/// - Asana é a fonte de verdade dos processos (lido sob demanda, com cache curto)
/// - Postgres guarda empresas e perfis de usuário
/// - Servidor de autenticação (GoTrue/Supabase) emite e valida as sessões
///
/// Sem workers em background: cada requisição é atendida de forma independente.
use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tracking_dashboard::auth::{HttpIdentityProvider, IdentityProvider, MemoryIdentityProvider};
use tracking_dashboard::config::Settings;
use tracking_dashboard::routes::build_router;
use tracking_dashboard::services::{AsanaTaskSource, TaskSource};
use tracking_dashboard::store::{CompanyStore, MemoryStore, PgStore, UserStore};
use tracking_dashboard::utils::logging::*;
use tracking_dashboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Inicializar tracing (RUST_LOG, padrão info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_loaded {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;
    log_config_loaded(&settings.app.environment);

    // Fonte de tarefas (Asana)
    let source: Arc<dyn TaskSource> = Arc::new(AsanaTaskSource::from_settings(&settings.asana));
    if source.is_configured() {
        log_info(&format!(
            "⚡ Asana configurado: {} projeto(s)",
            settings.asana.project_ids().len()
        ));
    } else {
        log_warning("⚠️ Asana não configurado (ASANA_ACCESS_TOKEN / ASANA_PROJECT_IDS). Leituras responderão SOURCE_NOT_CONFIGURED.");
    }

    // Persistência: Postgres quando DATABASE_URL existe, memória em desenvolvimento
    let (companies, users): (Arc<dyn CompanyStore>, Arc<dyn UserStore>) =
        match settings.database.url() {
            Some(url) => {
                let store = PgStore::connect(url, &settings.database)
                    .await
                    .context("Failed to connect to database")?;
                store
                    .run_migrations()
                    .await
                    .context("Failed to run migrations")?;
                log_info("🗄️ Postgres conectado e migrations aplicadas");
                (Arc::new(store.clone()), Arc::new(store))
            }
            None => {
                log_warning("⚠️ DATABASE_URL não configurada - usando store em memória (dados se perdem no restart)");
                let store = MemoryStore::new();
                (Arc::new(store.clone()), Arc::new(store))
            }
        };

    // Provedor de identidade
    let identity: Arc<dyn IdentityProvider> = match HttpIdentityProvider::from_settings(&settings.auth) {
        Some(provider) => {
            log_info("🔐 Servidor de autenticação configurado");
            Arc::new(provider)
        }
        None => {
            log_warning("⚠️ SUPABASE_URL/SUPABASE_ANON_KEY ausentes - usando provedor de identidade em memória");
            Arc::new(MemoryIdentityProvider::new())
        }
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;

    let app_state = Arc::new(AppState::new(settings, source, companies, users, identity));
    let app = build_router(app_state);

    let listener = TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("❌ Falha ao instalar handler de Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("❌ Falha ao instalar handler de SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
