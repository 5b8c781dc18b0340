use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!(
        "Request processed: {} - Status: {} - Duration: {}ms",
        endpoint, status, duration_ms
    );
}

pub fn log_source_api_error(operation: &str, error: &str) {
    error!("Asana API error: {} - Error: {}", operation, error);
}

pub fn log_trackings_assembled(kept: usize, unmatched: usize, excluded: usize) {
    info!(
        "📦 Trackings montados: {} válidos, {} sem empresa, {} descartados",
        kept, unmatched, excluded
    );
}

pub fn log_sync_summary(created: usize, updated: usize, deactivated: u64, errors: usize) {
    info!(
        "✅ Sincronização de empresas concluída: {} criadas, {} reativadas, {} inativas, {} erros",
        created, updated, deactivated, errors
    );
}

pub fn log_cache_hit(key: &str) {
    debug!("💾 Cache hit: {}", key);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Tracking dashboard server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_integration_status_check() {
    debug!("Integration status check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_access_denied(user: &str, reason: &str) {
    warn!("🔒 Access denied for {}: {}", user, reason);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
