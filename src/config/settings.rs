use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub asana: AsanaSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub app: AppSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AsanaSettings {
    pub token: Option<String>,
    pub project_ids: Vec<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub max_pages: u32,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AsanaSettings {
    fn default() -> Self {
        Self {
            token: None,
            project_ids: Vec::new(),
            base_url: "https://app.asana.com/api/1.0".into(),
            timeout_secs: 30,
            page_size: 100,
            max_pages: 50,
            retry_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl AsanaSettings {
    /// Token utilizável (placeholders contam como ausentes)
    pub fn token(&self) -> Option<&str> {
        usable(self.token.as_deref())
    }

    pub fn project_ids(&self) -> Vec<String> {
        self.project_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| usable(Some(id)).is_some())
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.token().is_some() && !self.project_ids().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_secs: 8,
        }
    }
}

impl DatabaseSettings {
    pub fn url(&self) -> Option<&str> {
        usable(self.url.as_deref())
    }
}

/// Servidor de autenticação (GoTrue/Supabase) e seus dois níveis de credencial
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AuthSettings {
    pub url: Option<String>,
    /// Chave restrita: só valida tokens de sessão
    pub anon_key: Option<String>,
    /// Chave administrativa: cria e remove identidades
    pub service_role_key: Option<String>,
}

impl AuthSettings {
    pub fn url(&self) -> Option<&str> {
        usable(self.url.as_deref())
    }

    pub fn anon_key(&self) -> Option<&str> {
        usable(self.anon_key.as_deref())
    }

    pub fn service_role_key(&self) -> Option<&str> {
        usable(self.service_role_key.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            max_entries: 64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationSettings {
    pub batch_size: usize,
    pub max_tasks: usize,
    pub limit: usize,
    pub watermark_ttl_days: i64,
    pub max_watermarks: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_tasks: 20,
            limit: 50,
            watermark_ttl_days: 30,
            max_watermarks: 10_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppSettings {
    /// Base usada em chamadas servidor-a-servidor (validação de conta)
    pub internal_base_url: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            internal_base_url: "http://localhost:8080".into(),
            environment: "development".into(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .set_override("app.environment", run_mode.clone())?;

        // Variáveis de ambiente com nomes "de plataforma"
        if let Ok(token) = std::env::var("ASANA_ACCESS_TOKEN") {
            builder = builder.set_override("asana.token", token)?;
        }
        if let Ok(ids) = std::env::var("ASANA_PROJECT_IDS") {
            builder = builder.set_override("asana.project_ids", split_list(&ids))?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            builder = builder.set_override("auth.url", url)?;
        }
        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            builder = builder.set_override("auth.anon_key", key)?;
        }
        if let Ok(key) = std::env::var("SUPABASE_SERVICE_ROLE_KEY") {
            builder = builder.set_override("auth.service_role_key", key)?;
        }
        if let Ok(url) = std::env::var("INTERNAL_BASE_URL") {
            builder = builder.set_override("app.internal_base_url", url)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        // APP__CACHE__TTL_SECS=60 etc.
        builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Valores vazios ou de exemplo (`your_token`, `changeme`, `xxxx`) contam como ausentes
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v.is_empty()
        || v.starts_with("your_")
        || v.starts_with("your-")
        || v == "changeme"
        || v == "change_me"
        || v == "placeholder"
        || (v.len() >= 3 && v.chars().all(|c| c == 'x'))
}

fn usable(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_placeholder(v))
}
