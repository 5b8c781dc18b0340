//! Feed de notificações: comentários recentes dos processos da empresa
//!
//! Cada usuário tem uma marca de leitura (watermark). Comentários criados
//! depois dela são "novos". As marcas vivem em memória e se perdem num
//! restart; nesse caso tudo volta a aparecer como novo.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::keyed_store::KeyedStore;
use super::task_source::{fetch_comments_batched, TaskSource};
use crate::config::settings::NotificationSettings;
use crate::models::{Notification, Tracking};
use crate::utils::logging::log_info;
use crate::utils::string_utils::preview;

/// Tamanho máximo da prévia de um comentário
const PREVIEW_CHARS: usize = 200;

/// Marcas de leitura por usuário, com TTL e limite de entradas
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    store: KeyedStore<DateTime<Utc>>,
}

impl WatermarkStore {
    pub fn new(ttl_days: i64, max_entries: usize) -> Self {
        Self {
            store: KeyedStore::new(Duration::days(ttl_days.max(1)), max_entries),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.store.get(user_id).await
    }

    pub async fn set(&self, user_id: &str, at: DateTime<Utc>) {
        self.store.insert(user_id, at).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub success: bool,
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub last_checked: Option<DateTime<Utc>>,
    /// Algum lote de comentários falhou
    pub degraded: bool,
}

pub struct NotificationService {
    source: Arc<dyn TaskSource>,
    settings: NotificationSettings,
}

impl NotificationService {
    pub fn new(source: Arc<dyn TaskSource>, settings: NotificationSettings) -> Self {
        Self { source, settings }
    }

    /// Monta o feed a partir dos trackings já no escopo do usuário
    pub async fn feed(
        &self,
        trackings: &[Tracking],
        watermark: Option<DateTime<Utc>>,
    ) -> NotificationFeed {
        let mut recent: Vec<&Tracking> = trackings.iter().collect();
        // Sem data de modificação vai para o fim
        recent.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        recent.truncate(self.settings.max_tasks);

        let by_task: HashMap<&str, &Tracking> =
            recent.iter().map(|t| (t.source_id.as_str(), *t)).collect();
        let task_ids: Vec<String> = recent.iter().map(|t| t.source_id.clone()).collect();

        let (comments, degraded) =
            fetch_comments_batched(self.source.as_ref(), &task_ids, self.settings.batch_size).await;

        let mut notifications: Vec<Notification> = comments
            .into_iter()
            .flat_map(|(task_id, comments)| {
                let tracking = by_task.get(task_id.as_str()).copied();
                comments.into_iter().map(move |comment| Notification {
                    id: comment.id,
                    task_id: task_id.clone(),
                    tracking_id: tracking.map(|t| t.id.clone()).unwrap_or_default(),
                    title: tracking.map(|t| t.title.clone()).unwrap_or_default(),
                    company_name: tracking.map(|t| t.company_name.clone()).unwrap_or_default(),
                    author: comment.author,
                    text: preview(&comment.text, PREVIEW_CHARS),
                    created_at: comment.created_at,
                    is_new: watermark.map_or(true, |w| comment.created_at > w),
                })
            })
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(self.settings.limit);

        let unread_count = notifications.iter().filter(|n| n.is_new).count();
        log_info(&format!(
            "🔔 {} notificações ({} novas) de {} processos",
            notifications.len(),
            unread_count,
            task_ids.len()
        ));

        NotificationFeed {
            success: true,
            notifications,
            unread_count,
            last_checked: watermark,
            degraded,
        }
    }
}
