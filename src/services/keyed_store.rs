//! Mapa chave → valor com TTL e limite de entradas
//!
//! Base do cache de respostas e das marcas de leitura de notificações. Fica
//! no `AppState` (injetado), nunca em estado global.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone)]
pub struct KeyedStore<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
    stats: Arc<RwLock<StoreStats>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> KeyedStore<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(StoreStats::default())),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now()).await
    }

    /// Leitura com relógio explícito; entradas vencidas contam como ausentes
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let found = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|entry| now - entry.stored_at < self.ttl)
                .map(|entry| entry.value.clone())
        };

        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, Utc::now()).await
    }

    /// Grava e, se passar do limite, remove vencidas e depois as mais antigas
    pub async fn insert_at(&self, key: impl Into<String>, value: V, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: now,
            },
        );

        if entries.len() > self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, entry| now - entry.stored_at < ttl);
        }

        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().await.remove(key).map(|e| e.value)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn stats(&self) -> StoreStats {
        let entries = self.entries.read().await.len();
        StoreStats {
            entries,
            ..*self.stats.read().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let store = KeyedStore::new(Duration::seconds(120), 10);
        let t0 = Utc::now();

        store.insert_at("k", 1, t0).await;
        assert_eq!(store.get_at("k", t0 + Duration::seconds(119)).await, Some(1));
        assert_eq!(store.get_at("k", t0 + Duration::seconds(120)).await, None);

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_eviction_prefers_expired_then_oldest() {
        let store = KeyedStore::new(Duration::seconds(60), 2);
        let t0 = Utc::now();

        store.insert_at("old", 1, t0).await;
        store.insert_at("mid", 2, t0 + Duration::seconds(50)).await;
        // "old" já venceu em t0+70: sai primeiro
        store.insert_at("new", 3, t0 + Duration::seconds(70)).await;

        let now = t0 + Duration::seconds(71);
        assert_eq!(store.get_at("old", now).await, None);
        assert_eq!(store.get_at("mid", now).await, Some(2));
        assert_eq!(store.get_at("new", now).await, Some(3));

        // Nenhuma vencida: sai a mais antiga
        store.insert_at("newest", 4, t0 + Duration::seconds(72)).await;
        assert_eq!(store.stats().await.entries, 2);
        assert_eq!(store.get_at("mid", now).await, None);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = KeyedStore::new(Duration::seconds(60), 10);
        store.insert("a", "x".to_string()).await;
        store.insert("b", "y".to_string()).await;

        assert_eq!(store.remove("a").await, Some("x".to_string()));
        store.clear().await;
        assert_eq!(store.stats().await.entries, 0);
    }
}
