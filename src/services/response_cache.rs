//! Cache de respostas por parâmetros de filtro
//!
//! Evita repetir a varredura do Asana a cada refresh do dashboard. Leitores
//! recebem o último valor bom dentro do TTL; dois refreshes simultâneos da
//! mesma chave são aceitáveis (o último a gravar vence).

use chrono::Duration;
use sha2::{Digest, Sha256};

use super::keyed_store::{KeyedStore, StoreStats};
use crate::utils::logging::log_cache_hit;

/// Chave canônica: pares ordenados, valores aparados e em minúsculas, SHA-256
pub fn cache_key(params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.trim().to_lowercase()))
        .collect();
    pairs.sort();

    let canonical = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    store: KeyedStore<V>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: KeyedStore::new(Duration::seconds(ttl_secs as i64), max_entries),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let value = self.store.get(key).await;
        if value.is_some() {
            log_cache_hit(key);
        }
        value
    }

    pub async fn put(&self, key: &str, value: V) {
        self.store.insert(key, value).await
    }

    pub async fn invalidate(&self, key: &str) {
        self.store.remove(key).await;
    }

    pub async fn clear(&self) {
        self.store.clear().await
    }

    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_canonical() {
        let a = cache_key(&[("company", "WCB"), ("status", "")]);
        let b = cache_key(&[("status", " "), ("company", "wcb")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let c = cache_key(&[("company", "AMZ"), ("status", "")]);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache: ResponseCache<Vec<u32>> = ResponseCache::new(120, 8);
        let key = cache_key(&[("scope", "all")]);

        assert!(cache.get(&key).await.is_none());
        cache.put(&key, vec![1, 2]).await;
        assert_eq!(cache.get(&key).await, Some(vec![1, 2]));

        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.stats().await.hits, 1);
    }
}
