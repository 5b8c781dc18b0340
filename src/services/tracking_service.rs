//! Leitura dos trackings para o dashboard
//!
//! Fluxo: cache → varredura do Asana → montagem → escopo da empresa →
//! filtro de status → métricas. O cache guarda a resposta pronta por
//! combinação de filtros.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::metrics_aggregator::aggregate;
use super::record_assembler::{AssembledBatch, RecordAssembler};
use super::response_cache::{cache_key, ResponseCache};
use super::task_source::TaskSource;
use crate::auth::session::CompanyScope;
use crate::models::{Tracking, TrackingMetrics, UnmatchedRecord};
use crate::utils::logging::{log_info, log_warning};
use crate::utils::normalization::same_company;
use crate::utils::AppResult;

/// Parâmetros de `GET /api/asana/trackings`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingQuery {
    pub company: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub total: usize,
    pub company: String,
    pub cached: bool,
    pub fetched_at: DateTime<Utc>,
    /// Registros sem empresa atribuível nesta varredura
    pub unmatched: usize,
    /// Resposta anterior servida porque a varredura nova falhou
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
    pub success: bool,
    pub data: Vec<Tracking>,
    pub metrics: TrackingMetrics,
    pub meta: ResponseMeta,
}

pub struct TrackingService {
    source: Arc<dyn TaskSource>,
    cache: ResponseCache<TrackingResponse>,
}

impl TrackingService {
    pub fn new(source: Arc<dyn TaskSource>, cache: ResponseCache<TrackingResponse>) -> Self {
        Self { source, cache }
    }

    pub async fn load(&self, query: &TrackingQuery, scope: &CompanyScope) -> AppResult<TrackingResponse> {
        let status = query.status.as_deref().unwrap_or("").trim();
        let key = cache_key(&[("company", scope.label()), ("status", status)]);

        if !query.refresh {
            if let Some(mut cached) = self.cache.get(&key).await {
                cached.meta.cached = true;
                return Ok(cached);
            }
        }

        let batch = match self.sweep().await {
            Ok(batch) => batch,
            Err(e) if e.is_soft() => {
                // Refresh forçado que falhou: serve o último valor bom, se houver
                let fallback = self.cache.get(&key).await;
                return match fallback {
                    Some(mut stale) => {
                        log_warning(&format!("⚠️ Servindo trackings do cache após falha: {}", e));
                        stale.meta.cached = true;
                        stale.meta.degraded = true;
                        Ok(stale)
                    }
                    None => Err(e),
                };
            }
            Err(e) => return Err(e),
        };

        let data: Vec<Tracking> = batch
            .kept
            .into_iter()
            .filter(|t| scope.includes(&t.company_name))
            .filter(|t| status.is_empty() || t.status.matches_filter(status))
            .collect();
        let unmatched = match scope {
            CompanyScope::All => batch.unmatched.len(),
            CompanyScope::Company(_) => 0,
        };

        let response = TrackingResponse {
            success: true,
            metrics: aggregate(&data),
            meta: ResponseMeta {
                total: data.len(),
                company: scope.label().to_string(),
                cached: false,
                fetched_at: Utc::now(),
                unmatched,
                degraded: false,
            },
            data,
        };

        log_info(&format!(
            "📊 {} trackings para '{}' (status: '{}')",
            response.meta.total,
            scope.label(),
            status
        ));
        self.cache.put(&key, response.clone()).await;
        Ok(response)
    }

    /// Registros sem empresa atribuível (diagnóstico de títulos)
    pub async fn unmatched(&self) -> AppResult<Vec<UnmatchedRecord>> {
        Ok(self.sweep().await?.unmatched)
    }

    /// Nomes distintos de empresa derivados dos títulos, em ordem alfabética
    pub async fn company_names(&self) -> AppResult<Vec<String>> {
        let batch = self.sweep().await?;
        let names: BTreeSet<String> = batch.kept.into_iter().map(|t| t.company_name).collect();
        Ok(names.into_iter().collect())
    }

    async fn sweep(&self) -> AppResult<AssembledBatch> {
        let tasks = self.source.fetch_tasks().await?;
        Ok(RecordAssembler::new(Utc::now().date_naive()).partition(&tasks))
    }
}

impl CompanyScope {
    /// Registro visível neste escopo
    pub fn includes(&self, company_name: &str) -> bool {
        match self {
            CompanyScope::All => true,
            CompanyScope::Company(name) => same_company(company_name, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawExternalTask;
    use crate::services::task_source::TaskComment;
    use crate::utils::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSource {
        tasks: Vec<RawExternalTask>,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                tasks: vec![
                    RawExternalTask::new("1", "122º WCB").with_field("Status", "Concluído"),
                    RawExternalTask::new("2", "123º WCB"),
                    RawExternalTask::new("3", "17º AMZ (IMPORTAÇÃO)"),
                    RawExternalTask::new("4", "reunião semanal"),
                ],
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl TaskSource for CountingSource {
        fn is_configured(&self) -> bool {
            true
        }

        async fn fetch_tasks(&self) -> AppResult<Vec<RawExternalTask>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::Timeout("lento".into()));
            }
            Ok(self.tasks.clone())
        }

        async fn fetch_comments(&self, _task_id: &str) -> AppResult<Vec<TaskComment>> {
            Ok(Vec::new())
        }

        async fn test_connection(&self) -> AppResult<()> {
            Ok(())
        }
    }

    fn service(source: Arc<CountingSource>) -> TrackingService {
        TrackingService::new(source, ResponseCache::new(120, 16))
    }

    #[tokio::test]
    async fn test_scope_and_status_filter() {
        let source = Arc::new(CountingSource::new());
        let svc = service(source.clone());

        let all = svc.load(&TrackingQuery::default(), &CompanyScope::All).await.unwrap();
        assert_eq!(all.meta.total, 3);
        assert_eq!(all.meta.unmatched, 1);
        assert_eq!(all.meta.company, "all");

        let wcb = svc
            .load(&TrackingQuery::default(), &CompanyScope::Company("wcb".into()))
            .await
            .unwrap();
        assert_eq!(wcb.meta.total, 2);
        assert_eq!(wcb.metrics.completed, 1);
        assert_eq!(wcb.meta.unmatched, 0);

        let done = svc
            .load(
                &TrackingQuery {
                    status: Some("concluido".into()),
                    ..Default::default()
                },
                &CompanyScope::Company("WCB".into()),
            )
            .await
            .unwrap();
        assert_eq!(done.data.len(), 1);
        assert_eq!(done.data[0].sequence_ref, "122");
    }

    #[tokio::test]
    async fn test_second_load_comes_from_cache() {
        let source = Arc::new(CountingSource::new());
        let svc = service(source.clone());

        let first = svc.load(&TrackingQuery::default(), &CompanyScope::All).await.unwrap();
        let second = svc.load(&TrackingQuery::default(), &CompanyScope::All).await.unwrap();

        assert!(!first.meta.cached);
        assert!(second.meta.cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let refreshed = svc
            .load(
                &TrackingQuery {
                    refresh: true,
                    ..Default::default()
                },
                &CompanyScope::All,
            )
            .await
            .unwrap();
        assert!(!refreshed.meta.cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_response() {
        let source = Arc::new(CountingSource::new());
        let svc = service(source.clone());
        svc.load(&TrackingQuery::default(), &CompanyScope::All).await.unwrap();

        source.failing.store(true, Ordering::SeqCst);
        let refresh = TrackingQuery {
            refresh: true,
            ..Default::default()
        };

        let stale = svc.load(&refresh, &CompanyScope::All).await.unwrap();
        assert!(stale.meta.degraded);
        assert_eq!(stale.meta.total, 3);

        let err = svc
            .load(&refresh, &CompanyScope::Company("AMZ".into()))
            .await
            .unwrap_err();
        assert!(err.is_soft());
    }

    #[tokio::test]
    async fn test_company_names_and_unmatched() {
        let svc = service(Arc::new(CountingSource::new()));

        assert_eq!(svc.company_names().await.unwrap(), vec!["AMZ", "WCB"]);
        let unmatched = svc.unmatched().await.unwrap();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].source_id, "4");
    }
}
