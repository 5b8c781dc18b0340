//! Sincronização de empresas a partir dos títulos do Asana
//!
//! Estratégia "replace-all": todas as empresas são desativadas e, em seguida,
//! as encontradas na varredura são reativadas ou criadas. Os dois passos NÃO
//! são transacionais; durante a janela entre eles nenhuma empresa aparece
//! como ativa.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::field_resolver::resolve;
use super::record_assembler::{custom_field_bag, is_unattributed};
use super::task_source::TaskSource;
use super::title_parser::{clean_company_name, parse_title};
use crate::models::{CompanyCounts, NewCompany, RawExternalTask};
use crate::store::{CompanyStore, StoreResult};
use crate::utils::logging::{log_info, log_sync_summary, log_warning};
use crate::utils::normalization::{collapse_whitespace, slugify};
use crate::utils::AppResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_processed: usize,
    pub created: usize,
    pub updated: usize,
    /// Empresas inativas ao fim da varredura
    pub deactivated: u64,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub company: String,
    pub error: String,
}

/// Tarefa da qual não saiu nenhum nome de empresa
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTask {
    pub task_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub stats: SyncStats,
    /// Nomes canônicos ativos após a varredura
    pub companies: Vec<String>,
    pub error_details: Vec<SyncError>,
    pub skipped_tasks: Vec<SkippedTask>,
}

/// Resumo persistido (GET, sem varredura)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatusSummary {
    pub counts: CompanyCounts,
    pub active_companies: Vec<String>,
    pub source_configured: bool,
}

/// Nome canônico: espaços colapsados, maiúsculo
fn canonical_name(name: &str) -> String {
    collapse_whitespace(name).to_uppercase()
}

/// Empresa de uma tarefa, com as mesmas regras da montagem dos trackings
///
/// Sem título ou subtarefa → nenhuma. O campo EMPRESA só cobre títulos sem nome.
fn candidate_for(task: &RawExternalTask) -> Option<String> {
    let title = task.title()?;
    if task.is_subtask() {
        return None;
    }

    let mut name = parse_title(title).company_name;
    if name.is_empty() {
        name = clean_company_name(&resolve(&custom_field_bag(task), "company"));
    }

    (!is_unattributed(&name)).then_some(name)
}

pub struct CompanySyncService {
    source: Arc<dyn TaskSource>,
    store: Arc<dyn CompanyStore>,
}

impl CompanySyncService {
    pub fn new(source: Arc<dyn TaskSource>, store: Arc<dyn CompanyStore>) -> Self {
        Self { source, store }
    }

    pub async fn run(&self) -> AppResult<SyncReport> {
        // Falha da fonte aborta antes de qualquer escrita
        let tasks = self.source.fetch_tasks().await?;

        let mut report = SyncReport::default();
        let mut candidates: BTreeMap<String, String> = BTreeMap::new();

        for task in &tasks {
            let Some(name) = candidate_for(task) else {
                report.skipped_tasks.push(SkippedTask {
                    task_id: task.source_id.clone(),
                    title: task.title.clone().unwrap_or_default(),
                });
                continue;
            };
            let display = collapse_whitespace(&name);
            candidates.entry(canonical_name(&name)).or_insert(display);
        }

        report.stats.total_processed = tasks.len();
        log_info(&format!(
            "🏢 {} empresas candidatas em {} tarefas ({} sem empresa)",
            candidates.len(),
            tasks.len(),
            report.skipped_tasks.len()
        ));

        log_warning("⚠️ Desativando todas as empresas antes de reativar as encontradas (operação não transacional)");
        let previously_active = self.store.deactivate_all().await?;
        log_info(&format!("🔻 {} empresas desativadas", previously_active));

        for (name, display_name) in &candidates {
            match self.upsert(name, display_name).await {
                Ok(true) => report.stats.created += 1,
                Ok(false) => report.stats.updated += 1,
                Err(e) => {
                    log_warning(&format!("⚠️ Falha ao sincronizar empresa {}: {}", name, e));
                    report.error_details.push(SyncError {
                        company: name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }
            report.companies.push(name.clone());
        }

        report.stats.errors = report.error_details.len();
        report.stats.deactivated = self.store.count_by_status().await?.inactive;

        log_sync_summary(
            report.stats.created,
            report.stats.updated,
            report.stats.deactivated,
            report.stats.errors,
        );
        Ok(report)
    }

    pub async fn status(&self) -> AppResult<CompanyStatusSummary> {
        let counts = self.store.count_by_status().await?;
        let active_companies = self
            .store
            .list(true)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        Ok(CompanyStatusSummary {
            counts,
            active_companies,
            source_configured: self.source.is_configured(),
        })
    }

    /// Reativa ou cria; `true` quando criou
    async fn upsert(&self, name: &str, display_name: &str) -> StoreResult<bool> {
        if let Some(existing) = self.store.find_by_name(name).await? {
            self.store.reactivate(existing.id, display_name).await?;
            return Ok(false);
        }

        let slug = self.unique_slug(name).await?;
        self.store
            .insert(NewCompany {
                name: name.to_string(),
                display_name: display_name.to_string(),
                slug,
            })
            .await?;
        Ok(true)
    }

    /// `base`, `base-2`, `base-3`... contra todas as linhas
    async fn unique_slug(&self, name: &str) -> StoreResult<String> {
        let mut base = slugify(name);
        if base.is_empty() {
            base = "empresa".to_string();
        }

        if !self.store.slug_exists(&base).await? {
            return Ok(base);
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if !self.store.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}
