//! Montagem do registro canônico `Tracking` a partir de uma tarefa bruta
//!
//! Etapas, nesta ordem:
//! 1. título → `(referência, empresa)`; título vazio e subtarefas são descartados
//! 2. custom fields → FieldBag (chave original + chave normalizada)
//! 3. notas → FieldBag pelos rótulos conhecidos
//! 4. fusão: custom fields vencem as notas
//! 5. resolução de cada campo canônico
//! 6. status e etapa pelas regras de prioridade
//!
//! Função pura: depende só da tarefa, da data de referência e das tabelas
//! estáticas.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::field_resolver::{resolve, split_values, FieldBag};
use super::notes_extractor::extract_from_notes;
use super::title_parser::{clean_company_name, TitleParser};
use crate::models::{
    Documentation, RawExternalTask, Regulatory, Schedule, Tracking, TrackingStatus, Transport,
    UnmatchedRecord,
};
use crate::utils::dates::parse_flexible_date;
use crate::utils::logging::log_trackings_assembled;
use crate::utils::normalization::{normalize_key, slugify};

pub const STAGE_FINISHED: &str = "Processos Finalizados";
pub const STAGE_DELIVERY: &str = "Entrega";
pub const STAGE_IN_TRANSIT: &str = "Em Trânsito";
pub const STAGE_PRE_SHIPMENT: &str = "Pré Embarque";

/// Nomes de empresa que significam "não atribuído"
const UNMATCHED_SENTINELS: &[&str] = &["unknown", "nao_identificado", "n_a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    EmptyTitle,
    Subtask,
}

/// Resultado da montagem de uma tarefa
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Kept(Tracking),
    /// Sem empresa atribuível: só aparece na lista de diagnóstico
    Unmatched(UnmatchedRecord),
    Excluded(ExclusionReason),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledBatch {
    pub kept: Vec<Tracking>,
    pub unmatched: Vec<UnmatchedRecord>,
    pub excluded_count: usize,
}

/// Empresa vazia ou sentinela de "não identificado"
pub fn is_unattributed(company: &str) -> bool {
    let key = normalize_key(company);
    key.is_empty() || UNMATCHED_SENTINELS.contains(&key.as_str())
}

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    today: NaiveDate,
    parser: TitleParser,
}

impl RecordAssembler {
    /// `today` é a data de referência para "Atrasado" e para a etapa
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            parser: TitleParser::default(),
        }
    }

    pub fn with_parser(mut self, parser: TitleParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn assemble(&self, raw: &RawExternalTask) -> Assembly {
        let Some(title) = raw.title() else {
            return Assembly::Excluded(ExclusionReason::EmptyTitle);
        };
        if raw.is_subtask() {
            return Assembly::Excluded(ExclusionReason::Subtask);
        }

        let parsed = self.parser.parse(title);

        let mut merged = custom_field_bag(raw);
        for (key, value) in extract_from_notes(&raw.notes) {
            merged.entry(key).or_insert(value);
        }

        let field = |canonical: &str| resolve(&merged, canonical);
        let list = |canonical: &str| split_values(&field(canonical));

        // A empresa vem do título; o campo "empresa" só cobre títulos sem nome
        let company_name = if parsed.company_name.is_empty() {
            clean_company_name(&field("company"))
        } else {
            parsed.company_name.clone()
        };

        let etd = field("etd");
        let eta = field("eta");
        let status = self.derive_status(raw, &field("status"), &eta);

        if is_unattributed(&company_name) {
            return Assembly::Unmatched(UnmatchedRecord {
                source_id: raw.source_id.clone(),
                title: title.to_string(),
                sequence_ref: parsed.sequence_ref,
                attempted_company: company_name,
                status,
            });
        }

        let stage = self.derive_stage(&field("stage"), &status, &etd, &eta);

        let exporter = non_empty_or(field("exporter"), &company_name);
        let responsible = non_empty_or(field("responsible"), raw.assignee.as_deref().unwrap_or(""));
        let bill_of_lading = field("billOfLading");
        let mut products = list("products");
        if products.is_empty() {
            products = list("commodity");
        }

        let slug = slugify(title);
        let id = if slug.is_empty() {
            format!("task-{}", raw.source_id)
        } else {
            slug
        };

        Assembly::Kept(Tracking {
            id,
            source_id: raw.source_id.clone(),
            title: title.to_string(),
            company_name,
            sequence_ref: parsed.sequence_ref,
            status,
            transport: Transport {
                exporter,
                carrier_company: field("carrierCompany"),
                vessel: field("vessel"),
                bill_of_lading: bill_of_lading.clone(),
                containers: list("containers"),
                terminal: field("terminal"),
                products,
                forwarder: field("forwarder"),
                customs_broker: field("customsBroker"),
            },
            schedule: Schedule {
                etd,
                eta,
                freetime_end: field("freetimeEnd"),
                storage_end: field("storageEnd"),
                responsible,
                stage,
            },
            regulatory: Regulatory {
                agencies: list("regulatoryAgencies"),
            },
            documentation: Documentation {
                invoice: field("invoice"),
                bill_of_lading,
            },
            custom_fields: merged,
            modified_at: raw.modified_at,
        })
    }

    /// Campo explícito › concluída › vencida › em progresso
    fn derive_status(&self, raw: &RawExternalTask, explicit: &str, eta: &str) -> TrackingStatus {
        if !explicit.trim().is_empty() {
            return TrackingStatus::from_label(explicit);
        }
        if raw.completed {
            return TrackingStatus::Concluido;
        }

        let due = raw
            .due_on
            .as_deref()
            .and_then(parse_flexible_date)
            .or_else(|| parse_flexible_date(eta));
        match due {
            Some(date) if date < self.today => TrackingStatus::Atrasado,
            _ => TrackingStatus::EmProgresso,
        }
    }

    /// Campo explícito › finalizado › ETA atingido › ETD atingido › pré-embarque
    fn derive_stage(&self, explicit: &str, status: &TrackingStatus, etd: &str, eta: &str) -> String {
        if !explicit.trim().is_empty() {
            return explicit.trim().to_string();
        }
        if status.is_completed() {
            return STAGE_FINISHED.to_string();
        }

        let reached = |raw: &str| {
            parse_flexible_date(raw)
                .map(|date| date <= self.today)
                .unwrap_or(false)
        };

        if reached(eta) {
            STAGE_DELIVERY.to_string()
        } else if reached(etd) {
            STAGE_IN_TRANSIT.to_string()
        } else {
            STAGE_PRE_SHIPMENT.to_string()
        }
    }

    /// Monta um lote separando mantidos, sem empresa e descartados
    pub fn partition(&self, tasks: &[RawExternalTask]) -> AssembledBatch {
        let mut batch = AssembledBatch::default();
        let mut seen_ids = HashSet::new();

        for raw in tasks {
            match self.assemble(raw) {
                Assembly::Kept(mut tracking) => {
                    // Títulos repetidos: o id recebe o id da tarefa de origem
                    if !seen_ids.insert(tracking.id.clone()) {
                        tracking.id = format!("{}-{}", tracking.id, tracking.source_id);
                        seen_ids.insert(tracking.id.clone());
                    }
                    batch.kept.push(tracking);
                }
                Assembly::Unmatched(record) => batch.unmatched.push(record),
                Assembly::Excluded(_) => batch.excluded_count += 1,
            }
        }

        log_trackings_assembled(batch.kept.len(), batch.unmatched.len(), batch.excluded_count);
        batch
    }
}

/// Atalho: monta com a data de hoje e devolve só registros mantidos
pub fn assemble(raw: &RawExternalTask) -> Option<Tracking> {
    match RecordAssembler::new(chrono::Utc::now().date_naive()).assemble(raw) {
        Assembly::Kept(tracking) => Some(tracking),
        _ => None,
    }
}

/// Custom fields → FieldBag com a chave original e a normalizada
pub(crate) fn custom_field_bag(raw: &RawExternalTask) -> FieldBag {
    let mut bag = FieldBag::new();

    for entry in &raw.custom_fields {
        let Some(value) = entry.value.as_ref().map(|v| v.display()) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }

        bag.entry(entry.name.clone()).or_insert_with(|| value.clone());
        let normalized = normalize_key(&entry.name);
        if !normalized.is_empty() {
            bag.entry(normalized).or_insert(value);
        }
    }

    bag
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
