use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::normalization::{normalize_key, strip_accents};

/// Título decomposto em referência sequencial e empresa
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTitle {
    pub sequence_ref: String,
    pub company_name: String,
}

impl ParsedTitle {
    pub fn new(sequence_ref: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            sequence_ref: sequence_ref.into(),
            company_name: company_name.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Status de um processo
///
/// Conjunto fechado com fallback para o texto livre do campo "Status".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackingStatus {
    EmProgresso,
    Concluido,
    Atrasado,
    Pendente,
    Cancelado,
    Other(String),
}

impl TrackingStatus {
    pub fn label(&self) -> &str {
        match self {
            TrackingStatus::EmProgresso => "Em Progresso",
            TrackingStatus::Concluido => "Concluído",
            TrackingStatus::Atrasado => "Atrasado",
            TrackingStatus::Pendente => "Pendente",
            TrackingStatus::Cancelado => "Cancelado",
            TrackingStatus::Other(s) => s,
        }
    }

    /// Mapeia o texto de um campo "Status" para o conjunto fechado
    pub fn from_label(raw: &str) -> Self {
        let key = normalize_key(raw);
        match key.as_str() {
            "em_progresso" | "em_andamento" | "andamento" | "in_progress" | "em_transito"
            | "ativo" => TrackingStatus::EmProgresso,
            "concluido" | "finalizado" | "entregue" | "completed" | "done" | "encerrado" => {
                TrackingStatus::Concluido
            }
            "atrasado" | "em_atraso" | "overdue" | "late" => TrackingStatus::Atrasado,
            "pendente" | "aguardando" | "pending" | "on_hold" => TrackingStatus::Pendente,
            "cancelado" | "cancelled" | "canceled" => TrackingStatus::Cancelado,
            _ => TrackingStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TrackingStatus::Concluido)
    }

    /// Comparação usada no filtro `?status=` (ignora caixa e acentos)
    pub fn matches_filter(&self, filter: &str) -> bool {
        let wanted = strip_accents(filter.trim()).to_lowercase();
        !wanted.is_empty() && strip_accents(self.label()).to_lowercase() == wanted
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TrackingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TrackingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TrackingStatus::from_label(&raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    pub exporter: String,
    pub carrier_company: String,
    pub vessel: String,
    pub bill_of_lading: String,
    pub containers: Vec<String>,
    pub terminal: String,
    pub products: Vec<String>,
    pub forwarder: String,
    pub customs_broker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub etd: String,
    pub eta: String,
    pub freetime_end: String,
    pub storage_end: String,
    pub responsible: String,
    pub stage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Regulatory {
    pub agencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub invoice: String,
    pub bill_of_lading: String,
}

/// Registro canônico de um embarque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub id: String,
    pub source_id: String,
    pub title: String,
    pub company_name: String,
    pub sequence_ref: String,
    pub status: TrackingStatus,
    pub transport: Transport,
    pub schedule: Schedule,
    pub regulatory: Regulatory,
    pub documentation: Documentation,
    pub custom_fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Registro sem empresa atribuível (lista de diagnóstico)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedRecord {
    pub source_id: String,
    pub title: String,
    pub sequence_ref: String,
    /// Nome rejeitado (vazio, UNKNOWN, NÃO_IDENTIFICADO)
    pub attempted_company: String,
    pub status: TrackingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&TrackingStatus::Concluido).unwrap();
        assert_eq!(json, "\"Concluído\"");

        let parsed: TrackingStatus = serde_json::from_str("\"Aguardando liberação\"").unwrap();
        assert_eq!(parsed, TrackingStatus::Other("Aguardando liberação".into()));
    }

    #[test]
    fn test_from_label_ignores_case_and_accents() {
        assert_eq!(TrackingStatus::from_label("CONCLUIDO"), TrackingStatus::Concluido);
        assert_eq!(TrackingStatus::from_label("em progresso"), TrackingStatus::EmProgresso);
        assert_eq!(TrackingStatus::from_label("Em atraso"), TrackingStatus::Atrasado);
    }

    #[test]
    fn test_matches_filter() {
        assert!(TrackingStatus::Concluido.matches_filter("concluido"));
        assert!(TrackingStatus::Atrasado.matches_filter("Atrasado"));
        assert!(!TrackingStatus::Atrasado.matches_filter(""));
    }

    #[test]
    fn test_tracking_serializes_camel_case() {
        let tracking = Tracking {
            id: "122o-wcb".into(),
            source_id: "1".into(),
            title: "122º WCB".into(),
            company_name: "WCB".into(),
            sequence_ref: "122".into(),
            status: TrackingStatus::EmProgresso,
            transport: Transport::default(),
            schedule: Schedule::default(),
            regulatory: Regulatory::default(),
            documentation: Documentation::default(),
            custom_fields: BTreeMap::new(),
            modified_at: None,
        };
        let value = serde_json::to_value(&tracking).unwrap();
        assert_eq!(value["companyName"], "WCB");
        assert_eq!(value["transport"]["carrierCompany"], "");
        assert_eq!(value["status"], "Em Progresso");
    }
}
