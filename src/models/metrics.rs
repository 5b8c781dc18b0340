use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contagem de um histograma nomeado
pub type Distribution = BTreeMap<String, usize>;

/// Um mês de uma linha do tempo (ETD/ETA)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBucket {
    /// `YYYY-MM`
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

/// Métricas derivadas de uma coleção de trackings (nunca persistidas)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingMetrics {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Percentual inteiro em [0, 100]
    pub effective_rate: u8,
    pub status_distribution: Distribution,
    pub company_distribution: Distribution,
    pub exporter_distribution: Distribution,
    pub carrier_distribution: Distribution,
    pub vessel_distribution: Distribution,
    pub terminal_distribution: Distribution,
    pub product_distribution: Distribution,
    pub regulatory_agency_distribution: Distribution,
    pub responsible_distribution: Distribution,
    pub etd_timeline: Vec<TimelineBucket>,
    pub eta_timeline: Vec<TimelineBucket>,
}
