//! Agregação de métricas do dashboard (KPIs, distribuições, linhas do tempo)

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::models::{Distribution, TimelineBucket, Tracking, TrackingMetrics};
use crate::utils::dates::parse_flexible_date;

/// Quantidade de meses mantidos em cada linha do tempo
pub const TIMELINE_MONTHS: usize = 12;

/// Percentual inteiro de concluídos, 0 quando não há registros
pub fn effective_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rate = (completed.min(total) as f64 / total as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u8
}

fn bump(dist: &mut Distribution, key: &str) {
    let key = key.trim();
    if !key.is_empty() {
        *dist.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// Agrupa datas por mês e mantém os 12 meses mais recentes em ordem crescente
fn timeline<'a>(values: impl Iterator<Item = &'a str>) -> Vec<TimelineBucket> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for raw in values {
        if let Some(date) = parse_flexible_date(raw) {
            *months.entry((date.year(), date.month())).or_insert(0) += 1;
        }
    }

    let skip = months.len().saturating_sub(TIMELINE_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), count)| TimelineBucket {
            period: format!("{:04}-{:02}", year, month),
            year,
            month,
            count,
        })
        .collect()
}

/// Calcula as métricas de uma coleção em uma única passada
pub fn aggregate(trackings: &[Tracking]) -> TrackingMetrics {
    let mut metrics = TrackingMetrics {
        total: trackings.len(),
        ..Default::default()
    };

    for tracking in trackings {
        if tracking.status.is_completed() {
            metrics.completed += 1;
        }

        bump(&mut metrics.status_distribution, tracking.status.label());
        bump(&mut metrics.company_distribution, &tracking.company_name);
        bump(&mut metrics.exporter_distribution, &tracking.transport.exporter);
        bump(&mut metrics.carrier_distribution, &tracking.transport.carrier_company);
        bump(&mut metrics.vessel_distribution, &tracking.transport.vessel);
        bump(&mut metrics.terminal_distribution, &tracking.transport.terminal);
        bump(&mut metrics.responsible_distribution, &tracking.schedule.responsible);
        for product in &tracking.transport.products {
            bump(&mut metrics.product_distribution, product);
        }
        for agency in &tracking.regulatory.agencies {
            bump(&mut metrics.regulatory_agency_distribution, agency);
        }
    }

    metrics.active = metrics.total - metrics.completed;
    metrics.effective_rate = effective_rate(metrics.completed, metrics.total);
    metrics.etd_timeline = timeline(trackings.iter().map(|t| t.schedule.etd.as_str()));
    metrics.eta_timeline = timeline(trackings.iter().map(|t| t.schedule.eta.as_str()));

    metrics
}
