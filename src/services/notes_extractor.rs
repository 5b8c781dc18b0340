//! Extração de pares chave/valor das notas em texto livre
//!
//! Muitos processos antigos guardam os dados nas notas ("Navio: MSC LORETO")
//! em vez de custom fields. Cada rótulo tem uma regex ancorada no início da
//! linha; a primeira ocorrência de cada rótulo vence.

use once_cell::sync::Lazy;
use regex::Regex;

use super::field_resolver::FieldBag;

/// (chave no FieldBag, alternativas do rótulo)
const NOTE_LABELS: &[(&str, &str)] = &[
    ("navio", r"navio|vessel"),
    ("exportador", r"exportador|shipper"),
    ("armador", r"armador"),
    ("bl", r"b/?l|bill of lading"),
    ("container", r"containers?|cntr|cont[eê]iner(?:es)?"),
    ("terminal", r"terminal"),
    ("etd", r"etd"),
    ("eta", r"eta"),
    ("produto", r"produtos?|mercadorias?"),
    ("despachante", r"despachante"),
    ("agente de carga", r"agente de carga|forwarder"),
    ("free time", r"free ?time"),
    ("invoice", r"invoice|fatura"),
    ("orgao anuente", r"[oó]rg[aã]os? anuentes?|anuentes?"),
    ("responsavel", r"respons[aá]vel"),
    ("status", r"status|situa[cç][aã]o"),
    ("etapa", r"etapa|fase"),
];

static NOTE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    NOTE_LABELS
        .iter()
        .filter_map(|(key, label)| {
            let pattern = format!(r"(?im)^[ \t]*(?:{})[ \t]*(?:[:\-][ \t]*|[ \t]+)(.+?)[ \t]*$", label);
            match Regex::new(&pattern) {
                Ok(re) => Some((*key, re)),
                Err(e) => {
                    tracing::error!("❌ Regex inválida para o rótulo '{}': {}", key, e);
                    None
                }
            }
        })
        .collect()
});

/// Extrai os rótulos conhecidos das notas
pub fn extract_from_notes(notes: &str) -> FieldBag {
    let mut bag = FieldBag::new();
    if notes.trim().is_empty() {
        return bag;
    }

    for (key, re) in NOTE_PATTERNS.iter() {
        let value = re
            .captures_iter(notes)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .find(|v| !v.is_empty());

        if let Some(value) = value {
            bag.insert((*key).to_string(), value.to_string());
        }
    }

    bag
}
