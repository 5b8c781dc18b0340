//! Resolução de campos canônicos a partir de chaves heterogêneas
//!
//! O mesmo dado aparece com nomes diferentes conforme o projeto do Asana
//! ("Exportador", "EXPORTER", "Shipper"...). A tabela de aliases lista, por
//! campo canônico, os sinônimos conhecidos em ordem de preferência.
//!
//! Resolução em duas fases:
//! 1. igualdade exata da chave normalizada com algum sinônimo (na ordem);
//! 2. só se a fase 1 falhar, contenção de substring entre chave e sinônimo.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::utils::normalization::normalize_key;

/// Chave original ou normalizada → valor textual
pub type FieldBag = BTreeMap<String, String>;

/// Campo canônico → sinônimos em ordem de preferência (já normalizados)
pub static ALIAS_TABLE: &[(&str, &[&str])] = &[
    ("company", &["empresa", "cliente", "company", "customer", "client"]),
    (
        "exporter",
        &["exportador", "exporter", "shipper", "embarcador", "fornecedor", "supplier"],
    ),
    ("importer", &["importador", "importer", "consignatario", "consignee"]),
    (
        "carrierCompany",
        &["armador", "companhia_maritima", "cia_maritima", "carrier", "shipping_line"],
    ),
    ("vessel", &["navio", "vessel", "embarcacao", "ship"]),
    (
        "billOfLading",
        &["bl", "b_l", "bill_of_lading", "conhecimento_de_embarque", "numero_bl"],
    ),
    (
        "containers",
        &["container", "containers", "conteiner", "conteineres", "cntr", "contentor"],
    ),
    ("terminal", &["terminal", "terminal_portuario", "porto_de_descarga"]),
    (
        "products",
        &["produto", "produtos", "product", "products", "mercadoria", "mercadorias"],
    ),
    ("commodity", &["commodity", "ncm", "tipo_de_carga"]),
    (
        "etd",
        &["etd", "data_de_embarque", "previsao_de_embarque", "departure"],
    ),
    ("eta", &["eta", "data_de_chegada", "previsao_de_chegada", "chegada", "arrival"]),
    (
        "freetimeEnd",
        &["fim_do_free_time", "free_time", "freetime", "demurrage"],
    ),
    (
        "storageEnd",
        &["fim_da_armazenagem", "vencimento_armazenagem", "armazenagem", "storage"],
    ),
    ("responsible", &["responsavel", "responsible", "analista", "owner"]),
    (
        "customsBroker",
        &["despachante", "despachante_aduaneiro", "customs_broker", "broker"],
    ),
    (
        "forwarder",
        &["agente_de_carga", "agente", "forwarder", "freight_forwarder"],
    ),
    ("invoice", &["invoice", "fatura", "commercial_invoice", "nota_fiscal"]),
    (
        "regulatoryAgencies",
        &["orgao_anuente", "orgaos_anuentes", "anuente", "anuentes", "regulatory_agency", "lpco"],
    ),
    ("status", &["status", "situacao"]),
    ("stage", &["etapa", "fase", "stage", "estagio"]),
    ("currency", &["moeda", "currency"]),
    ("value", &["valor", "value", "valor_fob", "valor_total", "amount"]),
    ("incoterm", &["incoterm", "incoterms"]),
    ("origin", &["origem", "porto_de_origem", "origin", "pol"]),
    ("destination", &["destino", "porto_de_destino", "destination", "pod"]),
];

/// Termos até este tamanho só casam em fronteira de `_` na fase de contenção
const SHORT_TERM_LEN: usize = 3;

static ARRAY_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;\n|/]").expect("regex de separadores"));

/// Sinônimos de um campo canônico; nomes desconhecidos resolvem contra si mesmos
pub fn synonyms(canonical: &str) -> Vec<String> {
    ALIAS_TABLE
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, list)| list.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| vec![normalize_key(canonical)])
}

/// Resolve um campo canônico; retorna vazio quando nada casa
///
/// Nunca sintetiza valores e nunca altera `fields`.
pub fn resolve(fields: &FieldBag, canonical: &str) -> String {
    let terms: Vec<String> = synonyms(canonical)
        .iter()
        .map(|s| normalize_key(s))
        .filter(|s| !s.is_empty())
        .collect();

    let entries: Vec<(String, &str)> = fields
        .iter()
        .map(|(k, v)| (normalize_key(k), v.trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();

    // Fase 1: igualdade exata, na ordem dos sinônimos
    for term in &terms {
        if let Some((_, value)) = entries.iter().find(|(key, _)| key == term) {
            return value.to_string();
        }
    }

    // Fase 2: contenção em qualquer direção
    for term in &terms {
        let found = entries.iter().find(|(key, _)| {
            contains_term(key, term) || (key.len() >= SHORT_TERM_LEN && contains_term(term, key))
        });
        if let Some((_, value)) = found {
            return value.to_string();
        }
    }

    String::new()
}

/// Como [`resolve`], separando em lista sem vazios nem duplicatas
pub fn resolve_array(fields: &FieldBag, canonical: &str) -> Vec<String> {
    split_values(&resolve(fields, canonical))
}

/// Divide em `[,;\n|/]`, apara, descarta vazios e remove duplicatas (mantém a primeira)
pub fn split_values(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in ARRAY_SEPARATORS.split(raw) {
        let part = part.trim();
        if !part.is_empty() && !out.iter().any(|existing| existing == part) {
            out.push(part.to_string());
        }
    }
    out
}

fn contains_term(haystack: &str, needle: &str) -> bool {
    if needle.len() <= SHORT_TERM_LEN {
        format!("_{}_", haystack).contains(&format!("_{}_", needle))
    } else {
        haystack.contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> FieldBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_first_listed_synonym_wins() {
        let fields = bag(&[("exporter", "B LTDA"), ("EXPORTADOR", "A LTDA")]);
        assert_eq!(resolve(&fields, "exporter"), "A LTDA");
    }

    #[test]
    fn test_exact_match_ignores_case_and_accents() {
        let fields = bag(&[("Órgão Anuente", "MAPA"), ("Responsável", "Carla")]);
        assert_eq!(resolve(&fields, "regulatoryAgencies"), "MAPA");
        assert_eq!(resolve(&fields, "responsible"), "Carla");
    }

    #[test]
    fn test_substring_fallback() {
        let fields = bag(&[("Navio Previsto", "MSC LORETO"), ("Data ETA (porto)", "2025-03-01")]);
        assert_eq!(resolve(&fields, "vessel"), "MSC LORETO");
        assert_eq!(resolve(&fields, "eta"), "2025-03-01");
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        // "armador_secundario" contém o primeiro sinônimo, mas "carrier" é exato
        let fields = bag(&[("armador_secundario", "X"), ("Carrier", "MAERSK")]);
        assert_eq!(resolve(&fields, "carrierCompany"), "MAERSK");
    }

    #[test]
    fn test_short_terms_need_token_boundary() {
        let fields = bag(&[("Etapa", "Pré Embarque")]);
        assert_eq!(resolve(&fields, "eta"), "");

        let fields = bag(&[("Número BL", "MEDU123")]);
        assert_eq!(resolve(&fields, "billOfLading"), "MEDU123");
    }

    #[test]
    fn test_empty_values_are_never_found() {
        let fields = bag(&[("navio", "   "), ("vessel", "CMA CGM")]);
        assert_eq!(resolve(&fields, "vessel"), "CMA CGM");
        assert_eq!(resolve(&bag(&[]), "vessel"), "");
    }

    #[test]
    fn test_unknown_canonical_resolves_against_itself() {
        let fields = bag(&[("Peso Bruto", "20t")]);
        assert_eq!(resolve(&fields, "peso bruto"), "20t");
        assert_eq!(synonyms("peso bruto"), vec!["peso_bruto".to_string()]);
    }

    #[test]
    fn test_resolve_array() {
        let fields = bag(&[("Containers", "MSCU1, TGHU2;MSCU1 | \nCAIU3/ ")]);
        assert_eq!(resolve_array(&fields, "containers"), vec!["MSCU1", "TGHU2", "CAIU3"]);
        assert!(resolve_array(&fields, "products").is_empty());
    }

    #[test]
    fn test_resolve_is_pure() {
        let fields = bag(&[("Exportador", "A")]);
        let before = fields.clone();
        assert_eq!(resolve(&fields, "exporter"), resolve(&fields, "exporter"));
        assert_eq!(fields, before);
    }
}
