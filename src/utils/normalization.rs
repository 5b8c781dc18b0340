//! Funções de normalização de chaves, nomes de empresa e slugs
//!
//! Toda comparação de nomes vindos do Asana (chaves de custom fields, rótulos
//! das notas, nomes de empresa) passa por aqui para ser insensível a caixa e
//! acentuação.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Remove marcas diacríticas usando NFKD, preservando caixa e pontuação
///
/// # Exemplos
/// ```
/// use tracking_dashboard::utils::normalization::strip_accents;
///
/// assert_eq!(strip_accents("IMPORTAÇÃO"), "IMPORTACAO");
/// assert_eq!(strip_accents("Órgão Anuente"), "Orgao Anuente");
/// ```
pub fn strip_accents(input: &str) -> String {
    input.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normaliza uma chave de campo: sem acentos, minúscula, não-alfanuméricos
/// viram `_`, underscores colapsados e aparados
///
/// # Exemplos
/// ```
/// use tracking_dashboard::utils::normalization::normalize_key;
///
/// assert_eq!(normalize_key("Órgão Anuente"), "orgao_anuente");
/// assert_eq!(normalize_key("  ETD (Previsão) "), "etd_previsao");
/// assert_eq!(normalize_key("B/L"), "b_l");
/// ```
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut pending_sep = false;

    for c in strip_accents(key).chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Colapsa espaços internos e apara as bordas
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Gera o slug de um nome (ASCII minúsculo separado por hífens)
///
/// Usa `deunicode` para transliterar qualquer caractere não-ASCII.
///
/// # Exemplos
/// ```
/// use tracking_dashboard::utils::normalization::slugify;
///
/// assert_eq!(slugify("AMZ & CIA"), "amz-cia");
/// assert_eq!(slugify("Café & Cia"), "cafe-cia");
/// ```
pub fn slugify(input: &str) -> String {
    let ascii = deunicode::deunicode(input).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Compara dois nomes de empresa ignorando caixa, acentos e espaços extras
pub fn same_company(a: &str, b: &str) -> bool {
    let a = collapse_whitespace(&strip_accents(a)).to_uppercase();
    let b = collapse_whitespace(&strip_accents(b)).to_uppercase();
    !a.is_empty() && a == b
}
