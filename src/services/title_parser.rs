//! Extração de `(referência, empresa)` de títulos livres
//!
//! Os títulos dos processos seguem algumas convenções informais:
//!
//! - `122º WCB` / `17º AMZ (IMPORTAÇÃO)` (ordinal + empresa)
//! - `35 - FRUTAS BRASIL` (número, hífen, empresa)
//! - `8 NORDJA` (número, espaço, empresa)
//! - `EXPOFRUT (IMPORTAÇÃO DIRETA 01.2025)` (empresa primeiro)
//!
//! Os padrões são tentados em ordem e o primeiro que casar encerra a busca.
//! A ordem é política configurável via [`TitleParser::new`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ParsedTitle;
use crate::utils::normalization::collapse_whitespace;

/// Tokens que aparecem no começo de títulos mas nunca são empresas
pub const STOP_LIST: &[&str] = &[
    "PO", "REF", "PROCESSO", "CONTAINER", "CNTR", "BL", "AWB", "NAVIO", "VESSEL",
];

static ORDINAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[º°ª]\s*(.*)$").expect("regex de ordinal"));
static HYPHEN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[-–—]\s*(.*)$").expect("regex de hífen"));
static SPACE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+(.*)$").expect("regex de espaço"));
static LEADING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)").expect("regex de dígitos"));
static UPPERCASE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Lu}{3,}").expect("regex de maiúsculas"));

static DEFAULT_PARSER: Lazy<TitleParser> = Lazy::new(TitleParser::default);

/// Um formato de título reconhecido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitlePattern {
    /// `<dígitos>[º°ª] <NOME>( (...))?`
    OrdinalMarker,
    /// `<dígitos> [-–—] <NOME>`
    HyphenSeparated,
    /// `<dígitos> <NOME>`
    SpaceSeparated,
    /// `<NOME>( (...))?` sem dígitos no início
    CompanyFirst,
    /// Primeira sequência de 3+ letras maiúsculas em qualquer posição
    UppercaseFallback,
}

impl TitlePattern {
    pub const DEFAULT_ORDER: [TitlePattern; 5] = [
        TitlePattern::OrdinalMarker,
        TitlePattern::HyphenSeparated,
        TitlePattern::SpaceSeparated,
        TitlePattern::CompanyFirst,
        TitlePattern::UppercaseFallback,
    ];

    /// Retorna `(referência, nome bruto)` quando o padrão casa
    fn try_match(&self, title: &str) -> Option<(String, String)> {
        match self {
            TitlePattern::OrdinalMarker => prefixed(&ORDINAL_PREFIX, title),
            TitlePattern::HyphenSeparated => prefixed(&HYPHEN_PREFIX, title),
            TitlePattern::SpaceSeparated => prefixed(&SPACE_PREFIX, title),
            TitlePattern::CompanyFirst => {
                if title.starts_with(|c: char| c.is_ascii_digit()) {
                    return None;
                }
                uppercase_name(title).map(|name| (String::new(), name))
            }
            TitlePattern::UppercaseFallback => {
                let found = UPPERCASE_RUN.find(title)?;
                let sequence_ref = LEADING_DIGITS
                    .captures(title)
                    .map(|c| c[1].to_string())
                    .unwrap_or_default();
                Some((sequence_ref, found.as_str().to_string()))
            }
        }
    }
}

fn prefixed(re: &Regex, title: &str) -> Option<(String, String)> {
    let caps = re.captures(title)?;
    let name = uppercase_name(&caps[2])?;
    Some((caps[1].to_string(), name))
}

/// Sequência inicial de tokens em maiúsculas (letras, dígitos, `&`, `.`, `-`)
///
/// Para em parênteses, em um traço isolado ou no primeiro token com
/// minúsculas/outra pontuação. Um token terminado em `:`, `,` ou `;` entra
/// sem o sinal e encerra a sequência.
fn uppercase_name(text: &str) -> Option<String> {
    let mut tokens = Vec::new();

    for token in text.split_whitespace() {
        if token.starts_with('(') || matches!(token, "-" | "–" | "—") {
            break;
        }

        let (body, closes) = match token.strip_suffix([':', ',', ';']) {
            Some(stripped) => (stripped, true),
            None => (token, false),
        };

        if body.is_empty() || !body.chars().all(is_name_char) {
            break;
        }
        tokens.push(body);

        if closes {
            break;
        }
    }

    let name = tokens.join(" ");
    if name.chars().any(char::is_alphabetic) {
        Some(name)
    } else {
        None
    }
}

fn is_name_char(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '&' | '.' | '-')
}

/// Limpeza final do nome: maiúsculas, espaços colapsados, sem `.`/`-` no fim
///
/// Retorna vazio para nomes da stop-list ou com menos de 2 caracteres.
pub fn clean_company_name(raw: &str) -> String {
    let upper = collapse_whitespace(&raw.to_uppercase());
    let cleaned = upper.trim_end_matches(['.', '-', ' ']).to_string();

    if cleaned.chars().count() < 2 || STOP_LIST.contains(&cleaned.as_str()) {
        return String::new();
    }
    cleaned
}

/// Parser de títulos com ordem de padrões configurável
#[derive(Debug, Clone)]
pub struct TitleParser {
    patterns: Vec<TitlePattern>,
}

impl Default for TitleParser {
    fn default() -> Self {
        Self::new(TitlePattern::DEFAULT_ORDER.to_vec())
    }
}

impl TitleParser {
    pub fn new(patterns: Vec<TitlePattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[TitlePattern] {
        &self.patterns
    }

    /// Decompõe um título; título vazio ou sem padrão reconhecido → ambos vazios
    pub fn parse(&self, title: &str) -> ParsedTitle {
        let title = title.trim();
        if title.is_empty() {
            return ParsedTitle::empty();
        }

        for pattern in &self.patterns {
            if let Some((sequence_ref, raw_name)) = pattern.try_match(title) {
                tracing::trace!("Título '{}' casou com {:?}", title, pattern);
                return ParsedTitle::new(sequence_ref, clean_company_name(&raw_name));
            }
        }

        ParsedTitle::empty()
    }
}

/// Atalho para o parser com a ordem padrão
pub fn parse_title(title: &str) -> ParsedTitle {
    DEFAULT_PARSER.parse(title)
}
