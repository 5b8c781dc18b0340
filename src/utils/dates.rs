//! Parsing tolerante de datas vindas de custom fields e notas

use chrono::{DateTime, NaiveDate};

/// Formatos aceitos, na ordem de tentativa
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y", "%Y.%m.%d", "%d-%m-%Y",
];

/// Tenta interpretar uma data em vários formatos comuns
///
/// Aceita `YYYY-MM-DD`, `DD/MM/YYYY`, `YYYY/MM/DD`, `DD.MM.YYYY`,
/// `YYYY.MM.DD`, `DD-MM-YYYY` e timestamps RFC3339 (só a data é usada).
/// Retorna `None` para qualquer outra coisa; nunca falha.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }

    // "2025-03-01T00:00:00" sem fuso ou "2025-03-01 10:00": usa só o prefixo
    let head = value.split(['T', ' ']).next().unwrap_or(value);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_supported_formats() {
        assert_eq!(parse_flexible_date("2025-03-01"), Some(ymd(2025, 3, 1)));
        assert_eq!(parse_flexible_date("15/04/2025"), Some(ymd(2025, 4, 15)));
        assert_eq!(parse_flexible_date("2025/04/15"), Some(ymd(2025, 4, 15)));
        assert_eq!(parse_flexible_date("15.04.2025"), Some(ymd(2025, 4, 15)));
        assert_eq!(parse_flexible_date("2025.04.15"), Some(ymd(2025, 4, 15)));
        assert_eq!(parse_flexible_date("15-04-2025"), Some(ymd(2025, 4, 15)));
        assert_eq!(
            parse_flexible_date("2025-02-10T18:30:00.000Z"),
            Some(ymd(2025, 2, 10))
        );
        assert_eq!(parse_flexible_date(" 2025-02-10 09:00 "), Some(ymd(2025, 2, 10)));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("a confirmar"), None);
        assert_eq!(parse_flexible_date("31/02/2025"), None);
        assert_eq!(parse_flexible_date("2025-13-01"), None);
    }
}
