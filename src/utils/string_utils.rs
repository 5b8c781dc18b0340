//! Utilitários para manipulação segura de strings UTF-8

/// Trunca em `max_chars` caracteres (nunca no meio de um caractere UTF-8)
/// e acrescenta o sufixo se houve corte
///
/// # Exemplo
/// ```
/// use tracking_dashboard::utils::string_utils::truncate_with_suffix;
///
/// assert_eq!(truncate_with_suffix("Olá, mundo!", 3, "..."), "Olá...");
/// ```
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", s[..idx].trim_end(), suffix),
        None => s.to_string(),
    }
}

/// Prévia de um comentário em uma linha: quebras viram espaço e o texto é truncado
pub fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_with_suffix(&single_line, max_chars, "...")
}
