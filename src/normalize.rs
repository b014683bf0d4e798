//! Normalização de dados extraídos do SHIFT.
//!
//! O SHIFT devolve datas no formato `DD/MM/YYYY - HH:MM:SS`, tamanhos de lesão
//! como texto livre ("1,5 cm") e campos ausentes viram o valor-sentinela
//! [`SENTINEL`]. Tudo que o restante do robô consome passa por aqui antes.

use chrono::{NaiveDate, NaiveDateTime};

/// Valor-sentinela gravado no lugar de qualquer campo que não pôde ser
/// extraído. Mantém o registro completo sem bloquear o pipeline.
pub const SENTINEL: &str = "Não especificado (NI)";

/// True quando o valor está vazio ou é o sentinela "não especificado".
pub fn is_unspecified(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.to_lowercase() == SENTINEL.to_lowercase()
}

/// Substitui valores ausentes pelo sentinela; caso contrário devolve o valor
/// aparado. Ponto único onde a política "degradar, não abortar" é aplicada.
pub fn or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => SENTINEL.to_string(),
    }
}

/// Converte `01/03/2024 - 18:34:36` para `2024-03-01T18:34:36`.
///
/// Entradas já em ISO são devolvidas sem alteração, então a conversão é
/// idempotente. Datas que não casam com nenhum dos dois formatos viram `None`.
pub fn to_iso_datetime(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    // Variante com sufixo Z usada por versões antigas do backend.
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    NaiveDateTime::parse_from_str(trimmed, "%d/%m/%Y - %H:%M:%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Extrai o primeiro número de um texto de tamanho de lesão ("3,0 cm" → 3.0).
/// Aceita vírgula ou ponto como separador decimal.
pub fn parse_size_cm(raw: &str) -> Option<f64> {
    let mut number = String::new();
    let mut seen_digit = false;
    for ch in raw.chars() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                number.push(ch);
            }
            ',' | '.' if seen_digit && !number.contains('.') => number.push('.'),
            _ if seen_digit => break,
            _ => {}
        }
    }
    if !seen_digit {
        return None;
    }
    number.trim_end_matches('.').parse::<f64>().ok()
}

/// Converte uma data ISO (`2024-03-01` ou `2024-03-01T18:34:36`) para o
/// formato de digitação do SIS MAMA (`01032024`).
pub fn to_ddmmyyyy(iso: &str) -> Option<String> {
    let date_part = iso.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d%m%Y").to_string())
}

/// Remove acentos dos caracteres usados em nomes de municípios brasileiros.
/// O campo de município do SIS MAMA não aceita caracteres acentuados.
pub fn strip_diacritics(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Timestamp local no formato que o backend espera (`isoformat` sem fuso).
pub fn now_iso() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_date_converts_to_iso() {
        assert_eq!(
            to_iso_datetime("01/03/2024 - 18:34:36").as_deref(),
            Some("2024-03-01T18:34:36")
        );
    }

    #[test]
    fn iso_conversion_is_idempotent() {
        let once = to_iso_datetime("01/03/2024 - 18:34:36").unwrap();
        let twice = to_iso_datetime(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn legacy_zulu_suffix_is_accepted() {
        assert_eq!(
            to_iso_datetime("2023-05-01T12:00:00Z").as_deref(),
            Some("2023-05-01T12:00:00")
        );
    }

    #[test]
    fn invalid_dates_become_none() {
        assert_eq!(to_iso_datetime(""), None);
        assert_eq!(to_iso_datetime("32/13/2024 - 99:00:00"), None);
        assert_eq!(to_iso_datetime(SENTINEL), None);
    }

    #[test]
    fn size_parsing_accepts_comma_and_dot() {
        assert_eq!(parse_size_cm("1,5 cm"), Some(1.5));
        assert_eq!(parse_size_cm("3.0 cm"), Some(3.0));
        assert_eq!(parse_size_cm("7 cm"), Some(7.0));
        assert_eq!(parse_size_cm("15 cm"), Some(15.0));
        assert_eq!(parse_size_cm("0 cm"), Some(0.0));
    }

    #[test]
    fn size_parsing_rejects_text_without_digits() {
        assert_eq!(parse_size_cm(SENTINEL), None);
        assert_eq!(parse_size_cm(""), None);
    }

    #[test]
    fn unspecified_detection() {
        assert!(is_unspecified(""));
        assert!(is_unspecified("   "));
        assert!(is_unspecified("Não especificado (NI)"));
        assert!(is_unspecified("não especificado (ni)"));
        assert!(!is_unspecified("QSL"));
    }

    #[test]
    fn or_sentinel_fills_gaps() {
        assert_eq!(or_sentinel(None), SENTINEL);
        assert_eq!(or_sentinel(Some("  ".into())), SENTINEL);
        assert_eq!(or_sentinel(Some(" QSL ".into())), "QSL");
    }

    #[test]
    fn ddmmyyyy_for_keystrokes() {
        assert_eq!(to_ddmmyyyy("2024-03-01T18:34:36").as_deref(), Some("01032024"));
        assert_eq!(to_ddmmyyyy("1998-12-31").as_deref(), Some("31121998"));
        assert_eq!(to_ddmmyyyy("not a date"), None);
    }

    #[test]
    fn diacritics_are_stripped() {
        assert_eq!(strip_diacritics("SÃO PAULO"), "SAO PAULO");
        assert_eq!(strip_diacritics("Brasília"), "Brasilia");
        assert_eq!(strip_diacritics("MACEIÓ"), "MACEIO");
    }
}
