// src/app/utils.rs
use chrono::{Datelike, NaiveDate};

const MISSING_DATE: &str = "—";

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

pub(crate) fn month_long_name_pt(m: u32) -> &'static str {
    MONTHS_PT[(m.saturating_sub(1)).min(11) as usize]
}

/// TMDB release dates are `YYYY-MM-DD`; anything else is treated as unknown.
pub(crate) fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Table cell form: `15/12/1995`.
pub fn format_release_short(raw: &str) -> String {
    parse_release_date(raw)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| MISSING_DATE.into())
}

/// Dialog form: `15 de dezembro de 1995`.
pub fn format_release_long(raw: &str) -> String {
    match parse_release_date(raw) {
        Some(d) => format!(
            "{:02} de {} de {}",
            d.day(),
            month_long_name_pt(d.month()),
            d.year()
        ),
        None => MISSING_DATE.into(),
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

pub(crate) fn normalize_title(s: &str) -> String {
    let mut normalized = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\'' | '’' | '‘' | '`' => {
                // "Schindler's" should match "schindlers"
            }
            '&' => normalized.push_str(" e "),
            ch if ch.is_alphanumeric() => {
                for lower in ch.to_lowercase() {
                    normalized.push(fold_accent(lower));
                }
            }
            _ => normalized.push(' '),
        }
    }

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substring match on normalized titles. A blank query matches everything.
pub fn matches_search(title: &str, query: &str) -> bool {
    let q = normalize_title(query);
    q.is_empty() || normalize_title(title).contains(&q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_release_dates() {
        assert_eq!(format_release_short("1995-12-15"), "15/12/1995");
        assert_eq!(format_release_long("1995-12-15"), "15 de dezembro de 1995");
        assert_eq!(format_release_long("2024-03-05"), "05 de março de 2024");
    }

    #[test]
    fn unknown_release_dates_render_placeholder() {
        assert_eq!(format_release_short(""), "—");
        assert_eq!(format_release_short("1995"), "—");
        assert_eq!(format_release_long("soon"), "—");
    }

    #[test]
    fn search_ignores_case_accents_and_punctuation() {
        assert!(matches_search("Cidade de Deus", "cidade"));
        assert!(matches_search("A Origem", ""));
        assert!(matches_search("Ação Mutante", "acao"));
        assert!(matches_search("Schindler's List", "schindlers"));
        assert!(matches_search("Velozes & Furiosos", "velozes e furiosos"));
        assert_eq!(normalize_title("Tom & Jerry"), "tom e jerry");
        assert!(!matches_search("Alien", "aliens"));
    }

    #[test]
    fn month_names_clamp() {
        assert_eq!(month_long_name_pt(1), "janeiro");
        assert_eq!(month_long_name_pt(0), "janeiro");
        assert_eq!(month_long_name_pt(13), "dezembro");
    }
}
