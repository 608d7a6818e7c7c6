//! Text canonicalization for descriptions and values.
//!
//! Everything downstream (classification keywords, nominal extraction, merge
//! keys) assumes text has been through [`normalize`]: one dash character, one
//! canonical spelling per unit symbol, single spaces, no trailing currency
//! markers. The function is total and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dash variants that all collapse to a plain hyphen: figure dash, en dash,
/// em dash, horizontal bar, minus sign.
const DASHES: [char; 5] = ['\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}'];

/// Unit-symbol casing table: `(\d)\s*UNIT` with any casing becomes a single
/// space and the canonical spelling. Longer units first so `кОм` is fixed
/// before the bare `Ом` pattern can see it.
static UNIT_CASING: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(\d)\s*МКГН\b", "${1} мкГн"),
        (r"(?i)(\d)\s*МГН\b", "${1} мГн"),
        (r"(?i)(\d)\s*НГН\b", "${1} нГн"),
        (r"(?i)(\d)\s*ГН\b", "${1} Гн"),
        (r"(?i)(\d)\s*МКФ\b", "${1} мкФ"),
        (r"(?i)(\d)\s*МФ\b", "${1} мФ"),
        (r"(?i)(\d)\s*НФ\b", "${1} нФ"),
        (r"(?i)(\d)\s*ПФ\b", "${1} пФ"),
        (r"(?i)(\d)\s*КОМ\b", "${1} кОм"),
        (r"(?i)(\d)\s*МОМ\b", "${1} МОм"),
        (r"(?i)(\d)\s*ОМ\b", "${1} Ом"),
    ]
    .into_iter()
    .map(|(pat, rep)| (Regex::new(pat).expect("unit casing pattern"), rep))
    .collect()
});

static HYPHEN_SPACING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s*|\s*-\s+").expect("hyphen spacing pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Canonicalize a free-text field. Malformed or empty input yields an empty
/// string, never an error.
pub fn normalize(text: &str) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .filter(|c| *c != '$')
        .collect();

    for (re, rep) in UNIT_CASING.iter() {
        out = re.replace_all(&out, *rep).into_owned();
    }

    // Whitespace touching a hyphen collapses to one space on each side.
    out = HYPHEN_SPACING.replace_all(&out, " - ").into_owned();
    out = WHITESPACE.replace_all(&out, " ").into_owned();
    out.trim().to_string()
}

/// Component-type prefixes stripped from descriptions, longest first. These
/// show up when a source table repeats the group header in every row.
const TYPE_PREFIXES: [&str; 23] = [
    "ЧИП КОНДЕНСАТОР КЕРАМИЧЕСКИЙ",
    "НАБОР КОНДЕНСАТОРОВ",
    "НАБОР РЕЗИСТОРОВ",
    "НАБОР МИКРОСХЕМ",
    "ТРАНЗИСТОРНАЯ МАТРИЦА",
    "ПЛАТА ИНСТРУМЕНТАЛЬНАЯ",
    "ОПТИЧЕСКИЙ МОДУЛЬ",
    "МОДУЛЬ ПИТАНИЯ",
    "ПРЕДОХРАНИТЕЛЬ",
    "ИНДУКТИВНОСТЬ",
    "КОНДЕНСАТОР",
    "СТАБИЛИТРОН",
    "ТРАНЗИСТОР",
    "МИКРОСХЕМА",
    "ГЕНЕРАТОР",
    "ДРОССЕЛЬ",
    "РЕЗИСТОР",
    "РАЗЪЕМ",
    "РАЗЪЁМ",
    "КАБЕЛЬ",
    "ОПТРОН",
    "ВИЛКА",
    "ДИОД",
];

/// Strip a leading component-type prefix ("РЕЗИСТОР Р1-12 ..." -> "Р1-12 ...").
///
/// "ВИЛКА" is kept for Harting/SEK parts, where it is part of the name.
pub fn strip_type_prefix(text: &str) -> String {
    let trimmed = text.trim();
    let upper = trimmed.to_uppercase();
    let lower = trimmed.to_lowercase();
    for prefix in TYPE_PREFIXES {
        if !upper.starts_with(prefix) {
            continue;
        }
        if prefix == "ВИЛКА" && (lower.contains("harting") || lower.contains("sek")) {
            continue;
        }
        return trimmed[prefix.len()..].trim().to_string();
    }
    trimmed.to_string()
}

static TU_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // АЛЯР.434110.005ТУ
        r"([А-ЯЁ]{2,}\.\d+[\d.\-]*\s*ТУ)",
        // ШКАБ434110002ТУ, АЕЯР431200424-07ТУ
        r"([А-ЯЁ]{2,}[\d.\-]+\s*ТУ)",
        // ТУ 6329-019-07614320-99
        r"ТУ\s+([\d\-]+)",
    ]
    .into_iter()
    .map(|pat| Regex::new(pat).expect("tu pattern"))
    .collect()
});

/// Split a ТУ (technical-conditions) code out of a description. Returns the
/// cleaned text and the code, if one was found.
pub fn extract_tu_code(text: &str) -> (String, Option<String>) {
    let text = text.trim();
    if text.is_empty() {
        return (String::new(), None);
    }
    for (i, re) in TU_PATTERNS.iter().enumerate() {
        if let Some(caps) = re.captures(text) {
            let code = if i == 2 {
                format!("ТУ {}", &caps[1])
            } else {
                caps[1].to_string()
            };
            let clean = re.replace(text, "").trim().to_string();
            return (clean, Some(code));
        }
    }
    (text.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_currency_and_whitespace() {
        for (input, expected) in [
            ("Резистор\u{2013}100  Ом$", "Резистор-100 Ом"),
            ("P1 \u{2212}12", "P1 - 12"),
            ("  PAT-0+   ф. Mini-Circuits ", "PAT-0+ ф. Mini-Circuits"),
            ("", ""),
            ("   ", ""),
            ("$$", ""),
        ] {
            assert_eq!(normalize(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn unit_casing() {
        for (input, expected) in [
            ("100 ОМ", "100 Ом"),
            ("10КОМ", "10 кОм"),
            ("1 МОМ", "1 МОм"),
            ("100 ПФ", "100 пФ"),
            ("1 мкф", "1 мкФ"),
            ("22 НФ", "22 нФ"),
            ("10 МКГН", "10 мкГн"),
            ("1 гн", "1 Гн"),
        ] {
            assert_eq!(normalize(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in [
            "Резистор\u{2014}100ОМ $",
            "Конденсатор К10-17в - М1500 - 100 ПФ",
            "10  кОм  5%-Т",
            "already plain text",
            "P1 - 12 - 0,125 - 1",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn plain_hyphens_without_spaces_are_kept() {
        assert_eq!(normalize("МДМ30-1В05ТУП"), "МДМ30-1В05ТУП");
        assert_eq!(normalize("СНП347-14ВП31-1"), "СНП347-14ВП31-1");
    }

    #[test]
    fn type_prefix_stripping() {
        assert_eq!(strip_type_prefix("РЕЗИСТОР Р1-12 100 Ом"), "Р1-12 100 Ом");
        assert_eq!(strip_type_prefix("Резистор Р1-12"), "Р1-12");
        assert_eq!(
            strip_type_prefix("НАБОР РЕЗИСТОРОВ НР1-4-9"),
            "НР1-4-9"
        );
        // Harting keeps its prefix
        assert_eq!(
            strip_type_prefix("ВИЛКА SEK 18 Harting"),
            "ВИЛКА SEK 18 Harting"
        );
        assert_eq!(strip_type_prefix("LM317 regulator"), "LM317 regulator");
    }

    #[test]
    fn tu_code_extraction() {
        let (clean, code) = extract_tu_code("К10-17в-М1500-100 пФ АЛЯР.434110.005ТУ");
        assert_eq!(code.as_deref(), Some("АЛЯР.434110.005ТУ"));
        assert_eq!(clean, "К10-17в-М1500-100 пФ");

        let (clean, code) = extract_tu_code("Провод МГШВ ТУ 6329-019-07614320-99");
        assert_eq!(code.as_deref(), Some("ТУ 6329-019-07614320-99"));
        assert_eq!(clean, "Провод МГШВ");

        let (clean, code) = extract_tu_code("PAT-0+");
        assert_eq!(code, None);
        assert_eq!(clean, "PAT-0+");
    }
}
