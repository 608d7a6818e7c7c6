//! The classification cascade: an ordered list of pure stages, each of which
//! may claim the row. The first stage that fires decides the category; later
//! stages are never consulted.
//!
//! Stage order, and therefore evidence precedence:
//! self-reference > reference prefix > learned rules > keywords > nominal
//! value patterns. Absence of evidence yields `unclassified`, which is a
//! legitimate terminal state, not an error.

use crate::config::{has_any, ClassifierConfig};
use crate::nominal::extract_nominal;
use crate::normalize::normalize;
use crate::rules::RuleStore;
use crate::{Category, ComponentRow};

/// Everything a stage is allowed to look at, precomputed once per row.
struct RowFacts {
    /// Uppercased alphabetic head of the first designator ("R" for "R12").
    ref_prefix: String,
    /// Normalized, lowercased join of description, value, part number, note.
    blob: String,
    /// Normalized description, original case.
    desc: String,
    source_file: String,
}

impl RowFacts {
    fn from_row(row: &ComponentRow) -> Self {
        let ref_prefix = row
            .reference()
            .and_then(|r| r.split_whitespace().next())
            .map(|token| {
                token
                    .chars()
                    .take_while(|c| c.is_alphabetic())
                    .collect::<String>()
                    .to_uppercase()
            })
            .unwrap_or_default();
        RowFacts {
            ref_prefix,
            blob: normalize(&row.text_blob()).to_lowercase(),
            desc: normalize(&row.description),
            source_file: row.source_file.trim().to_string(),
        }
    }
}

struct ClassifyContext<'a> {
    config: &'a ClassifierConfig,
    rules: &'a RuleStore,
}

type Stage = fn(&RowFacts, &ClassifyContext) -> Option<Category>;

const STAGES: &[(&str, Stage)] = &[
    ("self-reference", stage_self_reference),
    ("reference-prefix", stage_reference_prefix),
    ("rule-store", stage_rule_store),
    ("keywords", stage_keywords),
    ("value-pattern", stage_value_pattern),
];

/// Decide a category for one row. Pure: reads only the row, the rule store
/// and the config; never fails, never mutates.
pub fn classify(row: &ComponentRow, rules: &RuleStore, config: &ClassifierConfig) -> Category {
    let facts = RowFacts::from_row(row);
    let ctx = ClassifyContext { config, rules };
    for (name, stage) in STAGES {
        if let Some(category) = stage(&facts, &ctx) {
            log::debug!("stage {name} -> {category}: {:.60}", facts.blob);
            return category;
        }
    }
    Category::Unclassified
}

/// Pipeline helper: normalize text fields in place, assign categories, and
/// derive nominal values for the physical-quantity categories.
pub fn classify_rows(rows: &mut [ComponentRow], rules: &RuleStore, config: &ClassifierConfig) {
    for row in rows.iter_mut() {
        row.description = normalize(&row.description);
        row.value = normalize(&row.value);
        row.part_number = normalize(&row.part_number);
        row.note = normalize(&row.note);
        row.category = classify(row, rules, config);
        let blob = row.text_blob().to_lowercase();
        row.nominal = extract_nominal(&blob, row.category, config);
    }
}

/// A board describing itself: the description repeats the source file's stem
/// and nothing marks the row as an ordinary component. Runs before the
/// prefix check so stray designator letters cannot miscategorize the board.
fn stage_self_reference(facts: &RowFacts, ctx: &ClassifyContext) -> Option<Category> {
    if facts.source_file.is_empty() || facts.desc.is_empty() {
        return None;
    }
    if has_any(&facts.blob, &ctx.config.component_markers) {
        return None;
    }
    let file_name = facts
        .source_file
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&facts.source_file);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
        .to_lowercase();
    let squash = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
    };
    let file_clean = squash(&stem);
    if file_clean.is_empty() {
        return None;
    }
    let desc_clean = squash(
        &facts
            .desc
            .to_lowercase()
            .replace(".xlsx", "")
            .replace(".xls", ""),
    );
    (desc_clean == file_clean || desc_clean.contains(&file_clean))
        .then_some(Category::OurDevelopments)
}

/// Designator-prefix heuristics. Prefix evidence outranks keyword evidence,
/// but a handful of prefixes need supporting text before they count.
fn stage_reference_prefix(facts: &RowFacts, ctx: &ClassifyContext) -> Option<Category> {
    let p = facts.ref_prefix.as_str();
    if p.is_empty() {
        return None;
    }
    let blob = facts.blob.as_str();
    let cfg = ctx.config;

    // Optical modules are often designated U; the text decides.
    if p.starts_with('U') && has_any(blob, &cfg.optical_markers) {
        return Some(Category::Optics);
    }
    // Bare A (Latin or Cyrillic) marks boards and modules.
    if p == "A" || p == "А" {
        return Some(Category::DevBoards);
    }
    // Longer А-prefixed designators on attenuators: optical ones are optics,
    // electrical ones go with the boards-and-modules bucket.
    if (p.starts_with('A') || p.starts_with('А'))
        && p.chars().count() > 2
        && has_any(blob, &cfg.attenuator_markers)
    {
        return Some(if has_any(blob, &cfg.optical_markers) {
            Category::Optics
        } else {
            Category::DevBoards
        });
    }
    // A transistor/diode position holding an IC is an IC.
    if (p.starts_with('D') || p.starts_with('V') || p.starts_with('Q'))
        && has_any(blob, &cfg.ic_markers)
    {
        return Some(Category::Ics);
    }
    // Plain W designators only count with RF evidence in the text.
    if p.starts_with('W') && !p.starts_with("WS") && !p.starts_with("WU") {
        return has_any(blob, &cfg.rf_markers).then_some(Category::RfModules);
    }
    // S designators are switches/buttons only when the text agrees.
    if p.starts_with('S') {
        return has_any(blob, &cfg.switch_markers).then_some(Category::Others);
    }

    cfg.prefix_map
        .iter()
        .find(|(prefix, _)| p.starts_with(prefix.as_str()))
        .map(|(_, category)| *category)
}

/// Learned overrides: consulted before the generic keyword dictionaries so
/// user-specific rules take precedence.
fn stage_rule_store(facts: &RowFacts, ctx: &ClassifyContext) -> Option<Category> {
    ctx.rules.match_category(&facts.blob)
}

fn stage_keywords(facts: &RowFacts, ctx: &ClassifyContext) -> Option<Category> {
    ctx.config
        .keyword_sets
        .iter()
        .find(|set| set.matches(&facts.blob))
        .map(|set| set.category)
}

/// Last resort before `unclassified`: a recognizable nominal value implies
/// the component kind. Probe order is resistor, capacitor, inductor.
fn stage_value_pattern(facts: &RowFacts, ctx: &ClassifyContext) -> Option<Category> {
    [
        Category::Resistors,
        Category::Capacitors,
        Category::Inductors,
    ]
    .into_iter()
    .find(|hint| extract_nominal(&facts.blob, *hint, ctx.config).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(reference: &str, description: &str) -> ComponentRow {
        ComponentRow {
            references: if reference.is_empty() {
                Vec::new()
            } else {
                vec![reference.to_string()]
            },
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn check_many(store: &RuleStore, cases: &[(&str, &str, Category)]) {
        let config = ClassifierConfig::default();
        for (reference, description, expected) in cases {
            let got = classify(&row(reference, description), store, &config);
            assert_eq!(got, *expected, "ref {reference:?}, desc {description:?}");
        }
    }

    #[test]
    fn prefix_outranks_keywords() {
        check_many(
            &RuleStore::new(),
            &[
                // capacitor keywords lose to the R prefix
                ("R5", "Конденсатор керамический 100 пФ", Category::Resistors),
                ("C12", "Резистор 100 Ом", Category::Capacitors),
                ("L3", "100 Ом", Category::Inductors),
                ("DD1", "К1986ВЕ92QI", Category::Ics),
                ("VD7", "2Д212А", Category::Diods),
                ("XS2", "СНП347-14ВП31-1", Category::Connectors),
                ("JTAG1", "IDC-10", Category::Connectors),
            ],
        );
    }

    #[test]
    fn guarded_prefixes_need_supporting_text() {
        check_many(
            &RuleStore::new(),
            &[
                ("W1", "Усилитель СВЧ ZX60-83LN-S+", Category::RfModules),
                ("W2", "нечто непонятное", Category::Unclassified),
                ("S1", "Тумблер МТ-1", Category::Others),
                ("VT1", "Микросхема драйвера", Category::Ics),
                ("U1", "Передающий оптический модуль", Category::Optics),
                ("А1", "что-то без описания", Category::DevBoards),
                ("АТТ1", "Аттенюатор оптический FC/APC", Category::Optics),
                ("АТТ2", "Аттенюатор 10 дБ", Category::DevBoards),
            ],
        );
    }

    #[test]
    fn self_reference_outranks_prefix() {
        let config = ClassifierConfig::default();
        let mut r = row("R1", "Plata_ctrl");
        r.source_file = "boards/Plata_ctrl.xlsx".to_string();
        assert_eq!(
            classify(&r, &RuleStore::new(), &config),
            Category::OurDevelopments
        );

        // A real component row with the same file never self-references.
        let mut r = row("R1", "Резистор 100 Ом");
        r.source_file = "boards/Plata_ctrl.xlsx".to_string();
        assert_eq!(classify(&r, &RuleStore::new(), &config), Category::Resistors);
    }

    #[test]
    fn rules_outrank_keywords() {
        let mut store = RuleStore::new();
        store.add("зип-набор", Category::Others, "learned");
        check_many(
            &store,
            &[
                ("", "ЗИП-набор кабель питания", Category::Others),
                ("", "кабель питания", Category::Cables),
            ],
        );
    }

    #[test]
    fn keyword_priorities() {
        check_many(
            &RuleStore::new(),
            &[
                // optics beats cables
                ("", "Кабель оптический FC/APC 5м", Category::Optics),
                ("", "Кабель RG-58", Category::Cables),
                // cores are inductive parts
                ("", "Сердечник ферритовый М2000НМ", Category::Inductors),
                // matched loads are RF even without a vendor name
                ("", "Нагрузка согласованная 50 Ом", Category::RfModules),
                ("", "Делитель мощности ф. Mini-Circuits", Category::RfModules),
                ("", "Модуль питания МДМ30-1В05ТУП", Category::PowerModules),
                ("", "Транзистор 2Т630А", Category::Diods),
                ("", "Предохранитель ВП1-1", Category::Others),
            ],
        );
    }

    #[test]
    fn value_pattern_is_the_last_resort() {
        check_many(
            &RuleStore::new(),
            &[
                ("", "47 кОм 5%", Category::Resistors),
                ("", "10 пФ", Category::Capacitors),
                // an inductance unit must not be read as a bare resistor code
                ("", "100 мкГн", Category::Inductors),
                ("", "100 nH", Category::Inductors),
                ("", "102", Category::Resistors),
                ("", "0805 102", Category::Resistors),
            ],
        );
    }

    #[test]
    fn always_terminates_in_the_closed_set() {
        let config = ClassifierConfig::default();
        let store = RuleStore::new();
        for (reference, description) in [
            ("", ""),
            ("???", "###"),
            ("R", ""),
            ("1", "\u{0}"),
            ("", "совершенно неведомая штуковина"),
        ] {
            let got = classify(&row(reference, description), &store, &config);
            assert!(Category::ALL.contains(&got), "{reference:?}/{description:?}");
        }
    }

    #[test]
    fn classify_rows_sets_category_and_nominal() {
        let config = ClassifierConfig::default();
        let store = RuleStore::new();
        let mut rows = vec![row("R1", "Резистор  100  ОМ$")];
        classify_rows(&mut rows, &store, &config);
        assert_eq!(rows[0].category, Category::Resistors);
        assert_eq!(rows[0].description, "Резистор 100 Ом");
        let nominal = rows[0].nominal.unwrap();
        assert_eq!(nominal.magnitude, 100.0);
    }
}
