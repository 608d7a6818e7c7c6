//! Duplicate aggregation, sort ordering and category partitioning.
//!
//! Identity for merging is (normalized description, source file), not the
//! designator, which varies per physical instance. Rows from different
//! source files never merge, so report output stays visually grouped per
//! document.

use std::collections::{hash_map::Entry, BTreeMap, HashMap};

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::normalize;
use crate::{Category, ComponentRow};

// "100 Ом5%" and "100 Ом 5%" must compare equal.
static UNIT_PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(мкгн|мкф|ком|мом|мгн|нгн|пф|нф|мф|ом|гн)\s*(\d+%)")
        .expect("unit-percent pattern")
});

// Trailing "ф. Manufacturer" marker does not identify the part.
static MANUFACTURER_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+ф\.\s*[A-Za-zА-ЯЁа-яё0-9\s\-]+$").expect("manufacturer pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Canonical merge identity for a description: normalized, tolerance-marker
/// and manufacturer-suffix agnostic, case-insensitive.
pub fn merge_key(description: &str) -> String {
    let mut key = normalize(description).replace('±', "");
    key = UNIT_PERCENT.replace_all(&key, "${1} ${2}").into_owned();
    key = MANUFACTURER_SUFFIX.replace(&key, "").into_owned();
    key = WHITESPACE.replace_all(&key, " ").into_owned();
    key.trim().to_lowercase()
}

/// Collapse rows describing the same logical part within one source file
/// into a single aggregate row.
///
/// Quantities are summed; descriptive fields come from the first member
/// seen, so output order is deterministic and stable. Designators accumulate
/// and are kept in natural order (R2 before R10). Merging an already-merged
/// set is a no-op.
pub fn merge(rows: Vec<ComponentRow>) -> Vec<ComponentRow> {
    let mut merged: Vec<ComponentRow> = Vec::with_capacity(rows.len());
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let key = (row.source_file.clone(), merge_key(&row.description));
        match index.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(row);
            }
            Entry::Occupied(slot) => {
                let target = &mut merged[*slot.get()];
                target.quantity += row.quantity;
                for reference in row.references {
                    if !target.references.contains(&reference) {
                        target.references.push(reference);
                    }
                }
                log::debug!(
                    "merged duplicate `{}` ({}), qty now {}",
                    target.description,
                    target.references.iter().join(","),
                    target.quantity
                );
            }
        }
    }

    for row in &mut merged {
        row.references
            .sort_by(|a, b| natord::compare_ignore_case(a, b));
    }
    merged
}

/// Report sort order: known nominals ascending, unknowns last, ties broken
/// alphabetically by description, case-insensitively.
pub fn sort_rows(rows: &mut [ComponentRow]) {
    rows.sort_by(|a, b| match (&a.nominal, &b.nominal) {
        (Some(x), Some(y)) => x
            .magnitude
            .partial_cmp(&y.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| natord::compare_ignore_case(&a.description, &b.description)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => natord::compare_ignore_case(&a.description, &b.description),
    });
}

/// Partition classified rows by category, each bucket in report sort order.
/// Iterating the map visits categories in taxonomy order, `unclassified`
/// last.
pub fn partition_by_category(rows: Vec<ComponentRow>) -> BTreeMap<Category, Vec<ComponentRow>> {
    let mut partitions: BTreeMap<Category, Vec<ComponentRow>> = BTreeMap::new();
    for row in rows {
        partitions.entry(row.category).or_default().push(row);
    }
    for bucket in partitions.values_mut() {
        sort_rows(bucket);
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify_rows, parse_quantity, ClassifierConfig, NominalValue, RuleStore};
    use crate::nominal::BaseUnit;

    fn row(reference: &str, description: &str, quantity: &str, source_file: &str) -> ComponentRow {
        ComponentRow {
            references: vec![reference.to_string()],
            description: description.to_string(),
            quantity: parse_quantity(Some(quantity)),
            source_file: source_file.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn classify_then_merge_end_to_end() {
        let config = ClassifierConfig::default();
        let store = RuleStore::new();
        let mut rows = vec![
            row("R1", "Резистор 100 Ом", "2", "board.xlsx"),
            row("R2", "Резистор 100 Ом", "3", "board.xlsx"),
        ];
        classify_rows(&mut rows, &store, &config);
        let merged = merge(rows);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 5.0);
        assert_eq!(merged[0].category, Category::Resistors);
        assert_eq!(merged[0].references, vec!["R1", "R2"]);
        let nominal = merged[0].nominal.unwrap();
        assert_eq!(nominal.magnitude, 100.0);
        assert_eq!(nominal.unit, BaseUnit::Ohm);
    }

    #[test]
    fn different_source_files_never_merge() {
        let rows = vec![
            row("R1", "Резистор 100 Ом", "1", "a.xlsx"),
            row("R7", "Резистор 100 Ом", "1", "b.xlsx"),
        ];
        assert_eq!(merge(rows).len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let rows = vec![
            row("R1", "Резистор 100 Ом", "2", "a.xlsx"),
            row("R2", "Резистор 100 Ом", "3", "a.xlsx"),
            row("C1", "Конденсатор 10 пФ", "1", "a.xlsx"),
        ];
        let once = merge(rows);
        let twice = merge(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_key_ignores_cosmetic_variation() {
        for (a, b) in [
            ("100 Ом 5%-Т", "100 Ом5%-Т"),
            ("PAT-0+ ф. Mini-Circuits", "PAT-0+"),
            ("P1 - 12 - 0,125 - 1", "P1 - 12 - 0,125 -  1"),
            ("К10-17в ±10%", "К10-17в 10%"),
        ] {
            assert_eq!(merge_key(a), merge_key(b), "{a:?} vs {b:?}");
        }
        assert_ne!(merge_key("МДМ30-1В05ТУП"), merge_key("МДМ30-1В05СБП"));
    }

    #[test]
    fn quantities_default_to_one() {
        let rows = vec![
            row("R1", "Резистор 1 кОм", "оши6ка", "a.xlsx"),
            row("R2", "Резистор 1 кОм", "", "a.xlsx"),
        ];
        let merged = merge(rows);
        assert_eq!(merged[0].quantity, 2.0);
    }

    #[test]
    fn unknown_nominals_sort_last_and_ties_break_alphabetically() {
        let with_nominal = |desc: &str, magnitude: Option<f64>| ComponentRow {
            description: desc.to_string(),
            nominal: magnitude.map(|magnitude| NominalValue {
                magnitude,
                unit: BaseUnit::Ohm,
            }),
            ..Default::default()
        };
        let mut rows = vec![
            with_nominal("нет номинала", None),
            with_nominal("b 100 Ом", Some(100.0)),
            with_nominal("A 100 Ом", Some(100.0)),
            with_nominal("10 Ом", Some(10.0)),
        ];
        sort_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(order, ["10 Ом", "A 100 Ом", "b 100 Ом", "нет номинала"]);
    }

    #[test]
    fn partition_orders_categories_and_buckets() {
        let config = ClassifierConfig::default();
        let store = RuleStore::new();
        let mut rows = vec![
            row("C1", "Конденсатор 1 мкФ", "1", "a.xlsx"),
            row("R1", "Резистор 10 кОм", "1", "a.xlsx"),
            row("R2", "Резистор 100 Ом", "1", "a.xlsx"),
            row("", "нечто загадочное", "1", "a.xlsx"),
        ];
        classify_rows(&mut rows, &store, &config);
        let partitions = partition_by_category(rows);

        let categories: Vec<Category> = partitions.keys().copied().collect();
        assert_eq!(
            categories,
            vec![
                Category::Resistors,
                Category::Capacitors,
                Category::Unclassified
            ]
        );
        let resistors: Vec<f64> = partitions[&Category::Resistors]
            .iter()
            .map(|r| r.nominal.unwrap().magnitude)
            .collect();
        assert_eq!(resistors, vec![100.0, 10_000.0]);
    }
}
