//! Core engine for classifying bill-of-materials rows into a fixed component
//! taxonomy, normalizing free-text descriptions, extracting nominal values and
//! merging duplicate entries.
//!
//! The crate is pure: no file, network or process surface. Callers feed it
//! already-extracted [`ComponentRow`] records plus a [`RuleStore`] and a
//! [`ClassifierConfig`], and get back category-tagged, merged, partitioned
//! rows. Persistence of the rule file and parsing of source documents are the
//! caller's concern.

pub mod classify;
pub mod config;
pub mod merge;
pub mod nominal;
pub mod normalize;
pub mod rules;

pub use classify::{classify, classify_rows};
pub use config::{ClassifierConfig, ConfigError};
pub use merge::{merge, partition_by_category, sort_rows};
pub use nominal::{extract_nominal, BaseUnit, NominalValue};
pub use normalize::normalize;
pub use rules::{Rule, RuleError, RuleStore};

use serde::{Deserialize, Serialize};

/// Closed set of component categories a row can be classified into.
///
/// Variant order is the report order: partitions iterate categories in this
/// order, with `Unclassified` always last.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resistors,
    Capacitors,
    Inductors,
    Ics,
    Connectors,
    DevBoards,
    Optics,
    RfModules,
    Cables,
    PowerModules,
    Diods,
    OurDevelopments,
    Others,
    #[default]
    Unclassified,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Resistors,
        Category::Capacitors,
        Category::Inductors,
        Category::Ics,
        Category::Connectors,
        Category::DevBoards,
        Category::Optics,
        Category::RfModules,
        Category::Cables,
        Category::PowerModules,
        Category::Diods,
        Category::OurDevelopments,
        Category::Others,
        Category::Unclassified,
    ];

    /// The stable snake_case tag used in rule files and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Resistors => "resistors",
            Category::Capacitors => "capacitors",
            Category::Inductors => "inductors",
            Category::Ics => "ics",
            Category::Connectors => "connectors",
            Category::DevBoards => "dev_boards",
            Category::Optics => "optics",
            Category::RfModules => "rf_modules",
            Category::Cables => "cables",
            Category::PowerModules => "power_modules",
            Category::Diods => "diods",
            Category::OurDevelopments => "our_developments",
            Category::Others => "others",
            Category::Unclassified => "unclassified",
        }
    }

    /// Human-readable name for report headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Resistors => "Resistors",
            Category::Capacitors => "Capacitors",
            Category::Inductors => "Inductors",
            Category::Ics => "ICs",
            Category::Connectors => "Connectors",
            Category::DevBoards => "Dev boards",
            Category::Optics => "Optics",
            Category::RfModules => "RF modules",
            Category::Cables => "Cables",
            Category::PowerModules => "Power modules",
            Category::Diods => "Diodes & discrete semiconductors",
            Category::OurDevelopments => "Our developments",
            Category::Others => "Others",
            Category::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Error returned when parsing a category tag that is not in the closed set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown category `{0}` (expected one of: resistors, capacitors, inductors, ics, connectors, dev_boards, optics, rf_modules, cables, power_modules, diods, our_developments, others, unclassified)")]
pub struct UnknownCategory(pub String);

fn default_quantity() -> f64 {
    1.0
}

fn is_one(q: &f64) -> bool {
    *q == 1.0
}

/// One BOM line as handed to the core by an external parser.
///
/// All text fields are free text and may be empty. Reference ranges
/// ("R1-R4") must be expanded by the caller before rows reach the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRow {
    /// Positional designators. Classification only looks at the first one;
    /// merge accumulates the rest.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub part_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_file: String,
    #[serde(default = "default_quantity", skip_serializing_if = "is_one")]
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "is_unclassified")]
    pub category: Category,
    /// Derived by the value extractor once a physical-quantity category is
    /// assigned. `None` means "value unknown" and sorts last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<NominalValue>,
}

fn is_unclassified(c: &Category) -> bool {
    *c == Category::Unclassified
}

impl Default for ComponentRow {
    fn default() -> Self {
        ComponentRow {
            references: Vec::new(),
            description: String::new(),
            value: String::new(),
            part_number: String::new(),
            note: String::new(),
            source_file: String::new(),
            quantity: 1.0,
            category: Category::Unclassified,
            nominal: None,
        }
    }
}

impl ComponentRow {
    /// First positional designator, if any.
    pub fn reference(&self) -> Option<&str> {
        self.references.first().map(|s| s.as_str())
    }

    /// All text fields joined into one blob, in the order the classifier
    /// scans them.
    pub fn text_blob(&self) -> String {
        let mut blob = String::new();
        for field in [&self.description, &self.value, &self.part_number, &self.note] {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            if !blob.is_empty() {
                blob.push(' ');
            }
            blob.push_str(field);
        }
        blob
    }
}

/// Parse a raw quantity cell. Missing or non-numeric input defaults to 1,
/// never errors; both `.` and `,` work as the decimal separator.
pub fn parse_quantity(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 1.0 };
    let raw = raw.trim().replace(',', ".");
    if raw.is_empty() {
        return 1.0;
    }
    match raw.parse::<f64>() {
        Ok(q) if q.is_finite() && q > 0.0 => q,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_tags_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_str(cat.as_str()).unwrap(), cat);
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.as_str()));
            assert_eq!(serde_json::from_str::<Category>(&json).unwrap(), cat);
        }
        assert!(Category::from_str("gizmos").is_err());
    }

    #[test]
    fn quantity_parsing_recovers() {
        for (raw, expected) in [
            (Some("2"), 2.0),
            (Some("3,5"), 3.5),
            (Some("4.25"), 4.25),
            (Some(" 7 "), 7.0),
            (Some(""), 1.0),
            (Some("n/a"), 1.0),
            (Some("-3"), 1.0),
            (None, 1.0),
        ] {
            assert_eq!(parse_quantity(raw), expected, "raw {raw:?}");
        }
    }

    #[test]
    fn text_blob_skips_empty_fields() {
        let row = ComponentRow {
            description: "Резистор".to_string(),
            part_number: "Р1-12".to_string(),
            ..Default::default()
        };
        assert_eq!(row.text_blob(), "Резистор Р1-12");
    }
}
