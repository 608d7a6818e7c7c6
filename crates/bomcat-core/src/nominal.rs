//! Nominal-value extraction: turns "10 кОм", "4,7 nF" or a bare SMD code
//! into a magnitude in the base unit of its physical quantity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, ConfigError};
use crate::Category;

/// Base unit of a physical quantity. Prefixed units (кОм, мкФ, nH, ...) are
/// always normalized away before a value leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseUnit {
    Ohm,
    Farad,
    Henry,
}

impl BaseUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            BaseUnit::Ohm => "Ω",
            BaseUnit::Farad => "F",
            BaseUnit::Henry => "H",
        }
    }
}

/// A normalized nominal value. Magnitude is non-negative by construction:
/// the extraction patterns only admit unsigned literals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalValue {
    pub magnitude: f64,
    pub unit: BaseUnit,
}

/// Compiled unit-token patterns for one physical quantity.
#[derive(Debug, Clone)]
pub struct FamilyTable {
    /// `(pattern, multiplier)` pairs, most specific token first.
    patterns: Vec<(Regex, f64)>,
    /// Matches a digit followed by any unit token of this family; its
    /// presence disables the SMD fallback (an explicit unit means the
    /// digits are not a code).
    unit_mention: Regex,
}

impl FamilyTable {
    /// Compile a family from `(unit token, multiplier to base unit)` pairs.
    /// Tokens are matched case-insensitively right after a numeric literal.
    pub fn new(tokens: &[(&str, f64)]) -> Result<Self, ConfigError> {
        if tokens.is_empty() {
            return Err(ConfigError::EmptyUnitTable);
        }
        let mut patterns = Vec::with_capacity(tokens.len());
        for (token, multiplier) in tokens {
            if !multiplier.is_finite() || *multiplier <= 0.0 {
                return Err(ConfigError::InvalidMultiplier {
                    token: token.to_string(),
                    multiplier: *multiplier,
                });
            }
            // The unit may be followed by anything that is not a letter, so
            // a tolerance glued onto the token ("100 Ом5%") still counts.
            let pat = format!(
                r"(?i)(?:^|[\s(\-])(\d+(?:[.,]\d+)?)\s*{}(?:[^\p{{L}}]|$)",
                regex::escape(token)
            );
            let re = Regex::new(&pat).map_err(|source| ConfigError::InvalidUnitToken {
                token: token.to_string(),
                source,
            })?;
            patterns.push((re, *multiplier));
        }
        let mention = format!(
            r"(?i)\d\s*(?:{})",
            tokens
                .iter()
                .map(|(t, _)| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|")
        );
        let unit_mention =
            Regex::new(&mention).map_err(|source| ConfigError::InvalidUnitToken {
                token: mention.clone(),
                source,
            })?;
        Ok(FamilyTable {
            patterns,
            unit_mention,
        })
    }

    fn find(&self, text: &str) -> Option<f64> {
        for (re, multiplier) in &self.patterns {
            if let Some(caps) = re.captures(text) {
                let literal = caps[1].replace(',', ".");
                if let Ok(value) = literal.parse::<f64>() {
                    return Some(value * multiplier);
                }
            }
        }
        None
    }

    fn mentions_unit(&self, text: &str) -> bool {
        self.unit_mention.is_match(text)
    }
}

/// Unit tables for the three physical quantities the taxonomy tracks.
#[derive(Debug, Clone)]
pub struct NominalTables {
    pub resistance: FamilyTable,
    pub capacitance: FamilyTable,
    pub inductance: FamilyTable,
}

impl NominalTables {
    /// Built-in Cyrillic + Latin unit tokens.
    pub fn builtin() -> Self {
        // Known-good token lists; compilation cannot fail.
        Self::from_tokens(
            &[
                ("мом", 1e6),
                ("mω", 1e6),
                ("mohm", 1e6),
                ("ком", 1e3),
                ("kω", 1e3),
                ("kohm", 1e3),
                ("ом", 1.0),
                ("ohm", 1.0),
                ("ω", 1.0),
            ],
            &[
                ("мкф", 1e-6),
                ("uf", 1e-6),
                ("µf", 1e-6),
                ("μf", 1e-6),
                ("мф", 1e-3),
                ("mf", 1e-3),
                ("нф", 1e-9),
                ("nf", 1e-9),
                ("пф", 1e-12),
                ("pf", 1e-12),
                ("ф", 1.0),
            ],
            &[
                ("мкгн", 1e-6),
                ("uh", 1e-6),
                ("µh", 1e-6),
                ("μh", 1e-6),
                ("мгн", 1e-3),
                ("mh", 1e-3),
                ("нгн", 1e-9),
                ("nh", 1e-9),
                ("гн", 1.0),
                ("h", 1.0),
            ],
        )
        .expect("builtin unit tables")
    }

    /// Build tables from caller-supplied token lists. Invalid tokens or
    /// multipliers abort pipeline construction, never a per-row call.
    pub fn from_tokens(
        resistance: &[(&str, f64)],
        capacitance: &[(&str, f64)],
        inductance: &[(&str, f64)],
    ) -> Result<Self, ConfigError> {
        Ok(NominalTables {
            resistance: FamilyTable::new(resistance)?,
            capacitance: FamilyTable::new(capacitance)?,
            inductance: FamilyTable::new(inductance)?,
        })
    }

    fn for_category(&self, category: Category) -> Option<(&FamilyTable, BaseUnit)> {
        match category {
            Category::Resistors => Some((&self.resistance, BaseUnit::Ohm)),
            Category::Capacitors => Some((&self.capacitance, BaseUnit::Farad)),
            Category::Inductors => Some((&self.inductance, BaseUnit::Henry)),
            _ => None,
        }
    }

    fn mentions_any_unit(&self, text: &str) -> bool {
        self.resistance.mentions_unit(text)
            || self.capacitance.mentions_unit(text)
            || self.inductance.mentions_unit(text)
    }
}

// A bare token of exactly 3 digits is a plausible SMD value code. 4-digit
// tokens (package sizes like 0805) fall outside the boundaries and are
// simply skipped, so "0805 102" still decodes the 102.
static THREE_DIGIT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(\d)(\d)(\d)(?:\s|$)").expect("3-digit pattern"));

/// Decode a bare 3-digit SMD marking: two significant digits times ten to the
/// power of the third. Refuses when the text carries an explicit unit token
/// of any family, so "100 мкГн" is never mistaken for a resistor code.
fn decode_smd(text: &str, tables: &NominalTables) -> Option<f64> {
    if tables.mentions_any_unit(text) {
        return None;
    }
    let caps = THREE_DIGIT_BARE.captures(text)?;
    let mantissa: f64 = format!("{}{}", &caps[1], &caps[2]).parse().ok()?;
    let exponent: u32 = caps[3].parse().ok()?;
    Some(mantissa * 10f64.powi(exponent as i32))
}

/// Extract the nominal value of `text` for the given category hint.
///
/// Returns `None` when nothing matches; that is "value unknown", not an
/// error, and such rows sort last. Only the three physical-quantity
/// categories can yield a value; the SMD fallback applies to resistors and
/// capacitors only (capacitor codes are in picofarads).
pub fn extract_nominal(
    text: &str,
    category_hint: Category,
    config: &ClassifierConfig,
) -> Option<NominalValue> {
    let tables = config.nominal_tables();
    let (family, unit) = tables.for_category(category_hint)?;
    if let Some(magnitude) = family.find(text) {
        return Some(NominalValue { magnitude, unit });
    }
    let smd_scale = match category_hint {
        Category::Resistors => 1.0,
        Category::Capacitors => 1e-12,
        _ => return None,
    };
    decode_smd(text, tables).map(|code| NominalValue {
        magnitude: code * smd_scale,
        unit,
    })
}
