//! Static domain knowledge driving the classifier: reference-prefix tables,
//! keyword dictionaries and unit-multiplier tables.
//!
//! Everything here is injectable for testability; [`ClassifierConfig::builtin`]
//! carries the stock tables. A malformed table is a construction-time error,
//! surfaced once before any row is classified.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nominal::NominalTables;
use crate::Category;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unit table must not be empty")]
    EmptyUnitTable,
    #[error("unit token `{token}` has invalid multiplier {multiplier}")]
    InvalidMultiplier { token: String, multiplier: f64 },
    #[error("unit token `{token}` does not compile")]
    InvalidUnitToken {
        token: String,
        #[source]
        source: regex::Error,
    },
    #[error("reference prefix entry must not be empty")]
    EmptyPrefix,
    #[error("reference prefix `{0}` must be alphabetic")]
    NonAlphabeticPrefix(String),
    #[error("keyword set for `{0}` is empty")]
    EmptyKeywordSet(Category),
}

/// One keyword dictionary: the set fires when any keyword occurs in the
/// row's lowercased text blob, unless an exclude keyword also occurs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSet {
    pub category: Category,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl KeywordSet {
    fn new(category: Category, keywords: &[&str], exclude: &[&str]) -> Self {
        KeywordSet {
            category,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether this set fires for an already-lowercased blob.
    pub fn matches(&self, blob: &str) -> bool {
        has_any(blob, &self.keywords) && !has_any(blob, &self.exclude)
    }
}

/// Substring scan over a lowercased blob.
pub fn has_any(blob: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| blob.contains(k.as_str()))
}

/// Domain tables consulted by the classifier cascade.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Ordered `(prefix, category)` pairs; longer prefixes listed first so
    /// "DD" is seen before "D". Matching is `starts_with` on the alphabetic
    /// head of the designator.
    pub prefix_map: Vec<(String, Category)>,
    /// Keyword dictionaries in decision priority order.
    pub keyword_sets: Vec<KeywordSet>,
    /// Words that mark a row as an ordinary component, vetoing the
    /// self-reference (board-names-itself) heuristic.
    pub component_markers: Vec<String>,
    /// Markers used by the reference-prefix guards.
    pub ic_markers: Vec<String>,
    pub optical_markers: Vec<String>,
    pub attenuator_markers: Vec<String>,
    pub rf_markers: Vec<String>,
    pub switch_markers: Vec<String>,
    nominal: NominalTables,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClassifierConfig {
    /// Stock tables distilled from the legacy categorizer dictionaries.
    pub fn builtin() -> Self {
        let prefix_map = [
            ("JTAG", Category::Connectors),
            ("XS", Category::Connectors),
            ("XP", Category::Connectors),
            ("WS", Category::RfModules),
            ("WU", Category::RfModules),
            ("DD", Category::Ics),
            ("DA", Category::Ics),
            ("IC", Category::Ics),
            ("VT", Category::Diods),
            ("VD", Category::Diods),
            ("R", Category::Resistors),
            ("C", Category::Capacitors),
            ("L", Category::Inductors),
            ("U", Category::Ics),
            ("J", Category::Connectors),
            ("X", Category::Connectors),
            ("P", Category::Connectors),
            ("K", Category::Connectors),
            ("D", Category::Diods),
            ("H", Category::Diods),
            ("V", Category::Diods),
            ("Q", Category::Diods),
        ]
        .into_iter()
        .map(|(p, c)| (p.to_string(), c))
        .collect();

        let optics_exclude: &[&str] = &[];
        let non_optical: &[&str] = &["оптич", "optical", "fc/", "sc/", "lc/", "fiber"];

        let keyword_sets = vec![
            // Highest priority: anything optical, before cables/RF can grab it.
            KeywordSet::new(
                Category::Optics,
                &[
                    "оптическ", "оптич", "optical", "photonic", "оптоволок", "fiber",
                    "лазер", "laser", "sfp", "qsfp", "pigtail", "fc/apc", "fc/upc",
                    "sc/apc", "lc/apc", "мвол", "mp2320", "mp2220",
                    "линия многоканальная задержки",
                ],
                optics_exclude,
            ),
            // Cores, ferrites and isolators count as inductive parts.
            KeywordSet::new(
                Category::Inductors,
                &[
                    "сердечник", "феррит", "ferrite", "ферритов", "вентиль свч",
                    "вентиль вч", "circulator", "isolator", "прибор фвк",
                    "прибор фквн", "фвк3-", "фквн3-",
                ],
                &[],
            ),
            // Impedance-matched loads are RF plumbing.
            KeywordSet::new(
                Category::RfModules,
                &["нагрузка согласованная", "согласованная нагрузка", "matched load"],
                &[],
            ),
            // Primary categories, enum order.
            KeywordSet::new(
                Category::Resistors,
                &["резистор", "резист", "resistor", "сопротивлен"],
                &[],
            ),
            KeywordSet::new(
                Category::Capacitors,
                &[
                    "конденсатор", "конденс", "capacitor", "tantalum", "ceramic",
                    "к10-", "к53-",
                ],
                &["делитель мощности", "power divider"],
            ),
            KeywordSet::new(
                Category::Inductors,
                &[
                    "дроссель", "микродроссель", "inductor", "катушка",
                    "индуктивность", "индукт", "choke", "дросс",
                ],
                &[],
            ),
            KeywordSet::new(
                Category::Ics,
                &[
                    "микросхем", "интегральная схема", " ic", "mcu", "контроллер",
                    "процессор", "оп-амп", "op-amp", "opamp", "adc", "dac", "fpga",
                    "asic", "компаратор", "регулятор", "драйвер ", "sn74", "stm32",
                    "lmk", "ad9",
                ],
                &["оптич", "optical", "photonic", "аттенюатор", "attenuator", "ebyte", "nt1"],
            ),
            KeywordSet::new(
                Category::Connectors,
                &[
                    "разъем", "разъём", "connector", "вилка", "розетка", "socket",
                    "plug", "header", "rj45", "rj11", "sma", "bnc", "terminal",
                    "клемм", "штырь", "din", "штекер", "d-sub", "harting", "адаптер",
                    "adapter", "переход ",
                ],
                non_optical,
            ),
            KeywordSet::new(
                Category::DevBoards,
                &[
                    "отладоч", "dev board", "evaluation", "nucleo", "arduino",
                    "raspberry", "esp32", "breakout", "carrier", "zedboard", "zynq",
                    "microzed", "ultrazed", "picozed", "system on module",
                    "плата инструментальная", "development board", "отладочная плата",
                    "aes-zu", "модуль связи",
                ],
                &[],
            ),
            KeywordSet::new(
                Category::RfModules,
                &[
                    "свч", "microwave", "mini-circuits", "planar monolithics", "pmi",
                    "ghz", "lna", "линия задержек", "delay line", "делитель мощности",
                    "power divider", "сумматор", "splitter", "combiner", "усилител",
                    "amplifier", "ответвитель", "coupler", "фазовращатель",
                    "phase shifter", "ограничитель", "limiter", "корректор ачх",
                    "equalizer", "qpd", "аттенюатор", "attenuator", "ослабител",
                    "vat-", "zx60", "zx76", "qualwave", "weinschel", "a-info",
                    "gigabaudics", "jfw", "umcc",
                ],
                &["оптич", "optical", "fc/apc", "fc/upc", "fiber", "qfa"],
            ),
            KeywordSet::new(
                Category::Cables,
                &[
                    "кабель", "cable", "шлейф", "провод", "wire", "патч-корд",
                    "патч корд", "patch cord", "jumper",
                ],
                &["оптич", "optical"],
            ),
            KeywordSet::new(
                Category::PowerModules,
                &[
                    "модуль питания", "power module", "преобразователь питания",
                    "dc/dc", "dc-dc", "ac-dc", "buck", "boost", "источник питания",
                    "блок питания", "psu", "электропитания", "мдм", "маа20",
                    "маа400", "маа600",
                ],
                &[],
            ),
            KeywordSet::new(
                Category::Diods,
                &[
                    "диод", "diode", "транзистор", "transistor", "стабилитрон",
                    "оптрон", "оптопар", "optocoupler", "тиристор", "thyristor",
                    "mosfet", "igbt", "triac", "симистор", "светодиод", "led ",
                    "индикатор", "indicator", "2с630", "2т630",
                ],
                &[],
            ),
            KeywordSet::new(
                Category::OurDevelopments,
                &[
                    "амфи.", "амфи ", "мвок", "наша разработ", "собственной разработ",
                    "шск-м", "плата контроллера шск", "плата преобразователя уровней",
                ],
                &[],
            ),
            // Everything-else bucket, last by design.
            KeywordSet::new(
                Category::Others,
                &[
                    "предохранитель", "fuse", "fuzetec", "вставка плавкая", "rittal",
                    "шкаф", "станция", "полка", "кронштейн", "болт", "гайка", "шайба",
                    "клавиатура", "моноблок", "корпус", "шасси", "стеллаж", "стойка",
                    "вентилятор", "генератор", "держател", "зажим", "реле", "relay",
                    "тумблер", "переключ", "кнопка", "switch", "button", "фильтр",
                    "filter", "кварц", "quartz", "коммутатор", "qfa",
                    "сетка защитная",
                ],
                &[],
            ),
        ];

        let to_vec = |words: &[&str]| words.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        ClassifierConfig {
            prefix_map,
            keyword_sets,
            component_markers: to_vec(&[
                "резистор", "конденсатор", "микросхема", "разъем", "диод",
                "индуктор", "дроссель", "транзистор", "стабилитрон", "генератор",
                "вилка", "розетка", "кабель",
            ]),
            ic_markers: to_vec(&["микросхем"]),
            optical_markers: to_vec(&[
                "оптич", "optical", "передающий", "приемный", "fc/apc", "fc/upc",
                "fiber",
            ]),
            attenuator_markers: to_vec(&["аттенюат", "ослабител", "attenuator"]),
            rf_markers: to_vec(&[
                "свч", "rf", "линия задержек", "delay line", "усилитель",
                "делитель", "сумматор", "splitter", "combiner", "amplifier",
            ]),
            switch_markers: to_vec(&[
                "переключ", "тумблер", "кнопка", "switch", "button", "toggle",
            ]),
            nominal: NominalTables::builtin(),
        }
    }

    /// Swap in caller-supplied unit tables (already validated by
    /// [`NominalTables::from_tokens`]).
    pub fn with_nominal_tables(mut self, tables: NominalTables) -> Self {
        self.nominal = tables;
        self
    }

    pub fn nominal_tables(&self) -> &NominalTables {
        &self.nominal
    }

    /// Precondition check, run once when the pipeline is built. Per-row
    /// classification never validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (prefix, _) in &self.prefix_map {
            if prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            if !prefix.chars().all(|c| c.is_alphabetic()) {
                return Err(ConfigError::NonAlphabeticPrefix(prefix.clone()));
            }
        }
        for set in &self.keyword_sets {
            if set.keywords.is_empty() {
                return Err(ConfigError::EmptyKeywordSet(set.category));
            }
        }
        Ok(())
    }
}
