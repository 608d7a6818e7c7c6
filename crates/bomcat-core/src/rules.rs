//! Learned classification rules: an ordered, append-only sequence of
//! pattern -> category directives. First match wins; persistence of the
//! backing file is the caller's concern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Category;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule pattern `{pattern}` does not compile")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule pattern must not be empty")]
    EmptyPattern,
}

/// One learned directive. `pattern` is a case-insensitive substring unless
/// `regex` is set. `comment` records provenance ("added interactively", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub regex: bool,
}

enum Matcher {
    Contains(String),
    Regex(Regex),
}

impl Matcher {
    fn compile(rule: &Rule) -> Result<Self, RuleError> {
        if rule.pattern.trim().is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        if rule.regex {
            let re = Regex::new(&format!("(?i){}", rule.pattern)).map_err(|source| {
                RuleError::InvalidRegex {
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            Ok(Matcher::Regex(re))
        } else {
            Ok(Matcher::Contains(rule.pattern.to_lowercase()))
        }
    }

    fn matches(&self, lower: &str, original: &str) -> bool {
        match self {
            Matcher::Contains(needle) => lower.contains(needle.as_str()),
            Matcher::Regex(re) => re.is_match(original),
        }
    }
}

/// Ordered rule sequence with compiled matchers. Rules are only ever
/// appended, so the earliest inserted pattern keeps winning even when a
/// duplicate shows up later.
#[derive(Default)]
pub struct RuleStore {
    rules: Vec<Rule>,
    matchers: Vec<Matcher>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted records. A malformed regex aborts
    /// construction; per-row matching never fails.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let matchers = rules
            .iter()
            .map(Matcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleStore { rules, matchers })
    }

    /// Category of the first rule matching `text`, if any.
    pub fn match_category(&self, text: &str) -> Option<Category> {
        let lower = text.to_lowercase();
        self.matchers
            .iter()
            .zip(&self.rules)
            .find(|(matcher, _)| matcher.matches(&lower, text))
            .map(|(_, rule)| rule.category)
    }

    /// Append a substring rule. Existing entries are never overwritten or
    /// reordered; duplicates are tolerated. An empty pattern is dropped
    /// silently rather than matching everything.
    pub fn add(&mut self, pattern: impl Into<String>, category: Category, comment: impl Into<String>) {
        let rule = Rule {
            pattern: pattern.into(),
            category,
            comment: comment.into(),
            regex: false,
        };
        if rule.pattern.trim().is_empty() {
            return;
        }
        self.matchers.push(Matcher::Contains(rule.pattern.to_lowercase()));
        self.rules.push(rule);
    }

    /// Append an arbitrary rule, validating its pattern.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), RuleError> {
        self.matchers.push(Matcher::compile(&rule)?);
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let mut store = RuleStore::new();
        store.add("pat-0", Category::RfModules, "first");
        store.add("pat-0", Category::Others, "duplicate, must lose");
        assert_eq!(
            store.match_category("PAT-0+ splitter"),
            Some(Category::RfModules)
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let mut store = RuleStore::new();
        store.add("Шск-М", Category::OurDevelopments, "");
        assert_eq!(
            store.match_category("плата ШСК-М ревизия 2"),
            Some(Category::OurDevelopments)
        );
        assert_eq!(store.match_category("нечто иное"), None);
    }

    #[test]
    fn regex_rules() {
        let store = RuleStore::from_rules(vec![Rule {
            pattern: r"мдм\d+-".to_string(),
            category: Category::PowerModules,
            comment: String::new(),
            regex: true,
        }])
        .unwrap();
        assert_eq!(
            store.match_category("МДМ30-1В05ТУП"),
            Some(Category::PowerModules)
        );
        assert_eq!(store.match_category("МДМ-без-номера"), None);
    }

    #[test]
    fn malformed_regex_is_a_construction_error() {
        let err = RuleStore::from_rules(vec![Rule {
            pattern: "(".to_string(),
            category: Category::Others,
            comment: String::new(),
            regex: true,
        }]);
        assert!(matches!(err, Err(RuleError::InvalidRegex { .. })));
    }

    #[test]
    fn rules_round_trip_through_json() {
        let mut store = RuleStore::new();
        store.add("нагрузка оконечная", Category::RfModules, "added interactively");
        let json = serde_json::to_string(store.rules()).unwrap();
        let parsed: Vec<Rule> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.rules());
    }
}
