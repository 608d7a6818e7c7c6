//! The persistence collaborator for the core's rule store: rules live in a
//! JSON array of `{pattern, category, comment}` records, loaded at startup
//! and only ever appended to.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bomcat_core::{Rule, RuleStore};
use clap::{Args, Subcommand};
use colored::Colorize;

pub const DEFAULT_RULES_FILE: &str = "bomcat_rules.json";

#[derive(Args, Debug)]
#[command(about = "Inspect and extend the learned-rules file")]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// List rules in insertion order (the order they are applied in)
    List {
        /// Rules file
        #[arg(long, value_name = "PATH", default_value = DEFAULT_RULES_FILE)]
        rules: PathBuf,
    },
    /// Append a rule; existing rules are never overwritten or reordered
    Add {
        /// Substring (or regex, with --regex) to search for in a row's text
        pattern: String,

        /// Target category tag (e.g. resistors, rf_modules)
        category: bomcat_core::Category,

        /// Provenance note stored with the rule
        #[arg(long, default_value = "added via cli")]
        comment: String,

        /// Treat the pattern as a regular expression
        #[arg(long)]
        regex: bool,

        /// Rules file
        #[arg(long, value_name = "PATH", default_value = DEFAULT_RULES_FILE)]
        rules: PathBuf,
    },
}

pub fn execute(args: RulesArgs) -> Result<()> {
    match args.command {
        RulesCommand::List { rules } => {
            let store = load_store(&rules)?;
            if store.is_empty() {
                println!("No rules in {}", rules.display());
                return Ok(());
            }
            for (i, rule) in store.rules().iter().enumerate() {
                let kind = if rule.regex { "regex" } else { "contains" };
                println!(
                    "{:>4}. [{}] {kind} {:?}  {}",
                    i + 1,
                    rule.category.to_string().cyan(),
                    rule.pattern,
                    rule.comment.dimmed()
                );
            }
            Ok(())
        }
        RulesCommand::Add {
            pattern,
            category,
            comment,
            regex,
            rules,
        } => {
            let mut store = load_store(&rules)?;
            store
                .add_rule(Rule {
                    pattern,
                    category,
                    comment,
                    regex,
                })
                .context("invalid rule")?;
            save_rules(&rules, store.rules())?;
            println!("Saved {} rules to {}", store.len(), rules.display());
            Ok(())
        }
    }
}

/// Load a rule store from a JSON file. A missing file is an empty store,
/// not an error; a malformed one aborts the run.
pub fn load_store(path: &Path) -> Result<RuleStore> {
    if !path.exists() {
        return Ok(RuleStore::new());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    let rules: Vec<Rule> = serde_json::from_str(&data)
        .with_context(|| format!("malformed rules file {}", path.display()))?;
    log::info!("loaded {} rules from {}", rules.len(), path.display());
    RuleStore::from_rules(rules)
        .with_context(|| format!("invalid rule in {}", path.display()))
}

fn save_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    let json = serde_json::to_string_pretty(rules)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write rules file {}", path.display()))
}
