use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bomcat_core::{
    classify_rows, merge, partition_by_category, Category, ClassifierConfig, ComponentRow,
    NominalValue,
};
use clap::{Args, ValueEnum};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::Table;

use crate::rows;
use crate::rules;

#[derive(ValueEnum, Debug, Clone, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug)]
#[command(about = "Classify BOM rows and report them per category")]
pub struct ClassifyArgs {
    /// CSV or JSON file of extracted BOM rows
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Learned-rules file (consulted before the keyword dictionaries)
    #[arg(long, value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Merge duplicate rows (same description within one source file)
    #[arg(long)]
    pub merge: bool,

    /// Multiply every quantity by N (board count)
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub multiplier: u32,
}

pub fn execute(args: ClassifyArgs) -> Result<()> {
    let config = ClassifierConfig::default();
    config
        .validate()
        .context("invalid classifier configuration")?;

    let store = match &args.rules {
        Some(path) => rules::load_store(path)?,
        None => rules::load_store(Path::new(rules::DEFAULT_RULES_FILE))?,
    };

    let mut rows = rows::load_rows(&args.file)?;
    classify_rows(&mut rows, &store, &config);

    if args.multiplier > 1 {
        for row in &mut rows {
            row.quantity *= args.multiplier as f64;
        }
    }

    let rows = if args.merge { merge(rows) } else { rows };
    let partitions = partition_by_category(rows);

    match args.format {
        OutputFormat::Json => print_json(&partitions)?,
        OutputFormat::Table => print_tables(&partitions),
    }
    Ok(())
}

fn print_json(
    partitions: &std::collections::BTreeMap<Category, Vec<ComponentRow>>,
) -> Result<()> {
    let mut map = serde_json::Map::new();
    for (category, rows) in partitions {
        map.insert(category.as_str().to_string(), serde_json::to_value(rows)?);
    }
    let mut writer = io::stdout().lock();
    serde_json::to_writer_pretty(&mut writer, &serde_json::Value::Object(map))?;
    writeln!(writer)?;
    Ok(())
}

fn print_tables(partitions: &std::collections::BTreeMap<Category, Vec<ComponentRow>>) {
    let mut total_rows = 0usize;
    for (category, rows) in partitions {
        total_rows += rows.len();
        let quantity: f64 = rows.iter().map(|r| r.quantity).sum();
        println!(
            "\n{}: {} entries, {} pcs",
            category.display_name().bold(),
            rows.len(),
            format_quantity(quantity)
        );

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
        table.set_header(vec!["Refs", "Description", "Part No", "Nominal", "Qty", "Source"]);
        for row in rows {
            table.add_row(vec![
                row.references.join(", "),
                row.description.clone(),
                row.part_number.clone(),
                row.nominal.map(format_nominal).unwrap_or_default(),
                format_quantity(row.quantity),
                row.source_file.clone(),
            ]);
        }
        println!("{table}");
    }

    let unclassified = partitions
        .get(&Category::Unclassified)
        .map(|rows| rows.len())
        .unwrap_or(0);
    if unclassified > 0 {
        println!(
            "\n{} {unclassified} of {total_rows} rows unclassified; teach them with `bomcat rules add`",
            "note:".yellow()
        );
    } else {
        println!("\n{total_rows} rows, all classified");
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}

fn format_nominal(nominal: NominalValue) -> String {
    format!("{} {}", nominal.magnitude, nominal.unit.symbol())
}
