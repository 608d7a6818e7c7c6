//! Row ingestion boundary: reads already-extracted BOM rows from CSV or JSON
//! files and hands plain [`ComponentRow`] records to the core. Document
//! parsing (DOCX/XLSX table extraction) is not this tool's job; whatever
//! produced the file has already done it.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bomcat_core::{parse_quantity, ComponentRow};
use serde::Deserialize;

/// One raw record as it appears in an input file. Every field is optional;
/// the core's recovery rules fill in the blanks.
#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
}

impl RawRow {
    fn into_row(self, fallback_source: &str) -> ComponentRow {
        let non_empty = |s: Option<String>| {
            s.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        ComponentRow {
            references: non_empty(self.reference).into_iter().collect(),
            description: non_empty(self.description).unwrap_or_default(),
            value: non_empty(self.value).unwrap_or_default(),
            part_number: non_empty(self.part_number).unwrap_or_default(),
            note: non_empty(self.note).unwrap_or_default(),
            source_file: non_empty(self.source_file)
                .unwrap_or_else(|| fallback_source.to_string()),
            quantity: parse_quantity(self.quantity.as_deref()),
            ..Default::default()
        }
    }
}

/// Load rows from `path`, dispatching on extension: `.csv` (headered) or
/// `.json` (array of objects). Rows without an explicit `source_file` are
/// attributed to the input file itself.
pub fn load_rows(path: &Path) -> Result<Vec<ComponentRow>> {
    let fallback = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let raw: Vec<RawRow> = match extension.as_str() {
        "csv" => {
            let mut reader = csv::ReaderBuilder::new()
                .flexible(true)
                .trim(csv::Trim::All)
                .from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            reader
                .deserialize()
                .collect::<Result<Vec<RawRow>, _>>()
                .with_context(|| format!("failed to parse CSV rows in {}", path.display()))?
        }
        "json" => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("failed to parse JSON rows in {}", path.display()))?
        }
        other => bail!("unsupported input format `.{other}` (expected .csv or .json)"),
    };

    log::info!("loaded {} rows from {}", raw.len(), path.display());
    Ok(raw
        .into_iter()
        .map(|row| row.into_row(&fallback))
        .collect())
}
