use anyhow::{Context, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;

use super::image::ModuleResult;
use crate::error::ModuleError;

/// How the result record is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Structured record for classified failures
#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub failed: bool,
    pub msg: String,
    pub rc: i32,
}

impl FailureRecord {
    pub fn from_error(err: &ModuleError, rc: i32) -> Self {
        Self {
            failed: true,
            msg: err.to_string(),
            rc,
        }
    }
}

pub fn print_result(result: &ModuleResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(result).context("Failed to serialize result")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if result.images.is_empty() {
                println!("No images found.");
            } else {
                println!("{}", render_table(result));
            }
            println!("changed: {}", result.changed);
        }
    }
    Ok(())
}

pub fn print_failure(record: &FailureRecord) -> Result<()> {
    let json = serde_json::to_string(record).context("Failed to serialize failure")?;
    println!("{}", json);
    Ok(())
}

fn render_table(result: &ModuleResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("NAME").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("STATUS").add_attribute(Attribute::Bold),
            Cell::new("DISK FORMAT").add_attribute(Attribute::Bold),
            Cell::new("CONTAINER FORMAT").add_attribute(Attribute::Bold),
            Cell::new("VISIBILITY").add_attribute(Attribute::Bold),
        ]);

    for image in &result.images {
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(image.name().unwrap_or("-")),
            Cell::new(or_dash(image.id())),
            Cell::new(or_dash(image.status())),
            Cell::new(or_dash(image.disk_format())),
            Cell::new(or_dash(image.container_format())),
            Cell::new(or_dash(image.visibility())),
        ]);
    }

    table
}
