//! Table extraction for structured report sections.
//!
//! A table starts at a header line naming any of test/parameter/value/
//! normal/range and runs until a blank or non-row line. Row names are
//! returned as written; callers resolve them with the normalizer.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:test|parameter|value|normal|range)\b").expect("Invalid table header regex")
});

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*
        (?P<name>[a-z][a-z0-9\ .()\-]*?)
        (?:\s*[:|]\s*|\s+)
        (?P<value>\d+(?:\.\d+)?)
        (?:\s*(?P<unit>[a-zμµ%/²][a-zμµ%/²0-9^]*))?
        (?:\s+\(?(?P<range>\d+(?:\.\d+)?\s*[-–]\s*\d+(?:\.\d+)?)\)?)?
        (?:\s+(?P<status>[a-z][a-z\ ]*?))?
        \s*$",
    )
    .expect("Invalid table row regex")
});

/// One row of a lab results table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRow {
    /// Test name as written
    pub test: String,
    pub value: f64,
    /// Unit as written, empty when absent
    pub unit: String,
    /// Reference range column, when present (e.g., "70-100")
    pub reference: Option<String>,
    /// Status column as written (e.g., "High"), empty when absent
    pub status: String,
    /// The full source line
    pub source_line: String,
}

/// Extract all tables from `text`.
pub fn extract_tables(text: &str) -> Vec<Vec<TableRow>> {
    let mut tables = Vec::new();
    let mut current: Vec<TableRow> = Vec::new();
    let mut in_table = false;

    for line in text.lines() {
        if in_table {
            if let Some(row) = parse_row(line) {
                current.push(row);
                continue;
            }
            // Blank line, mismatch or a fresh header all close the table.
            flush(&mut tables, &mut current);
            in_table = false;
        }

        if is_header(line) {
            in_table = true;
        }
    }

    flush(&mut tables, &mut current);
    tables
}

/// Check if a line looks like a table header.
pub fn is_header(line: &str) -> bool {
    HEADER.is_match(line)
}

/// Parse one table row.
pub fn parse_row(line: &str) -> Option<TableRow> {
    let caps = ROW.captures(line)?;
    let value = caps.name("value")?.as_str().parse::<f64>().ok()?;

    Some(TableRow {
        test: caps.name("name")?.as_str().trim().to_string(),
        value,
        unit: caps
            .name("unit")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        reference: caps.name("range").map(|m| m.as_str().to_string()),
        status: caps
            .name("status")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        source_line: line.trim().to_string(),
    })
}

fn flush(tables: &mut Vec<Vec<TableRow>>, current: &mut Vec<TableRow>) {
    if !current.is_empty() {
        tables.push(std::mem::take(current));
    }
}
