use crate::error::Result;
use crate::types::{AggregatedRow, Measure};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

/// Write a derived table as CSV. The header comes from the first row; an
/// empty table produces an empty file.
pub fn write_csv(path: &Path, rows: &[AggregatedRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    if let Some(first) = rows.first() {
        wtr.write_record(first.columns())?;
    }
    for r in rows {
        wtr.write_record(r.cells())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn display_measure(m: &Measure) -> String {
    match m {
        Measure::Number(v) => format_number(*v, 2),
        Measure::Integer(v) => format_int(*v),
    }
}

/// Render the first `max_rows` rows as a Markdown table.
pub fn render_preview(rows: &[AggregatedRow], max_rows: usize) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".to_string();
    };
    let mut builder = Builder::default();
    builder.push_record(first.columns());
    for r in rows.iter().take(max_rows) {
        builder.push_record(
            r.keys
                .values()
                .map(|v| v.to_string())
                .chain(r.metrics.values().map(display_measure)),
        );
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table_rows(rows: &[AggregatedRow], max_rows: usize) {
    println!("{}\n", render_preview(rows, max_rows));
}
