use crate::error::Result;
use crate::types::{RawRow, SalesRecord};
use crate::util::{coerce_sales, is_clean_sales, parse_year};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Sales cells that were missing or not clean numbers and were coerced.
    pub coerced_cells: usize,
    pub missing_years: usize,
}

pub fn load_and_clean(path: &Path, delimiter: char) -> Result<(Vec<SalesRecord>, LoadReport)> {
    info!("Loading sales table from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_from_reader(file, delimiter)
}

/// Read a header-led, delimiter-separated table. Rows that cannot be decoded
/// at all are counted and skipped; bad numeric cells are coerced to zero.
pub fn load_from_reader<R: Read>(reader: R, delimiter: char) -> Result<(Vec<SalesRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter_byte(delimiter))
        .from_reader(reader);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let cells = [
            row.na_sales.as_deref(),
            row.eu_sales.as_deref(),
            row.jp_sales.as_deref(),
            row.other_sales.as_deref(),
            row.global_sales.as_deref(),
        ];
        report.coerced_cells += cells.iter().filter(|c| !is_clean_sales(**c)).count();

        let year = parse_year(row.year.as_deref());
        if year.is_none() {
            report.missing_years += 1;
        }

        records.push(SalesRecord {
            name: text(row.name),
            platform: text(row.platform),
            genre: text(row.genre),
            publisher: text(row.publisher),
            year,
            na_sales: coerce_sales(cells[0]),
            eu_sales: coerce_sales(cells[1]),
            jp_sales: coerce_sales(cells[2]),
            other_sales: coerce_sales(cells[3]),
            global_sales: coerce_sales(cells[4]),
        });
    }

    report.loaded_rows = records.len();
    if report.parse_errors > 0 {
        warn!("{} rows could not be decoded and were skipped", report.parse_errors);
    }
    info!(
        rows = report.loaded_rows,
        coerced = report.coerced_cells,
        "Sales table loaded"
    );
    Ok((records, report))
}

fn text(cell: Option<String>) -> String {
    cell.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        warn!("Non-ASCII delimiter {:?} is not supported, using ','", delimiter);
        b','
    }
}
