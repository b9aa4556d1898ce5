use std::collections::HashMap;
use std::path::Path;

use crate::input::InputError;
use crate::input::gz::{logical_name, open_maybe_gz};

/// Per-cell metadata aligned to barcode order. The barcode column is dropped.
#[derive(Debug, Clone)]
pub struct CellMeta {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CellMeta {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, cell: usize, column: usize) -> &str {
        self.rows[cell]
            .get(column)
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Distinct non-empty values of a column, sorted.
    pub fn levels(&self, column: usize) -> Vec<String> {
        let mut out: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// Reads a barcode-keyed metadata table (TSV, or CSV for `.csv` names, both
/// optionally gzipped) and aligns its rows to `barcodes`. Quoted fields such
/// as R `write.csv` exports are handled by the CSV reader.
pub fn load_meta(path: &Path, barcodes: &[String]) -> Result<CellMeta, InputError> {
    let delimiter = if logical_name(path).ends_with(".csv") {
        b','
    } else {
        b'\t'
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open_maybe_gz(path)?);

    let header_cols: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if header_cols.is_empty() || header_cols.iter().all(|h| h.is_empty()) {
        return Err(InputError::Parse(format!(
            "meta file {} is empty",
            path.display()
        )));
    }

    let barcode_col = header_cols
        .iter()
        .position(|name| {
            let lower = name.to_ascii_lowercase();
            lower == "barcode" || lower == "barcodes" || lower == "cell"
        })
        .unwrap_or(0);

    let columns: Vec<String> = header_cols
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != barcode_col)
        .map(|(_, name)| name.clone())
        .collect();

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        let line_no = record.position().map(|p| p.line()).unwrap_or(0);
        let Some(barcode) = record.get(barcode_col).filter(|b| !b.is_empty()) else {
            tracing::warn!("meta line has no barcode; skipping (line {})", line_no);
            continue;
        };
        if map.contains_key(barcode) {
            tracing::warn!(
                "duplicate barcode in metadata; keeping first (line {}, barcode {})",
                line_no,
                barcode
            );
            continue;
        }

        let row = (0..header_cols.len())
            .filter(|idx| *idx != barcode_col)
            .map(|idx| record.get(idx).unwrap_or("").to_string())
            .collect();
        map.insert(barcode.to_string(), row);
    }

    let mut unmatched = 0usize;
    let mut rows = Vec::with_capacity(barcodes.len());
    for bc in barcodes {
        match map.get(bc) {
            Some(row) => rows.push(row.clone()),
            None => {
                unmatched += 1;
                rows.push(vec![String::new(); columns.len()]);
            }
        }
    }
    if unmatched > 0 {
        tracing::warn!(
            "{} of {} barcodes have no metadata row in {}",
            unmatched,
            barcodes.len(),
            path.display()
        );
    }

    Ok(CellMeta { columns, rows })
}
