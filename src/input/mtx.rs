use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::input::gz::open_maybe_gz;
use crate::input::{GeneIndex, InputError};

pub fn find_matrix_path(input_dir: &Path, prefix: Option<&str>) -> Result<PathBuf, InputError> {
    let stem = match prefix {
        Some(p) => format!("{}_matrix.mtx", p),
        None => "matrix.mtx".to_string(),
    };
    let plain = input_dir.join(&stem);
    if plain.exists() {
        return Ok(plain);
    }
    let gz = input_dir.join(format!("{}.gz", stem));
    if gz.exists() {
        return Ok(gz);
    }
    Err(InputError::MissingInput(format!(
        "missing matrix.mtx or matrix.mtx.gz in {}",
        input_dir.display()
    )))
}

fn parse_field<T: std::str::FromStr>(raw: Option<&str>, what: &str, line_no: usize) -> Result<T, InputError> {
    raw.and_then(|s| s.parse::<T>().ok()).ok_or_else(|| {
        InputError::Parse(format!("invalid {} at matrix line {}", what, line_no))
    })
}

/// Reads a features x cells MatrixMarket file into per-cell columns of
/// (gene id, count). Features without a gene id are dropped; duplicate symbols
/// are summed.
pub fn read_mtx_cells(
    path: &Path,
    n_features_raw: usize,
    n_cells: usize,
    gene_index: &GeneIndex,
) -> Result<Vec<Vec<(u32, f32)>>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(InputError::Parse("matrix.mtx is empty".to_string()));
    }
    if !buf.trim_end().starts_with("%%MatrixMarket") {
        return Err(InputError::Parse("missing MatrixMarket header".to_string()));
    }

    let mut line_no = 1usize;
    let (rows, cols) = loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Err(InputError::Parse("missing matrix size line".to_string()));
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.starts_with('%') || line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let rows: usize = parse_field(parts.next(), "row count", line_no)?;
        let cols: usize = parse_field(parts.next(), "column count", line_no)?;
        let _nnz: usize = parse_field(parts.next(), "nnz count", line_no)?;
        break (rows, cols);
    };

    if rows != n_features_raw {
        return Err(InputError::InvalidInput(format!(
            "matrix row count {} does not match features {}",
            rows, n_features_raw
        )));
    }
    if cols != n_cells {
        return Err(InputError::InvalidInput(format!(
            "matrix column count {} does not match barcodes {}",
            cols, n_cells
        )));
    }

    let mut per_col: Vec<BTreeMap<u32, f64>> = vec![BTreeMap::new(); cols];

    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let row: usize = parse_field(parts.next(), "row index", line_no)?;
        let col: usize = parse_field(parts.next(), "col index", line_no)?;
        let val: f64 = parse_field(parts.next(), "value", line_no)?;
        if row == 0 || row > rows || col == 0 || col > cols {
            return Err(InputError::Parse(format!(
                "matrix entry out of bounds at line {}",
                line_no
            )));
        }
        if val == 0.0 {
            continue;
        }
        if let Some(gene_id) = gene_index.gene_id_by_feature.get(row - 1).and_then(|v| *v) {
            *per_col[col - 1].entry(gene_id as u32).or_insert(0.0) += val;
        }
    }

    Ok(per_col
        .into_iter()
        .map(|map| map.into_iter().map(|(g, v)| (g, v as f32)).collect())
        .collect())
}
