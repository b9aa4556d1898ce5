use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::gz::open_maybe_gz;

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub symbol_raw: String,
    pub symbol_norm: String,
    pub feature_type: Option<String>,
}

/// Reads 10x `features.tsv` (v3, three columns) or `genes.tsv` (v2, two columns).
pub fn parse_features(path: &Path) -> Result<Vec<Feature>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut features = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        let (id, symbol_raw) = match cols.as_slice() {
            [id, symbol, ..] => (id.trim(), symbol.trim()),
            [id] => {
                tracing::debug!("features line {} has a single column; using it as symbol", line_no);
                (id.trim(), id.trim())
            }
            [] => continue,
        };
        features.push(Feature {
            id: id.to_string(),
            symbol_raw: symbol_raw.to_string(),
            symbol_norm: normalize_symbol(symbol_raw),
            feature_type: cols.get(2).map(|s| s.trim().to_string()),
        });
    }

    if features.is_empty() {
        return Err(InputError::Parse(format!(
            "features file {} is empty",
            path.display()
        )));
    }

    Ok(features)
}

/// Upper-cased symbol; Ensembl ids lose their version suffix.
pub fn normalize_symbol(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let upper = trimmed.to_ascii_uppercase();
    if let Some((left, right)) = upper.rsplit_once('.') {
        if left.starts_with("ENS") && right.chars().all(|c| c.is_ascii_digit()) {
            return left.to_string();
        }
    }
    upper
}
