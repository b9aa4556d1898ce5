use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod barcodes;
pub mod features;
pub mod gz;
pub mod meta;
pub mod mtx;

use barcodes::parse_barcodes;
use features::{Feature, parse_features};
use meta::{CellMeta, load_meta};
use mtx::{find_matrix_path, read_mtx_cells};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct GeneIndex {
    pub gene_id_by_feature: Vec<Option<usize>>,
    pub symbols_by_gene_id: Vec<String>,
}

/// Cells x genes counts with per-cell metadata. Columns hold raw counts per cell,
/// sorted by gene id.
#[derive(Debug, Clone)]
pub struct ExpressionObject {
    pub name: String,
    pub gene_index: GeneIndex,
    pub barcodes: Vec<String>,
    pub meta: CellMeta,
    pub cells: Vec<Vec<(u32, f32)>>,
    pub libsizes: Vec<f32>,
}

pub const NORMALIZE_SCALE: f64 = 10_000.0;

impl ExpressionObject {
    pub fn new(
        name: &str,
        gene_index: GeneIndex,
        barcodes: Vec<String>,
        meta: CellMeta,
        cells: Vec<Vec<(u32, f32)>>,
    ) -> Result<Self, InputError> {
        if barcodes.len() != cells.len() || meta.rows.len() != cells.len() {
            return Err(InputError::InvalidInput(format!(
                "{}: {} barcodes, {} metadata rows, {} matrix columns",
                name,
                barcodes.len(),
                meta.rows.len(),
                cells.len()
            )));
        }
        let libsizes = cells
            .iter()
            .map(|col| col.iter().map(|&(_, v)| v as f64).sum::<f64>() as f32)
            .collect();
        Ok(Self {
            name: name.to_string(),
            gene_index,
            barcodes,
            meta,
            cells,
            libsizes,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_genes(&self) -> usize {
        self.gene_index.symbols_by_gene_id.len()
    }

    pub fn symbol(&self, gene_id: u32) -> &str {
        &self.gene_index.symbols_by_gene_id[gene_id as usize]
    }

    pub fn for_cell_counts(&self, cell: usize, f: &mut dyn FnMut(u32, f32)) {
        for &(gene_id, count) in &self.cells[cell] {
            f(gene_id, count);
        }
    }

    /// Log-normalized values: ln(1 + count / libsize * 1e4).
    pub fn for_cell_normalized(&self, cell: usize, f: &mut dyn FnMut(u32, f32)) {
        let lib = self.libsizes[cell] as f64;
        for &(gene_id, count) in &self.cells[cell] {
            let value = if lib == 0.0 {
                0.0
            } else {
                ((count as f64) / lib * NORMALIZE_SCALE).ln_1p() as f32
            };
            f(gene_id, value);
        }
    }

    /// Reduced copy holding only `keep` (in the given order).
    pub fn subset(&self, keep: &[usize]) -> ExpressionObject {
        ExpressionObject {
            name: self.name.clone(),
            gene_index: self.gene_index.clone(),
            barcodes: keep.iter().map(|&c| self.barcodes[c].clone()).collect(),
            meta: CellMeta {
                columns: self.meta.columns.clone(),
                rows: keep.iter().map(|&c| self.meta.rows[c].clone()).collect(),
            },
            cells: keep.iter().map(|&c| self.cells[c].clone()).collect(),
            libsizes: keep.iter().map(|&c| self.libsizes[c]).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub mtx: PathBuf,
    pub features: PathBuf,
    pub barcodes: PathBuf,
}

pub fn load_dataset(
    name: &str,
    input_dir: &Path,
    meta_path: &Path,
) -> Result<ExpressionObject, InputError> {
    let paths = discover_paths(input_dir)?;

    tracing::info!(
        dataset = name,
        "discovered input files: mtx={}, features={}, barcodes={}",
        paths.mtx.display(),
        paths.features.display(),
        paths.barcodes.display()
    );

    let features = parse_features(&paths.features)?;
    let gene_index = build_gene_index(&features);
    let barcodes = parse_barcodes(&paths.barcodes)?;
    let meta = load_meta(meta_path, &barcodes)?;
    let cells = read_mtx_cells(&paths.mtx, features.len(), barcodes.len(), &gene_index)?;

    let object = ExpressionObject::new(name, gene_index, barcodes, meta, cells)?;
    tracing::info!(
        dataset = name,
        "loaded {} cells x {} genes",
        object.n_cells(),
        object.n_genes()
    );
    Ok(object)
}

pub fn discover_paths(input_dir: &Path) -> Result<DatasetPaths, InputError> {
    let prefix = detect_prefix(input_dir)?;
    Ok(DatasetPaths {
        mtx: find_matrix_path(input_dir, prefix.as_deref())?,
        features: find_features_path(input_dir, prefix.as_deref())?,
        barcodes: find_barcodes_path(input_dir, prefix.as_deref())?,
    })
}

pub fn build_gene_index(features: &[Feature]) -> GeneIndex {
    let mut symbols_by_gene_id: Vec<String> = Vec::new();
    let mut symbol_to_gene_id: HashMap<String, usize> = HashMap::new();
    let mut gene_id_by_feature: Vec<Option<usize>> = Vec::with_capacity(features.len());

    for (idx, feature) in features.iter().enumerate() {
        if feature.symbol_norm.is_empty() {
            gene_id_by_feature.push(None);
            continue;
        }
        if let Some(feature_type) = &feature.feature_type {
            if feature_type != "Gene Expression" {
                gene_id_by_feature.push(None);
                continue;
            }
        }
        if let Some(existing) = symbol_to_gene_id.get(feature.symbol_norm.as_str()) {
            tracing::warn!(
                "duplicate gene symbol; mapping to existing gene id: feature_index={}, symbol={}",
                idx,
                feature.symbol_norm
            );
            gene_id_by_feature.push(Some(*existing));
            continue;
        }
        let gene_id = symbols_by_gene_id.len();
        symbols_by_gene_id.push(feature.symbol_norm.clone());
        symbol_to_gene_id.insert(feature.symbol_norm.clone(), gene_id);
        gene_id_by_feature.push(Some(gene_id));
    }

    GeneIndex {
        gene_id_by_feature,
        symbols_by_gene_id,
    }
}

fn prefixed(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}_{}", p, name),
        None => name.to_string(),
    }
}

fn first_existing(
    input_dir: &Path,
    prefix: Option<&str>,
    candidates: &[&str],
) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| input_dir.join(prefixed(prefix, name)))
        .find(|path| path.exists())
}

fn find_features_path(input_dir: &Path, prefix: Option<&str>) -> Result<PathBuf, InputError> {
    first_existing(
        input_dir,
        prefix,
        &[
            "features.tsv",
            "features.tsv.gz",
            "genes.tsv",
            "genes.tsv.gz",
        ],
    )
    .ok_or_else(|| {
        InputError::MissingInput(format!(
            "missing features.tsv(.gz) or genes.tsv in {}",
            input_dir.display()
        ))
    })
}

fn find_barcodes_path(input_dir: &Path, prefix: Option<&str>) -> Result<PathBuf, InputError> {
    first_existing(input_dir, prefix, &["barcodes.tsv", "barcodes.tsv.gz"]).ok_or_else(|| {
        InputError::MissingInput(format!(
            "missing barcodes.tsv or barcodes.tsv.gz in {}",
            input_dir.display()
        ))
    })
}

/// GEO-style sample prefix (`GSM123_matrix.mtx`), if the directory uses one.
pub fn detect_prefix(input_dir: &Path) -> Result<Option<String>, InputError> {
    let mut prefixes = std::collections::BTreeSet::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        for suffix in [
            "_matrix.mtx",
            "_matrix.mtx.gz",
            "_features.tsv",
            "_features.tsv.gz",
            "_barcodes.tsv",
            "_barcodes.tsv.gz",
        ] {
            if let Some(prefix) = name.strip_suffix(suffix) {
                if !prefix.is_empty() {
                    prefixes.insert(prefix.to_string());
                }
            }
        }
    }
    if prefixes.len() > 1 {
        tracing::warn!(
            "multiple sample prefixes in {}; using the first: {:?}",
            input_dir.display(),
            prefixes
        );
    }
    Ok(prefixes.into_iter().next())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
