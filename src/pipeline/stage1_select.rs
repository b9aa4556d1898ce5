use std::collections::{BTreeMap, BTreeSet};

use crate::input::ExpressionObject;
use crate::pipeline::PipelineError;

/// Named cell population cut from one dataset.
#[derive(Debug, Clone)]
pub struct Population {
    pub name: String,
    pub clusters: Vec<String>,
    pub object: ExpressionObject,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PopulationSummary {
    pub name: String,
    pub dataset: String,
    pub clusters: Vec<String>,
    pub n_cells: usize,
    pub n_cells_by_tissue: BTreeMap<String, usize>,
}

impl Population {
    pub fn n_cells(&self) -> usize {
        self.object.n_cells()
    }

    pub fn summary(&self, tissue_column: &str) -> PopulationSummary {
        let mut n_cells_by_tissue = BTreeMap::new();
        if let Some(col) = self.object.meta.column_index(tissue_column) {
            for cell in 0..self.object.n_cells() {
                *n_cells_by_tissue
                    .entry(self.object.meta.value(cell, col).to_string())
                    .or_insert(0) += 1;
            }
        }
        PopulationSummary {
            name: self.name.clone(),
            dataset: self.object.name.clone(),
            clusters: self.clusters.clone(),
            n_cells: self.n_cells(),
            n_cells_by_tissue,
        }
    }
}

fn require_column(object: &ExpressionObject, column: &str) -> Result<usize, PipelineError> {
    object.meta.column_index(column).ok_or_else(|| {
        PipelineError::Selection(format!(
            "dataset '{}' has no metadata column '{}' (columns: {})",
            object.name,
            column,
            object.meta.columns.join(", ")
        ))
    })
}

/// Indices of cells whose `column` value is one of `labels`.
pub fn select_cells(object: &ExpressionObject, column: usize, labels: &[String]) -> Vec<usize> {
    let wanted: BTreeSet<&str> = labels.iter().map(|s| s.as_str()).collect();
    (0..object.n_cells())
        .filter(|&cell| wanted.contains(object.meta.value(cell, column)))
        .collect()
}

/// Reduced copy restricted to the tissues of interest. Tissues absent from the
/// dataset are reported; an empty result is an error.
pub fn subset_by_tissue(
    object: &ExpressionObject,
    tissue_column: &str,
    tissues: &[String],
) -> Result<ExpressionObject, PipelineError> {
    let col = require_column(object, tissue_column)?;
    let levels = object.meta.levels(col);
    for tissue in tissues {
        if !levels.contains(tissue) {
            tracing::warn!(
                dataset = object.name.as_str(),
                "tissue '{}' not present (available: {})",
                tissue,
                levels.join(", ")
            );
        }
    }
    let keep = select_cells(object, col, tissues);
    if keep.is_empty() {
        return Err(PipelineError::EmptyPopulation(format!(
            "{} restricted to tissues [{}]",
            object.name,
            tissues.join(", ")
        )));
    }
    tracing::info!(
        dataset = object.name.as_str(),
        "kept {} of {} cells in tissues [{}]",
        keep.len(),
        object.n_cells(),
        tissues.join(", ")
    );
    Ok(object.subset(&keep))
}

/// Every requested cluster id must exist in the dataset metadata, so a
/// renumbered clustering fails loudly instead of selecting nothing.
pub fn validate_clusters(
    object: &ExpressionObject,
    group: &str,
    cluster_column: &str,
    clusters: &[String],
) -> Result<(), PipelineError> {
    let col = require_column(object, cluster_column)?;
    let levels = object.meta.levels(col);
    let missing: Vec<&str> = clusters
        .iter()
        .filter(|c| !levels.contains(c))
        .map(|c| c.as_str())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(PipelineError::Selection(format!(
        "group '{}': clusters [{}] not found in dataset '{}' column '{}' (available: {})",
        group,
        missing.join(", "),
        object.name,
        cluster_column,
        levels.join(", ")
    )))
}

/// Cells of `object` belonging to any of `clusters`, as a reduced copy.
pub fn select_population(
    object: &ExpressionObject,
    name: &str,
    cluster_column: &str,
    clusters: &[String],
) -> Result<Population, PipelineError> {
    let col = require_column(object, cluster_column)?;
    let keep = select_cells(object, col, clusters);
    if keep.is_empty() {
        return Err(PipelineError::EmptyPopulation(name.to_string()));
    }
    tracing::info!(
        population = name,
        "selected {} cells from clusters [{}]",
        keep.len(),
        clusters.join(", ")
    );
    Ok(Population {
        name: name.to_string(),
        clusters: clusters.to_vec(),
        object: object.subset(&keep),
    })
}

/// One sub-population per cluster id, for per-cluster expression filtering.
/// Clusters left without cells by the tissue restriction are skipped.
pub fn split_by_cluster(
    population: &Population,
    cluster_column: &str,
) -> Result<Vec<Population>, PipelineError> {
    let col = require_column(&population.object, cluster_column)?;
    let mut out = Vec::with_capacity(population.clusters.len());
    for cluster in &population.clusters {
        let keep = select_cells(&population.object, col, std::slice::from_ref(cluster));
        if keep.is_empty() {
            tracing::warn!(
                population = population.name.as_str(),
                "cluster {} has no cells in the selected tissues; skipping",
                cluster
            );
            continue;
        }
        out.push(Population {
            name: format!("{}:{}", population.name, cluster),
            clusters: vec![cluster.clone()],
            object: population.object.subset(&keep),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_select.rs"]
mod tests;
