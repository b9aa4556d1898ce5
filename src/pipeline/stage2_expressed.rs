use std::collections::BTreeSet;

use crate::input::ExpressionObject;
use crate::pipeline::stage1_select::Population;

/// Fraction of cells with a non-zero count, per gene id.
pub fn detection_fractions(object: &ExpressionObject) -> Vec<f64> {
    let mut detected = vec![0u32; object.n_genes()];
    for cell in 0..object.n_cells() {
        object.for_cell_counts(cell, &mut |gene_id, count| {
            if count > 0.0 {
                detected[gene_id as usize] += 1;
            }
        });
    }
    let n = object.n_cells();
    detected
        .into_iter()
        .map(|d| if n == 0 { 0.0 } else { d as f64 / n as f64 })
        .collect()
}

/// Genes detected in at least `min_pct` of the population's cells. Undetected
/// genes never qualify, even at a zero threshold.
pub fn expressed_genes(object: &ExpressionObject, min_pct: f64) -> BTreeSet<String> {
    detection_fractions(object)
        .iter()
        .enumerate()
        .filter(|&(_, &frac)| frac > 0.0 && frac >= min_pct)
        .map(|(gene_id, _)| object.symbol(gene_id as u32).to_string())
        .collect()
}

/// Union of per-sub-population expressed genes.
pub fn expressed_genes_union(populations: &[Population], min_pct: f64) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for population in populations {
        let genes = expressed_genes(&population.object, min_pct);
        tracing::debug!(
            population = population.name.as_str(),
            "{} genes expressed at >= {}",
            genes.len(),
            min_pct
        );
        out.extend(genes);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_expressed.rs"]
mod tests;
