use std::collections::{BTreeMap, BTreeSet};

use crate::model::activity::LigandActivity;
use crate::model::links::{LigandReceptorLink, LigandTargetLink};
use crate::model::matrix::VizMatrix;
use crate::networks::{LigandTargetMatrix, LrNetwork, WeightedLrNetwork};
use crate::stats::cluster::binary_ward_order;
use crate::stats::quantile_linear;

/// Ordered ligand x receptor matrix plus the links behind it.
#[derive(Debug, Clone)]
pub struct NetworkView {
    pub matrix: VizMatrix,
    pub links: Vec<LigandReceptorLink>,
}

/// Per ligand, the strongest gene-set targets (positive weight only), at most
/// `per_ligand` of them.
pub fn ligand_target_links(
    ligands: &[String],
    geneset: &[String],
    ligand_target: &LigandTargetMatrix,
    per_ligand: usize,
) -> Vec<LigandTargetLink> {
    let mut out = Vec::new();
    for ligand in ligands {
        let mut targets: Vec<(&String, f64)> = geneset
            .iter()
            .filter_map(|g| ligand_target.weight(ligand, g).map(|w| (g, w as f64)))
            .filter(|&(_, w)| w > 0.0)
            .collect();
        targets.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out.extend(targets.into_iter().take(per_ligand).map(|(target, weight)| {
            LigandTargetLink {
                ligand: ligand.clone(),
                target: target.clone(),
                weight,
            }
        }));
    }
    out
}

/// Ligands (rows, activity order) x targets (columns, clustered). Weights under
/// the `quantile` of all retained link weights are zeroed, then empty rows and
/// columns are dropped.
pub fn ligand_target_view(ligands: &[String], links: &[LigandTargetLink], quantile: f64) -> VizMatrix {
    let weights: Vec<f64> = links.iter().map(|l| l.weight).collect();
    let cutoff = quantile_linear(&weights, quantile);

    let kept: Vec<&LigandTargetLink> = links.iter().filter(|l| l.weight >= cutoff).collect();
    let targets: Vec<String> = kept
        .iter()
        .map(|l| l.target.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let rows: Vec<String> = ligands
        .iter()
        .filter(|lig| kept.iter().any(|l| &l.ligand == *lig))
        .cloned()
        .collect();

    let mut matrix = VizMatrix::new("Prioritized ligands x predicted target genes", rows, targets);
    let row_index: BTreeMap<&str, usize> = matrix
        .row_names
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let col_index: BTreeMap<&str, usize> = matrix
        .col_names
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut cells = Vec::with_capacity(kept.len());
    for link in &kept {
        if let (Some(&r), Some(&c)) = (
            row_index.get(link.ligand.as_str()),
            col_index.get(link.target.as_str()),
        ) {
            cells.push((r, c, link.weight));
        }
    }
    for (r, c, w) in cells {
        matrix.values[r][c] = w;
    }

    if matrix.is_empty() {
        return matrix;
    }
    let row_order: Vec<usize> = (0..matrix.n_rows()).collect();
    let col_order = binary_ward_order(&matrix.transpose().values);
    matrix.reorder(&row_order, &col_order)
}

/// Ligand x receptor weights for `ligands` and their receiver-expressed
/// receptors, rows and columns ordered by binary-distance Ward clustering.
/// With `restrict_to_pairs`, only weighted edges that `lr_network` itself
/// contains are kept.
pub fn ligand_receptor_view(
    title: &str,
    ligands: &[String],
    lr_network: &LrNetwork,
    expressed_receptors: &BTreeSet<String>,
    weighted: &WeightedLrNetwork,
    restrict_to_pairs: bool,
) -> NetworkView {
    let top: BTreeSet<&str> = ligands.iter().map(|s| s.as_str()).collect();
    let pairs: BTreeSet<(&str, &str)> = lr_network
        .interactions
        .iter()
        .filter(|i| top.contains(i.ligand.as_str()) && expressed_receptors.contains(&i.receptor))
        .map(|i| (i.ligand.as_str(), i.receptor.as_str()))
        .collect();
    let receptors: BTreeSet<&str> = pairs.iter().map(|&(_, r)| r).collect();

    let mut weights: BTreeMap<(String, String), f64> = BTreeMap::new();
    for edge in &weighted.edges {
        if !top.contains(edge.ligand.as_str()) || !receptors.contains(edge.receptor.as_str()) {
            continue;
        }
        if restrict_to_pairs && !pairs.contains(&(edge.ligand.as_str(), edge.receptor.as_str())) {
            continue;
        }
        let entry = weights
            .entry((edge.ligand.clone(), edge.receptor.clone()))
            .or_insert(f64::NEG_INFINITY);
        *entry = entry.max(edge.weight);
    }

    let links: Vec<LigandReceptorLink> = weights
        .into_iter()
        .map(|((ligand, receptor), weight)| LigandReceptorLink {
            ligand,
            receptor,
            weight,
        })
        .collect();

    let row_names: Vec<String> = links
        .iter()
        .map(|l| l.ligand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col_names: Vec<String> = links
        .iter()
        .map(|l| l.receptor.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut matrix = VizMatrix::new(title, row_names, col_names);
    for link in &links {
        let r = matrix.row_names.binary_search(&link.ligand);
        let c = matrix.col_names.binary_search(&link.receptor);
        if let (Ok(r), Ok(c)) = (r, c) {
            matrix.values[r][c] = link.weight;
        }
    }

    if !matrix.is_empty() {
        let row_order = binary_ward_order(&matrix.values);
        let col_order = binary_ward_order(&matrix.transpose().values);
        matrix = matrix.reorder(&row_order, &col_order);
    }

    tracing::info!(
        "{}: {} ligands x {} receptors, {} links",
        title,
        matrix.n_rows(),
        matrix.n_cols(),
        links.len()
    );
    NetworkView { matrix, links }
}

/// Single-column heatmap of the prioritized ligands' Pearson scores.
pub fn ligand_activity_view(activities: &[LigandActivity], k: usize) -> VizMatrix {
    let top: Vec<&LigandActivity> = activities.iter().take(k).collect();
    let mut matrix = VizMatrix::new(
        "Ligand activity",
        top.iter().map(|a| a.ligand.clone()).collect(),
        vec!["Pearson".to_string()],
    );
    for (row, activity) in top.iter().enumerate() {
        matrix.values[row][0] = activity.pearson;
    }
    matrix
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_networks.rs"]
mod tests;
