use std::collections::BTreeSet;

use crate::model::activity::LigandActivity;
use crate::networks::{LigandTargetMatrix, LrNetwork};
use crate::stats::correlation::{aupr, auroc, pearson};

#[derive(Debug, Clone, Default)]
pub struct LigandCandidates {
    pub expressed_ligands: BTreeSet<String>,
    pub expressed_receptors: BTreeSet<String>,
    /// Sender-expressed ligands with at least one receiver-expressed receptor.
    pub potential_ligands: Vec<String>,
}

pub fn potential_ligands(
    lr_network: &LrNetwork,
    sender_expressed: &BTreeSet<String>,
    receiver_expressed: &BTreeSet<String>,
) -> LigandCandidates {
    let expressed_ligands: BTreeSet<String> = lr_network
        .ligands()
        .intersection(sender_expressed)
        .cloned()
        .collect();
    let expressed_receptors: BTreeSet<String> = lr_network
        .receptors()
        .intersection(receiver_expressed)
        .cloned()
        .collect();
    let potential: BTreeSet<String> = lr_network
        .interactions
        .iter()
        .filter(|i| {
            expressed_ligands.contains(&i.ligand) && expressed_receptors.contains(&i.receptor)
        })
        .map(|i| i.ligand.clone())
        .collect();

    tracing::info!(
        "{} expressed ligands, {} expressed receptors, {} potential ligands",
        expressed_ligands.len(),
        expressed_receptors.len(),
        potential.len()
    );

    LigandCandidates {
        expressed_ligands,
        expressed_receptors,
        potential_ligands: potential.into_iter().collect(),
    }
}

/// Target universe for scoring: receiver-expressed genes plus the gene set,
/// restricted to genes the ligand-target network covers. Sorted.
pub fn background_genes(
    receiver_expressed: &BTreeSet<String>,
    geneset: &[String],
    ligand_target: &LigandTargetMatrix,
) -> Vec<String> {
    receiver_expressed
        .iter()
        .chain(geneset.iter())
        .filter(|g| ligand_target.has_target(g))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Scores each potential ligand by how well its target-weight profile over the
/// background predicts gene-set membership. Ligands absent from the matrix,
/// without any positive weight on a gene-set gene, or with a constant profile
/// are left out. Sorted by descending Pearson, then ligand symbol.
pub fn rank_ligands(
    geneset: &[String],
    background: &[String],
    ligand_target: &LigandTargetMatrix,
    potential: &[String],
) -> Vec<LigandActivity> {
    let in_geneset: BTreeSet<&str> = geneset.iter().map(|s| s.as_str()).collect();
    let target_ids: Vec<usize> = background
        .iter()
        .filter_map(|g| ligand_target.target_id(g))
        .collect();
    let labels: Vec<bool> = target_ids
        .iter()
        .map(|&t| in_geneset.contains(ligand_target.targets()[t].as_str()))
        .collect();
    let response: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();

    let mut missing = 0usize;
    let mut unsupported = 0usize;
    let mut out = Vec::new();
    for ligand in potential {
        let Some(ligand_id) = ligand_target.ligand_id(ligand) else {
            missing += 1;
            continue;
        };
        let column = ligand_target.profile(ligand_id);
        let scores: Vec<f64> = target_ids.iter().map(|&t| column[t] as f64).collect();
        let supported = scores.iter().zip(&labels).any(|(s, l)| *l && *s > 0.0);
        let Some(r) = pearson(&scores, &response).filter(|_| supported) else {
            unsupported += 1;
            continue;
        };
        out.push(LigandActivity {
            ligand: ligand.clone(),
            pearson: r,
            auroc: auroc(&scores, &labels),
            aupr: aupr(&scores, &labels),
            rank: 0,
        });
    }

    out.sort_by(|a, b| {
        b.pearson
            .total_cmp(&a.pearson)
            .then_with(|| a.ligand.cmp(&b.ligand))
    });
    for (i, activity) in out.iter_mut().enumerate() {
        activity.rank = i + 1;
    }

    if missing > 0 {
        tracing::warn!("{} potential ligands have no ligand-target profile", missing);
    }
    tracing::info!(
        "ranked {} ligands over {} background genes ({} without support in the gene set)",
        out.len(),
        target_ids.len(),
        unsupported
    );
    out
}

pub fn top_ligands(activities: &[LigandActivity], k: usize) -> Vec<String> {
    activities.iter().take(k).map(|a| a.ligand.clone()).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_activity.rs"]
mod tests;
