use std::collections::{BTreeMap, BTreeSet};

use crate::config::{AnalysisConfig, ConfigError};
use crate::input::{ExpressionObject, InputError};
use crate::model::activity::LigandActivity;
use crate::model::links::LigandTargetLink;
use crate::model::matrix::VizMatrix;
use crate::model::signature::Signature;
use crate::networks::{NetworkError, PriorNetworks};
use crate::render::RenderError;

pub mod stage1_select;
pub mod stage2_expressed;
pub mod stage3_signature;
pub mod stage4_activity;
pub mod stage5_networks;
pub mod stage6_annotate;
pub mod stage7_report;

use stage1_select::{
    Population, PopulationSummary, select_population, split_by_cluster, subset_by_tissue,
    validate_clusters,
};
use stage2_expressed::{expressed_genes, expressed_genes_union};
use stage3_signature::{SignatureParams, extract_signature};
use stage4_activity::{LigandCandidates, background_genes, potential_ligands, rank_ligands, top_ligands};
use stage5_networks::{
    NetworkView, ligand_activity_view, ligand_receptor_view, ligand_target_links,
    ligand_target_view,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("selection error: {0}")]
    Selection(String),
    #[error("no cells selected for {0}")]
    EmptyPopulation(String),
    #[error("condition '{label}' has no cells in population '{population}' (available: {available})")]
    MissingCondition {
        label: String,
        population: String,
        available: String,
    },
    #[error("gene set of interest is empty for population '{0}'; relax the DE thresholds")]
    EmptyGeneSet(String),
    #[error("annotation error: {0}")]
    Annotation(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Heatmap inputs derived from the prioritized ligands.
#[derive(Debug, Clone)]
pub struct NetworkViews {
    pub ligand_target: VizMatrix,
    pub ligand_receptor: NetworkView,
    pub ligand_receptor_strict: NetworkView,
    pub activity: VizMatrix,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub receiver: PopulationSummary,
    pub senders: Vec<PopulationSummary>,
    pub receiver_expressed: BTreeSet<String>,
    pub sender_expressed: BTreeSet<String>,
    pub signature: Signature,
    pub background: Vec<String>,
    pub candidates: LigandCandidates,
    pub activities: Vec<LigandActivity>,
    pub top_ligands: Vec<String>,
    pub ligand_targets: Vec<LigandTargetLink>,
    /// `None` when no ligand could be ranked.
    pub views: Option<NetworkViews>,
}

/// Tissue-restricted datasets plus the receiver and sender populations cut from them.
fn select_populations(
    config: &AnalysisConfig,
    datasets: &BTreeMap<String, ExpressionObject>,
) -> Result<(Population, Vec<Population>), PipelineError> {
    let cluster_col = config.columns.cluster.as_str();
    let mut restricted: BTreeMap<String, ExpressionObject> = BTreeMap::new();

    let mut select = |name: &str| -> Result<Population, PipelineError> {
        let group = config.group(name)?;
        let object = datasets.get(&group.dataset).ok_or_else(|| {
            PipelineError::Selection(format!(
                "group '{}' needs dataset '{}', which was not loaded",
                name, group.dataset
            ))
        })?;
        let clusters = group.labels();
        validate_clusters(object, name, cluster_col, &clusters)?;
        if !restricted.contains_key(group.dataset.as_str()) {
            let subset = subset_by_tissue(object, &config.columns.tissue, &config.tissues)?;
            restricted.insert(group.dataset.clone(), subset);
        }
        let subset = restricted.get(group.dataset.as_str()).ok_or_else(|| {
            PipelineError::Selection(format!("dataset '{}' unavailable", group.dataset))
        })?;
        select_population(subset, name, cluster_col, &clusters)
    };

    let receiver = select(&config.receiver)?;
    let mut senders = Vec::with_capacity(config.senders.len());
    for name in &config.senders {
        senders.push(select(name)?);
    }
    Ok((receiver, senders))
}

/// Runs selection, signature extraction, ligand ranking and network ordering.
pub fn run_analysis(
    config: &AnalysisConfig,
    datasets: &BTreeMap<String, ExpressionObject>,
    networks: &PriorNetworks,
) -> Result<AnalysisResult, PipelineError> {
    let t = &config.thresholds;
    let (receiver, senders) = select_populations(config, datasets)?;

    let receiver_expressed = expressed_genes(&receiver.object, t.receiver_min_pct);
    let mut sender_expressed = BTreeSet::new();
    for sender in &senders {
        let parts = split_by_cluster(sender, &config.columns.cluster)?;
        sender_expressed.extend(expressed_genes_union(&parts, t.sender_min_pct));
    }
    tracing::info!(
        "{} genes expressed in receiver, {} in senders",
        receiver_expressed.len(),
        sender_expressed.len()
    );

    let params = SignatureParams {
        condition_column: config.condition_column().to_string(),
        case: config.conditions.case.clone(),
        reference: config.conditions.reference.clone(),
        min_pct: t.de_min_pct,
        padj_max: t.padj_max,
        min_abs_log2fc: t.min_abs_log2fc,
        p_adjust: t.p_adjust,
    };
    let signature = extract_signature(&receiver, &params, &networks.ligand_target)?;
    if signature.geneset.is_empty() {
        return Err(PipelineError::EmptyGeneSet(receiver.name.clone()));
    }

    let background = background_genes(&receiver_expressed, &signature.geneset, &networks.ligand_target);
    let candidates = potential_ligands(&networks.lr_network, &sender_expressed, &receiver_expressed);
    let activities = rank_ligands(
        &signature.geneset,
        &background,
        &networks.ligand_target,
        &candidates.potential_ligands,
    );
    let top = top_ligands(&activities, t.top_ligands);

    let mut ligand_targets = Vec::new();
    let views = if top.is_empty() {
        tracing::warn!("no ligand could be ranked against the gene set; skipping network views");
        None
    } else {
        tracing::info!("top {} ligands: {}", top.len(), top.join(", "));
        ligand_targets = ligand_target_links(
            &top,
            &signature.geneset,
            &networks.ligand_target,
            t.targets_per_ligand,
        );
        let ligand_target = ligand_target_view(&top, &ligand_targets, t.ligand_target_quantile);
        let ligand_receptor = ligand_receptor_view(
            "Prioritized ligands x receptors",
            &top,
            &networks.lr_network,
            &candidates.expressed_receptors,
            &networks.weighted_lr,
            false,
        );
        let ligand_receptor_strict = ligand_receptor_view(
            "Prioritized ligands x receptors (curated interactions)",
            &top,
            &networks.lr_network.curated(),
            &candidates.expressed_receptors,
            &networks.weighted_lr,
            true,
        );
        Some(NetworkViews {
            ligand_target,
            ligand_receptor,
            ligand_receptor_strict,
            activity: ligand_activity_view(&activities, t.top_ligands),
        })
    };

    Ok(AnalysisResult {
        receiver: receiver.summary(&config.columns.tissue),
        senders: senders
            .iter()
            .map(|s| s.summary(&config.columns.tissue))
            .collect(),
        receiver_expressed,
        sender_expressed,
        signature,
        background,
        candidates,
        activities,
        top_ligands: top,
        ligand_targets,
        views,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/support.rs"]
pub(crate) mod support;

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod_tests.rs"]
mod tests;
