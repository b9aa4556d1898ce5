use serde::Serialize;

use crate::pipeline::stage1_select::PopulationSummary;

pub mod json;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub receiver: PopulationSummary,
    pub senders: Vec<PopulationSummary>,
    pub conditions: ConditionSummary,
    pub thresholds: ThresholdSummary,
    pub genes: GeneCounts,
    pub ligands: LigandCounts,
    pub top_ligands: Vec<TopLigand>,
    pub links: LinkCounts,
    pub outputs: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionSummary {
    pub column: String,
    pub case: String,
    pub reference: String,
    pub n_case: usize,
    pub n_reference: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSummary {
    pub receiver_min_pct: f64,
    pub sender_min_pct: f64,
    pub de_min_pct: f64,
    pub padj_max: f64,
    pub min_abs_log2fc: f64,
    pub p_adjust: String,
    pub top_ligands: usize,
    pub targets_per_ligand: usize,
    pub ligand_target_quantile: f64,
    pub chord_link_cutoff: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneCounts {
    pub receiver_expressed: usize,
    pub sender_expressed: usize,
    pub tested: usize,
    pub geneset: usize,
    pub geneset_dropped_not_in_network: usize,
    pub background: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LigandCounts {
    pub expressed_ligands: usize,
    pub expressed_receptors: usize,
    pub potential: usize,
    pub ranked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopLigand {
    pub rank: usize,
    pub ligand: String,
    pub pearson: f64,
    pub auroc: Option<f64>,
    pub aupr: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkCounts {
    pub ligand_target: usize,
    pub ligand_receptor: usize,
    pub ligand_receptor_curated: usize,
    pub chord_visible: usize,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn format_opt_6(v: Option<f64>) -> String {
    v.map(format_f64_6).unwrap_or_else(|| "NA".to_string())
}
