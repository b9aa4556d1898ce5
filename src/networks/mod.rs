use std::collections::{BTreeSet, HashMap};

pub mod fetch;
pub mod loader;

use crate::input::InputError;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("download of {url} failed: {message}")]
    Download { url: String, message: String },
    #[error("network parse error: {0}")]
    Parse(String),
}

/// Database tags whose interactions were inferred rather than curated.
pub const PREDICTED_DATABASES: &[&str] = &["ppi_prediction", "ppi_prediction_go"];

/// Prior regulatory potential of each ligand on each target gene.
/// Stored ligand-major so a ligand's profile is one contiguous slice.
#[derive(Debug, Clone)]
pub struct LigandTargetMatrix {
    targets: Vec<String>,
    ligands: Vec<String>,
    target_index: HashMap<String, usize>,
    ligand_index: HashMap<String, usize>,
    weights: Vec<f32>,
}

impl LigandTargetMatrix {
    /// `profiles[l][t]` is the weight of ligand `l` on target `t`.
    pub fn new(
        targets: Vec<String>,
        ligands: Vec<String>,
        profiles: Vec<Vec<f32>>,
    ) -> Result<Self, NetworkError> {
        if profiles.len() != ligands.len() {
            return Err(NetworkError::Parse(format!(
                "ligand-target matrix has {} ligand names but {} profiles",
                ligands.len(),
                profiles.len()
            )));
        }
        let mut weights = Vec::with_capacity(targets.len() * ligands.len());
        for (ligand, profile) in ligands.iter().zip(&profiles) {
            if profile.len() != targets.len() {
                return Err(NetworkError::Parse(format!(
                    "ligand {} has {} weights for {} targets",
                    ligand,
                    profile.len(),
                    targets.len()
                )));
            }
            weights.extend_from_slice(profile);
        }
        let target_index = unique_index(&targets, "target")?;
        let ligand_index = unique_index(&ligands, "ligand")?;
        Ok(Self {
            targets,
            ligands,
            target_index,
            ligand_index,
            weights,
        })
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn ligands(&self) -> &[String] {
        &self.ligands
    }

    pub fn n_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn target_id(&self, symbol: &str) -> Option<usize> {
        self.target_index.get(symbol).copied()
    }

    pub fn ligand_id(&self, symbol: &str) -> Option<usize> {
        self.ligand_index.get(symbol).copied()
    }

    pub fn has_target(&self, symbol: &str) -> bool {
        self.target_index.contains_key(symbol)
    }

    pub fn profile(&self, ligand_id: usize) -> &[f32] {
        let n = self.targets.len();
        &self.weights[ligand_id * n..(ligand_id + 1) * n]
    }

    pub fn weight(&self, ligand: &str, target: &str) -> Option<f32> {
        let l = self.ligand_id(ligand)?;
        let t = self.target_id(target)?;
        Some(self.profile(l)[t])
    }
}

fn unique_index(names: &[String], what: &str) -> Result<HashMap<String, usize>, NetworkError> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.clone(), i).is_some() {
            return Err(NetworkError::Parse(format!(
                "duplicate {} '{}' in ligand-target matrix",
                what, name
            )));
        }
    }
    Ok(index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrInteraction {
    pub ligand: String,
    pub receptor: String,
    pub source: String,
    pub database: String,
}

impl LrInteraction {
    pub fn is_predicted(&self) -> bool {
        PREDICTED_DATABASES.contains(&self.database.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LrNetwork {
    pub interactions: Vec<LrInteraction>,
}

impl LrNetwork {
    pub fn ligands(&self) -> BTreeSet<String> {
        self.interactions.iter().map(|i| i.ligand.clone()).collect()
    }

    pub fn receptors(&self) -> BTreeSet<String> {
        self.interactions.iter().map(|i| i.receptor.clone()).collect()
    }

    /// Only curated (non-prediction-derived) interactions.
    pub fn curated(&self) -> LrNetwork {
        LrNetwork {
            interactions: self
                .interactions
                .iter()
                .filter(|i| !i.is_predicted())
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEdge {
    pub ligand: String,
    pub receptor: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WeightedLrNetwork {
    pub edges: Vec<WeightedEdge>,
}

/// The three prior networks a run scores against.
#[derive(Debug, Clone)]
pub struct PriorNetworks {
    pub ligand_target: LigandTargetMatrix,
    pub lr_network: LrNetwork,
    pub weighted_lr: WeightedLrNetwork,
}

#[cfg(test)]
#[path = "../../tests/src_inline/networks/tests.rs"]
mod tests;
