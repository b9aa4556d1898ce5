use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything a run needs: which datasets, which populations, which thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub datasets: BTreeMap<String, DatasetConfig>,
    #[serde(default)]
    pub columns: MetaColumns,
    pub tissues: Vec<String>,
    pub groups: BTreeMap<String, ClusterGroup>,
    pub receiver: String,
    pub senders: Vec<String>,
    pub conditions: ConditionPair,
    #[serde(default)]
    pub thresholds: Thresholds,
    pub networks: NetworkSources,
    #[serde(default)]
    pub categories: CategoryMaps,
    #[serde(default)]
    pub plot: PlotOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub input: PathBuf,
    pub meta: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MetaColumns {
    pub tissue: String,
    pub cluster: String,
}

impl Default for MetaColumns {
    fn default() -> Self {
        Self {
            tissue: "tissue".to_string(),
            cluster: "cluster".to_string(),
        }
    }
}

/// Cluster labels may be written as JSON numbers or strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClusterLabel {
    Number(i64),
    Text(String),
}

impl ClusterLabel {
    pub fn as_label(&self) -> String {
        match self {
            ClusterLabel::Number(n) => n.to_string(),
            ClusterLabel::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterGroup {
    pub dataset: String,
    pub clusters: Vec<ClusterLabel>,
}

impl ClusterGroup {
    pub fn labels(&self) -> Vec<String> {
        self.clusters.iter().map(ClusterLabel::as_label).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionPair {
    /// Metadata column holding the condition; defaults to the tissue column.
    #[serde(default)]
    pub column: Option<String>,
    pub case: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PAdjustMethod {
    Bonferroni,
    BenjaminiHochberg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Thresholds {
    pub receiver_min_pct: f64,
    pub sender_min_pct: f64,
    pub de_min_pct: f64,
    pub padj_max: f64,
    pub min_abs_log2fc: f64,
    pub p_adjust: PAdjustMethod,
    pub top_ligands: usize,
    pub targets_per_ligand: usize,
    pub ligand_target_quantile: f64,
    /// Chord links below this weight are hidden. `None` keeps at least one
    /// link visible per ligand.
    pub chord_link_cutoff: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            receiver_min_pct: 0.10,
            sender_min_pct: 0.05,
            de_min_pct: 0.10,
            padj_max: 0.05,
            min_abs_log2fc: 0.25,
            p_adjust: PAdjustMethod::Bonferroni,
            top_ligands: 23,
            targets_per_ligand: 200,
            ligand_target_quantile: 0.33,
            chord_link_cutoff: None,
        }
    }
}

/// Each source is a local path or an `http(s)://` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSources {
    pub ligand_target: String,
    pub lr_network: String,
    pub weighted_lr: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".kira-cellcomm-cache")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CategoryMaps {
    pub ligands: BTreeMap<String, String>,
    pub receptors: BTreeMap<String, String>,
}

impl CategoryMaps {
    pub fn is_empty(&self) -> bool {
        self.ligands.is_empty() && self.receptors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub chord_size: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
            chord_size: 1000,
        }
    }
}

impl AnalysisConfig {
    pub fn condition_column(&self) -> &str {
        self.conditions
            .column
            .as_deref()
            .unwrap_or(self.columns.tissue.as_str())
    }

    pub fn group(&self, name: &str) -> Result<&ClusterGroup, ConfigError> {
        self.groups
            .get(name)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown cluster group '{}'", name)))
    }

    /// Checks internal consistency; data-dependent checks happen at selection time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tissues.is_empty() {
            return Err(ConfigError::Invalid("tissues must not be empty".to_string()));
        }
        for (name, group) in &self.groups {
            if !self.datasets.contains_key(&group.dataset) {
                return Err(ConfigError::Invalid(format!(
                    "group '{}' references unknown dataset '{}'",
                    name, group.dataset
                )));
            }
            if group.clusters.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "group '{}' has no clusters",
                    name
                )));
            }
        }
        self.group(&self.receiver)?;
        if self.senders.is_empty() {
            return Err(ConfigError::Invalid("senders must not be empty".to_string()));
        }
        for sender in &self.senders {
            self.group(sender)?;
        }
        if self.conditions.case == self.conditions.reference {
            return Err(ConfigError::Invalid(
                "condition case and reference must differ".to_string(),
            ));
        }

        let t = &self.thresholds;
        for (name, v) in [
            ("receiver_min_pct", t.receiver_min_pct),
            ("sender_min_pct", t.sender_min_pct),
            ("de_min_pct", t.de_min_pct),
            ("padj_max", t.padj_max),
            ("ligand_target_quantile", t.ligand_target_quantile),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, v
                )));
            }
        }
        if t.min_abs_log2fc < 0.0 {
            return Err(ConfigError::Invalid(
                "min_abs_log2fc must be non-negative".to_string(),
            ));
        }
        if t.top_ligands == 0 || t.targets_per_ligand == 0 {
            return Err(ConfigError::Invalid(
                "top_ligands and targets_per_ligand must be positive".to_string(),
            ));
        }
        if self.plot.width < 200 || self.plot.height < 200 || self.plot.chord_size < 200 {
            return Err(ConfigError::Invalid(
                "plot dimensions must be at least 200 px".to_string(),
            ));
        }
        Ok(())
    }

    /// Starter config for the Treg / myeloid tumor-vs-mucosa analysis.
    pub fn template() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert(
            "myeloid".to_string(),
            DatasetConfig {
                input: PathBuf::from("data/myeloid"),
                meta: PathBuf::from("data/myeloid/meta.tsv"),
            },
        );
        datasets.insert(
            "tcell".to_string(),
            DatasetConfig {
                input: PathBuf::from("data/tcell"),
                meta: PathBuf::from("data/tcell/meta.tsv"),
            },
        );

        let mut groups = BTreeMap::new();
        groups.insert(
            "Tregs".to_string(),
            ClusterGroup {
                dataset: "tcell".to_string(),
                clusters: vec![ClusterLabel::Number(5)],
            },
        );
        groups.insert(
            "MyeloidAll".to_string(),
            ClusterGroup {
                dataset: "myeloid".to_string(),
                clusters: (0..10).map(ClusterLabel::Number).collect(),
            },
        );

        Self {
            datasets,
            columns: MetaColumns::default(),
            tissues: vec!["Tumor".to_string(), "Mucosa".to_string()],
            groups,
            receiver: "Tregs".to_string(),
            senders: vec!["MyeloidAll".to_string()],
            conditions: ConditionPair {
                column: None,
                case: "Tumor".to_string(),
                reference: "Mucosa".to_string(),
            },
            thresholds: Thresholds::default(),
            networks: NetworkSources {
                ligand_target: "networks/ligand_target_matrix.csv.gz".to_string(),
                lr_network: "networks/lr_network.csv.gz".to_string(),
                weighted_lr: "networks/weighted_lr_sig.csv.gz".to_string(),
                cache_dir: default_cache_dir(),
            },
            categories: CategoryMaps::default(),
            plot: PlotOptions::default(),
        }
    }

    /// Rebases relative dataset, network and cache paths onto `base`.
    pub fn anchor_paths(&mut self, base: &Path) {
        let anchor = |p: &Path| -> PathBuf {
            if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
        };
        for dataset in self.datasets.values_mut() {
            dataset.input = anchor(&dataset.input);
            dataset.meta = anchor(&dataset.meta);
        }
        let n = &mut self.networks;
        for source in [&mut n.ligand_target, &mut n.lr_network, &mut n.weighted_lr] {
            if !crate::networks::fetch::is_url(source) {
                *source = anchor(Path::new(source.as_str())).display().to_string();
            }
        }
        n.cache_dir = anchor(&n.cache_dir);
    }
}

/// Reads and validates a JSON config. Relative paths inside it are taken
/// relative to the config file's directory.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut config: AnalysisConfig = serde_json::from_str(&text)?;
    config.validate()?;
    if let Some(base) = path.parent() {
        config.anchor_paths(base);
    }
    Ok(config)
}

#[cfg(test)]
#[path = "../tests/src_inline/config.rs"]
mod tests;
