use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_cellcomm_config_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const MINIMAL: &str = r#"{
  "datasets": {
    "tcell": { "input": "data/tcell", "meta": "data/tcell/meta.tsv" },
    "myeloid": { "input": "/abs/myeloid", "meta": "/abs/myeloid/meta.tsv" }
  },
  "tissues": ["Tumor", "Mucosa"],
  "groups": {
    "Tregs": { "dataset": "tcell", "clusters": [5] },
    "MyeloidAll": { "dataset": "myeloid", "clusters": [0, 1, "2"] }
  },
  "receiver": "Tregs",
  "senders": ["MyeloidAll"],
  "conditions": { "case": "Tumor", "reference": "Mucosa" },
  "networks": {
    "ligand_target": "nets/ligand_target_matrix.csv",
    "lr_network": "https://example.org/lr_network.csv.gz",
    "weighted_lr": "nets/weighted.csv"
  }
}"#;

#[test]
fn test_defaults_applied() {
    let config: AnalysisConfig = serde_json::from_str(MINIMAL).unwrap();
    config.validate().unwrap();
    let t = &config.thresholds;
    assert_eq!(t.receiver_min_pct, 0.10);
    assert_eq!(t.sender_min_pct, 0.05);
    assert_eq!(t.padj_max, 0.05);
    assert_eq!(t.min_abs_log2fc, 0.25);
    assert_eq!(t.top_ligands, 23);
    assert_eq!(t.targets_per_ligand, 200);
    assert_eq!(t.ligand_target_quantile, 0.33);
    assert_eq!(t.p_adjust, PAdjustMethod::Bonferroni);
    assert_eq!(config.columns.cluster, "cluster");
    assert_eq!(config.condition_column(), "tissue");
    assert!(config.categories.is_empty());
}

#[test]
fn test_cluster_labels_numbers_or_strings() {
    let config: AnalysisConfig = serde_json::from_str(MINIMAL).unwrap();
    assert_eq!(config.group("Tregs").unwrap().labels(), vec!["5".to_string()]);
    assert_eq!(
        config.group("MyeloidAll").unwrap().labels(),
        vec!["0".to_string(), "1".to_string(), "2".to_string()]
    );
    assert!(config.group("Bcells").is_err());
}

#[test]
fn test_validation_failures() {
    let base: AnalysisConfig = serde_json::from_str(MINIMAL).unwrap();

    let mut c = base.clone();
    c.receiver = "Unknown".to_string();
    assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));

    let mut c = base.clone();
    c.conditions.reference = "Tumor".to_string();
    assert!(c.validate().is_err());

    let mut c = base.clone();
    c.thresholds.receiver_min_pct = 1.5;
    assert!(c.validate().is_err());

    let mut c = base.clone();
    c.thresholds.top_ligands = 0;
    assert!(c.validate().is_err());

    let mut c = base.clone();
    c.groups.get_mut("Tregs").unwrap().dataset = "bcell".to_string();
    assert!(c.validate().is_err());

    let mut c = base;
    c.tissues.clear();
    assert!(c.validate().is_err());
}

#[test]
fn test_unknown_fields_rejected() {
    let text = MINIMAL.replacen("\"tissues\"", "\"tissue_list\": [], \"tissues\"", 1);
    let err = serde_json::from_str::<AnalysisConfig>(&text).unwrap_err();
    assert!(err.to_string().contains("tissue_list"));
}

#[test]
fn test_load_config_anchors_relative_paths() {
    let dir = make_temp_dir();
    let path = dir.join("analysis.json");
    std::fs::write(&path, MINIMAL).unwrap();
    let config = load_config(&path).unwrap();

    assert_eq!(config.datasets["tcell"].input, dir.join("data/tcell"));
    assert_eq!(config.datasets["myeloid"].input, PathBuf::from("/abs/myeloid"));
    assert_eq!(
        config.networks.ligand_target,
        dir.join("nets/ligand_target_matrix.csv").display().to_string()
    );
    assert_eq!(config.networks.lr_network, "https://example.org/lr_network.csv.gz");
    assert_eq!(config.networks.cache_dir, dir.join(".kira-cellcomm-cache"));
}

#[test]
fn test_load_config_errors() {
    let dir = make_temp_dir();
    assert!(matches!(
        load_config(&dir.join("missing.json")),
        Err(ConfigError::Io { .. })
    ));
    let bad = dir.join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(load_config(&bad), Err(ConfigError::Json(_))));
}

#[test]
fn test_template_round_trips_and_validates() {
    let template = AnalysisConfig::template();
    template.validate().unwrap();
    let json = serde_json::to_string_pretty(&template).unwrap();
    let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.receiver, "Tregs");
    assert_eq!(parsed.group("Tregs").unwrap().labels(), vec!["5".to_string()]);
    assert_eq!(parsed.group("MyeloidAll").unwrap().clusters.len(), 10);
}
