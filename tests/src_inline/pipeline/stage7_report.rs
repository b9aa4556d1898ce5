use super::*;
use crate::pipeline::run_analysis;
use crate::pipeline::support::{config, datasets, networks};
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_cellcomm_report_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn no_plots() -> OutputOptions<'static> {
    OutputOptions {
        annotations: None,
        skip_plots: true,
    }
}

#[test]
fn test_tables_and_summary_written() {
    let cfg = config();
    let result = run_analysis(&cfg, &datasets(), &networks(true)).unwrap();
    let dir = make_temp_dir();
    let summary = write_outputs(&cfg, &result, &dir, no_plots()).unwrap();

    let geneset = std::fs::read_to_string(dir.join("geneset.tsv")).unwrap();
    assert_eq!(geneset, "gene\nG1\nG2\n");

    let activities = std::fs::read_to_string(dir.join("ligand_activities.tsv")).unwrap();
    let mut lines = activities.lines();
    assert_eq!(lines.next(), Some("rank\tligand\tpearson\tauroc\taupr"));
    assert!(lines.next().unwrap().starts_with("1\tL1\t1.000000"));

    let de = std::fs::read_to_string(dir.join("de_results.tsv")).unwrap();
    assert!(de.lines().any(|l| l.starts_with("G1\t") && l.ends_with("\ttrue")));
    assert!(de.lines().any(|l| l.starts_with("F1\t") && l.ends_with("\tfalse")));

    let links = std::fs::read_to_string(dir.join(LINKS_CSV)).unwrap();
    assert_eq!(links, "ligand,receptor,weight\nL1,R1,0.9\nL3,R3,0.7\n");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(json["tool"], "kira-cellcomm");
    assert_eq!(json["genes"]["geneset"], 2);
    assert_eq!(json["ligands"]["potential"], 3);
    assert_eq!(json["top_ligands"][0]["ligand"], "L1");
    assert_eq!(json["thresholds"]["p_adjust"], "bonferroni");

    let report = std::fs::read_to_string(dir.join("report.txt")).unwrap();
    assert!(report.contains("Receiver: Tregs (20 cells"));
    assert_eq!(summary.links.ligand_receptor, 2);
    assert_eq!(summary.links.ligand_receptor_curated, 1);
    assert!(!dir.join("chord_diagram.svg").exists());
}

#[test]
fn test_plots_rendered() {
    let cfg = config();
    let result = run_analysis(&cfg, &datasets(), &networks(true)).unwrap();
    let dir = make_temp_dir();
    let options = OutputOptions {
        annotations: None,
        skip_plots: false,
    };
    let summary = write_outputs(&cfg, &result, &dir, options).unwrap();
    for name in [
        "ligand_target_heatmap.svg",
        "ligand_receptor_heatmap.svg",
        "ligand_receptor_strict_heatmap.svg",
        "ligand_activity_heatmap.svg",
        "chord_diagram.svg",
    ] {
        let svg = std::fs::read_to_string(dir.join(name)).unwrap();
        assert!(svg.contains("<svg"), "{name}");
        assert!(summary.outputs.iter().any(|o| o == name));
    }
    // every ligand keeps at least its strongest link
    assert_eq!(summary.links.chord_visible, 2);
}

#[test]
fn test_annotation_file_feeds_chord() {
    let cfg = config();
    let result = run_analysis(&cfg, &datasets(), &networks(true)).unwrap();
    let dir = make_temp_dir();
    let annotated = dir.join("annotated.csv");
    std::fs::write(
        &annotated,
        "ligand,receptor,weight,ligand_type,receptor_type\nL1,R1,0.9,cytokine,receptor\nL3,R3,0.7,chemokine,receptor\n",
    )
    .unwrap();
    let options = OutputOptions {
        annotations: Some(&annotated),
        skip_plots: true,
    };
    let summary = write_outputs(&cfg, &result, &dir, options).unwrap();
    assert!(summary.warnings.iter().all(|w| !w.contains("categories")));
}

#[test]
fn test_in_place_annotation_survives_rerun() {
    let cfg = config();
    let result = run_analysis(&cfg, &datasets(), &networks(true)).unwrap();
    let dir = make_temp_dir();
    write_outputs(&cfg, &result, &dir, no_plots()).unwrap();

    let links_path = dir.join(LINKS_CSV);
    let curated = "ligand,receptor,weight,ligand_type,receptor_type\n\
                   L1,R1,0.9,cytokine,receptor\n\
                   L3,R3,0.7,chemokine,receptor\n";
    std::fs::write(&links_path, curated).unwrap();

    let options = OutputOptions {
        annotations: Some(&links_path),
        skip_plots: true,
    };
    let summary = write_outputs(&cfg, &result, &dir, options).unwrap();
    assert_eq!(std::fs::read_to_string(&links_path).unwrap(), curated);
    assert!(summary.outputs.iter().any(|o| o == LINKS_CSV));
    assert_eq!(summary.links.chord_visible, 2);

    // a plain rerun leaves the curated file alone too
    write_outputs(&cfg, &result, &dir, no_plots()).unwrap();
    assert_eq!(std::fs::read_to_string(&links_path).unwrap(), curated);
}

#[test]
fn test_empty_ranking_skips_views() {
    let cfg = config();
    let result = run_analysis(&cfg, &datasets(), &networks(false)).unwrap();
    let dir = make_temp_dir();
    let summary = write_outputs(&cfg, &result, &dir, no_plots()).unwrap();
    assert!(dir.join("ligand_activities.tsv").exists());
    assert!(!dir.join(LINKS_CSV).exists());
    assert_eq!(summary.ligands.ranked, 0);
    assert!(!summary.warnings.is_empty());
    let report = std::fs::read_to_string(dir.join("report.txt")).unwrap();
    assert!(report.contains("No ligand has predictive support"));
}
