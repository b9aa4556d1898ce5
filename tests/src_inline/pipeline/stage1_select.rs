use super::*;
use crate::pipeline::support::{build_object, cells, tcell_dataset};

fn tissues() -> Vec<String> {
    vec!["Tumor".to_string(), "Mucosa".to_string()]
}

#[test]
fn test_subset_by_tissue_leaves_source_untouched() {
    let object = tcell_dataset();
    let subset = subset_by_tissue(&object, "tissue", &tissues()).unwrap();
    assert_eq!(object.n_cells(), 27);
    assert_eq!(subset.n_cells(), 24);
    let col = subset.meta.column_index("tissue").unwrap();
    assert!((0..subset.n_cells()).all(|c| subset.meta.value(c, col) != "Blood"));
}

#[test]
fn test_subset_by_tissue_empty_is_error() {
    let object = tcell_dataset();
    let err = subset_by_tissue(&object, "tissue", &["Lung".to_string()]).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyPopulation(_)));
}

#[test]
fn test_missing_metadata_column() {
    let object = tcell_dataset();
    let err = subset_by_tissue(&object, "origin", &tissues()).unwrap_err();
    assert!(matches!(err, PipelineError::Selection(_)));
}

#[test]
fn test_select_population_by_cluster() {
    let object = subset_by_tissue(&tcell_dataset(), "tissue", &tissues()).unwrap();
    let pop = select_population(&object, "Tregs", "cluster", &["5".to_string()]).unwrap();
    assert_eq!(pop.n_cells(), 20);
    assert_eq!(pop.clusters, vec!["5".to_string()]);

    let summary = pop.summary("tissue");
    assert_eq!(summary.dataset, "tcell");
    assert_eq!(summary.n_cells_by_tissue.get("Tumor"), Some(&10));
    assert_eq!(summary.n_cells_by_tissue.get("Mucosa"), Some(&10));
}

#[test]
fn test_validate_clusters_reports_missing_ids() {
    let object = tcell_dataset();
    assert!(validate_clusters(&object, "Tregs", "cluster", &["5".to_string()]).is_ok());
    let err = validate_clusters(&object, "Tregs", "cluster", &["5".to_string(), "12".to_string()])
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("12"));
    assert!(msg.contains("available: 3, 5"));
}

#[test]
fn test_split_by_cluster_skips_empty_clusters() {
    let mut specs = cells(2, "Tumor", "0", &[("A", 1.0)]);
    specs.extend(cells(3, "Tumor", "1", &[("A", 1.0)]));
    specs.extend(cells(1, "Blood", "2", &[("A", 1.0)]));
    let object = build_object("m", &["A"], &specs);
    let restricted = subset_by_tissue(&object, "tissue", &["Tumor".to_string()]).unwrap();
    let pop = Population {
        name: "All".to_string(),
        clusters: vec!["0".to_string(), "1".to_string(), "2".to_string()],
        object: restricted,
    };
    let parts = split_by_cluster(&pop, "cluster").unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].n_cells(), 2);
    assert_eq!(parts[1].n_cells(), 3);
    assert_eq!(parts[1].name, "All:1");
}
