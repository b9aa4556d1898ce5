use super::*;
use crate::pipeline::stage1_select::select_population;
use crate::pipeline::support::{build_object, cells, tcell_dataset};

#[test]
fn test_detection_fractions() {
    let mut specs = cells(3, "Tumor", "0", &[("A", 1.0)]);
    specs.extend(cells(1, "Tumor", "0", &[("A", 2.0), ("B", 1.0)]));
    let object = build_object("x", &["A", "B", "C"], &specs);
    assert_eq!(detection_fractions(&object), vec![1.0, 0.25, 0.0]);
}

#[test]
fn test_expressed_genes_threshold() {
    let mut specs = cells(3, "Tumor", "0", &[("A", 1.0)]);
    specs.extend(cells(1, "Tumor", "0", &[("A", 2.0), ("B", 1.0)]));
    let object = build_object("x", &["A", "B", "C"], &specs);

    let strict = expressed_genes(&object, 0.5);
    assert_eq!(strict.into_iter().collect::<Vec<_>>(), vec!["A".to_string()]);
    let loose = expressed_genes(&object, 0.0);
    assert!(loose.contains("B"));
    assert!(!loose.contains("C"));
}

#[test]
fn test_expressed_sets_grow_as_threshold_drops() {
    let object = tcell_dataset();
    let detected = expressed_genes(&object, 0.0);
    let mut previous = BTreeSet::new();
    for threshold in [0.9, 0.5, 0.3, 0.1, 0.05, 0.0] {
        let genes = expressed_genes(&object, threshold);
        assert!(genes.is_subset(&detected));
        assert!(previous.is_subset(&genes));
        previous = genes;
    }
}

#[test]
fn test_union_over_clusters() {
    let mut specs = cells(4, "Tumor", "0", &[("A", 1.0)]);
    specs.extend(cells(1, "Tumor", "0", &[("B", 1.0)]));
    specs.extend(cells(4, "Tumor", "1", &[("B", 1.0)]));
    let object = build_object("x", &["A", "B"], &specs);
    let c0 = select_population(&object, "c0", "cluster", &["0".to_string()]).unwrap();
    let c1 = select_population(&object, "c1", "cluster", &["1".to_string()]).unwrap();

    let union = expressed_genes_union(&[c0.clone(), c1], 0.5);
    assert!(union.contains("A"));
    assert!(union.contains("B"));
    assert!(!expressed_genes_union(&[c0], 0.5).contains("B"));
}
