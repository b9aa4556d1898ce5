use super::*;
use crate::pipeline::stage1_select::{select_population, subset_by_tissue};
use crate::pipeline::support::{ligand_target, tcell_dataset};

fn tregs() -> Population {
    let object = subset_by_tissue(
        &tcell_dataset(),
        "tissue",
        &["Tumor".to_string(), "Mucosa".to_string()],
    )
    .unwrap();
    select_population(&object, "Tregs", "cluster", &["5".to_string()]).unwrap()
}

fn params() -> SignatureParams {
    SignatureParams {
        condition_column: "tissue".to_string(),
        case: "Tumor".to_string(),
        reference: "Mucosa".to_string(),
        min_pct: 0.10,
        padj_max: 0.05,
        min_abs_log2fc: 0.25,
        p_adjust: PAdjustMethod::Bonferroni,
    }
}

#[test]
fn test_signature_finds_tumor_genes_in_network() {
    let sig = extract_signature(&tregs(), &params(), &ligand_target(true)).unwrap();
    assert_eq!(sig.n_case, 10);
    assert_eq!(sig.n_reference, 10);
    assert_eq!(sig.geneset, vec!["G1".to_string(), "G2".to_string()]);
    // F1 is significant but unknown to the network
    assert_eq!(sig.dropped_not_in_network, 1);
    let lt = ligand_target(true);
    assert!(sig.geneset.iter().all(|g| lt.has_target(g)));
}

#[test]
fn test_signature_table_contents() {
    let sig = extract_signature(&tregs(), &params(), &ligand_target(true)).unwrap();
    // G3 is never detected in the receiver
    assert!(sig.tested.iter().all(|g| g.gene != "G3"));
    let g1 = sig.tested.iter().find(|g| g.gene == "G1").unwrap();
    assert_eq!(g1.pct_case, 1.0);
    assert_eq!(g1.pct_reference, 0.0);
    assert!(g1.log2fc > 5.0);
    assert!(g1.p_adj < 0.05);
    let b1 = sig.tested.iter().find(|g| g.gene == "B1").unwrap();
    assert_eq!(b1.p_value, 1.0);
    assert!(b1.log2fc.abs() < 1e-9);
    for pair in sig.tested.windows(2) {
        assert!(pair[0].p_adj <= pair[1].p_adj);
    }
}

#[test]
fn test_strict_fold_change_empties_geneset() {
    let mut p = params();
    p.min_abs_log2fc = 100.0;
    let sig = extract_signature(&tregs(), &p, &ligand_target(true)).unwrap();
    assert!(sig.geneset.is_empty());
}

#[test]
fn test_missing_condition_label() {
    let mut p = params();
    p.reference = "Normal".to_string();
    let err = extract_signature(&tregs(), &p, &ligand_target(true)).unwrap_err();
    match err {
        PipelineError::MissingCondition { label, available, .. } => {
            assert_eq!(label, "Normal");
            assert_eq!(available, "Mucosa, Tumor");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_benjamini_hochberg_option() {
    let mut p = params();
    p.p_adjust = PAdjustMethod::BenjaminiHochberg;
    let sig = extract_signature(&tregs(), &p, &ligand_target(true)).unwrap();
    assert_eq!(sig.geneset, vec!["G1".to_string(), "G2".to_string()]);
}
