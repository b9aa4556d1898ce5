use super::*;
use crate::pipeline::support::{ligand_target, lr_network};

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_potential_ligands_exact_intersection() {
    let lr = lr_network();
    let sender = set(&["L1", "L2", "L3", "M1"]);
    let receiver = set(&["R1", "R2", "R3", "G1"]);
    let c = potential_ligands(&lr, &sender, &receiver);
    assert_eq!(c.expressed_ligands, set(&["L1", "L2", "L3"]));
    assert_eq!(c.expressed_receptors, set(&["R1", "R2", "R3"]));
    assert_eq!(c.potential_ligands, strings(&["L1", "L2", "L3"]));

    // brute force over the raw interactions
    for i in &lr.interactions {
        let expected = sender.contains(&i.ligand)
            && lr
                .interactions
                .iter()
                .any(|j| j.ligand == i.ligand && receiver.contains(&j.receptor));
        assert_eq!(c.potential_ligands.contains(&i.ligand), expected);
    }
}

#[test]
fn test_ligand_without_expressed_receptor_dropped() {
    let lr = lr_network();
    let c = potential_ligands(&lr, &set(&["L1", "L2"]), &set(&["R2"]));
    assert_eq!(c.potential_ligands, strings(&["L2"]));
}

#[test]
fn test_background_is_network_restricted() {
    let lt = ligand_target(true);
    let bg = background_genes(&set(&["B1", "B2", "R1", "F1"]), &strings(&["G1", "G2"]), &lt);
    assert_eq!(bg, strings(&["B1", "B2", "G1", "G2"]));
}

#[test]
fn test_rank_ligands_orders_and_excludes() {
    let lt = ligand_target(true);
    let geneset = strings(&["G1", "G2"]);
    let background = strings(&["B1", "B2", "B3", "G1", "G2"]);
    let ranked = rank_ligands(&geneset, &background, &lt, &strings(&["L1", "L2", "L3", "L9"]));

    let names: Vec<&str> = ranked.iter().map(|a| a.ligand.as_str()).collect();
    assert_eq!(names, vec!["L1", "L3"]);
    assert!((ranked[0].pearson - 1.0).abs() < 1e-12);
    assert!((ranked[1].pearson - 1.0 / 6.0).abs() < 1e-9);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 2);
    assert_eq!(ranked[0].auroc, Some(1.0));
    assert_eq!(ranked[0].aupr, Some(1.0));
}

#[test]
fn test_rank_ties_broken_by_symbol() {
    let targets = strings(&["A", "B", "C"]);
    let ligands = strings(&["ZED", "ALF"]);
    let lt = LigandTargetMatrix::new(
        targets.clone(),
        ligands,
        vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]],
    )
    .unwrap();
    let ranked = rank_ligands(&strings(&["A"]), &targets, &lt, &strings(&["ZED", "ALF"]));
    assert_eq!(ranked[0].ligand, "ALF");
    assert_eq!(ranked[1].ligand, "ZED");
    assert_eq!(ranked[0].pearson, ranked[1].pearson);
}

#[test]
fn test_rank_is_deterministic_and_top_k_distinct() {
    let lt = ligand_target(true);
    let geneset = strings(&["G1", "G2"]);
    let background = strings(&["B1", "B2", "B3", "G1", "G2"]);
    let potential = strings(&["L3", "L1", "L2"]);
    let a = rank_ligands(&geneset, &background, &lt, &potential);
    let b = rank_ligands(&geneset, &background, &lt, &potential);
    assert_eq!(a, b);
    for pair in a.windows(2) {
        assert!(pair[0].pearson >= pair[1].pearson);
    }

    assert_eq!(top_ligands(&a, 1), strings(&["L1"]));
    let all = top_ligands(&a, 23);
    assert_eq!(all.len(), a.len());
    assert_eq!(all.iter().collect::<BTreeSet<_>>().len(), all.len());
}

#[test]
fn test_no_supported_ligand_gives_empty_ranking() {
    let lt = ligand_target(false);
    let ranked = rank_ligands(
        &strings(&["G1", "G2"]),
        &strings(&["B1", "B2", "B3", "G1", "G2"]),
        &lt,
        &strings(&["L1", "L2", "L3"]),
    );
    assert!(ranked.is_empty());
    assert!(top_ligands(&ranked, 23).is_empty());
}
