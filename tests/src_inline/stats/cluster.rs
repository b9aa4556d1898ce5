use super::*;

fn blocks() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.5, 2.0, 0.0, 0.0],
        vec![0.0, 0.0, 3.0, 1.0],
    ]
}

#[test]
fn test_binary_distance() {
    assert!((binary_distance(&[1.0, 0.0, 2.0, 0.0], &[1.0, 1.0, 0.0, 0.0]) - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(binary_distance(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    assert_eq!(binary_distance(&[0.2, 0.0], &[0.9, 0.0]), 0.0);
    assert_eq!(binary_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
}

#[test]
fn test_ward_merges_identical_pairs_first() {
    let rows = vec![
        vec![1.0, 1.0, 0.0, 0.0],
        vec![1.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
    ];
    let tree = ward_d2(&distance_matrix(&rows, binary_distance));
    assert_eq!(tree.merges.len(), 3);
    assert_eq!(tree.merges[0], Merge { left: -1, right: -2, height: 0.0 });
    assert_eq!(tree.merges[1], Merge { left: -3, right: -4, height: 0.0 });
    assert_eq!((tree.merges[2].left, tree.merges[2].right), (1, 2));
    assert!((tree.merges[2].height - 2.0_f64.sqrt()).abs() < 1e-12);
    assert_eq!(tree.order, vec![0, 1, 2, 3]);
}

#[test]
fn test_binary_ward_order_groups_shared_patterns() {
    let order = binary_ward_order(&blocks());
    assert_eq!(order, vec![0, 2, 1, 3]);
}

#[test]
fn test_degenerate_inputs() {
    assert!(binary_ward_order(&[]).is_empty());
    assert_eq!(binary_ward_order(&[vec![1.0, 0.0]]), vec![0]);
    let tree = ward_d2(&[vec![0.0]]);
    assert!(tree.merges.is_empty());
}

#[test]
fn test_order_is_a_permutation() {
    let rows: Vec<Vec<f64>> = (0..7)
        .map(|i| (0..5).map(|j| if (i * 3 + j) % 4 == 0 { 1.0 } else { 0.0 }).collect())
        .collect();
    let mut order = binary_ward_order(&rows);
    assert_eq!(order.len(), 7);
    order.sort_unstable();
    assert_eq!(order, (0..7).collect::<Vec<_>>());
}
