/// Bonferroni: p * n_tests, capped at 1. `n_tests` may exceed `p.len()` when
/// genes were pre-filtered before testing.
pub fn bonferroni(p: &[f64], n_tests: usize) -> Vec<f64> {
    let n = n_tests.max(p.len()) as f64;
    p.iter().map(|&v| (v * n).min(1.0)).collect()
}

/// Benjamini-Hochberg step-up, returned in input order.
pub fn benjamini_hochberg(p: &[f64]) -> Vec<f64> {
    let n = p.len();
    if n == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p[b].total_cmp(&p[a]));

    let mut adjusted = vec![1.0; n];
    let mut running = 1.0f64;
    for (k, &idx) in order.iter().enumerate() {
        let rank = (n - k) as f64;
        running = running.min(p[idx] * n as f64 / rank);
        adjusted[idx] = running.min(1.0);
    }
    adjusted
}
