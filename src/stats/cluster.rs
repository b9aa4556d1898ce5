//! Agglomerative clustering used only to order heatmap rows and columns.

/// Binary (asymmetric Jaccard) distance between rows: among positions where at
/// least one row is non-zero, the fraction where exactly one is. Two all-zero
/// rows are at distance 0.
pub fn binary_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut either = 0usize;
    let mut only_one = 0usize;
    for (x, y) in a.iter().zip(b) {
        let nx = *x != 0.0;
        let ny = *y != 0.0;
        if nx || ny {
            either += 1;
            if nx != ny {
                only_one += 1;
            }
        }
    }
    if either == 0 {
        0.0
    } else {
        only_one as f64 / either as f64
    }
}

pub fn distance_matrix(rows: &[Vec<f64>], metric: fn(&[f64], &[f64]) -> f64) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut d = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let v = metric(&rows[i], &rows[j]);
            d[i][j] = v;
            d[j][i] = v;
        }
    }
    d
}

/// A merge step. Negative ids are leaves (`-(i + 1)`), positive ids are
/// earlier steps (1-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: i64,
    pub right: i64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    pub merges: Vec<Merge>,
    pub order: Vec<usize>,
}

/// Ward linkage on squared distances (`ward.D2`). Ties pick the lowest pair of
/// active cluster slots, and the leaf order is a left-first walk of the merge
/// tree. Neither matches R `hclust` tie handling or its `order` exactly, so
/// row/column order can differ from R-drawn heatmaps. Only display order
/// depends on it.
pub fn ward_d2(dist: &[Vec<f64>]) -> Dendrogram {
    let n = dist.len();
    if n == 0 {
        return Dendrogram {
            merges: Vec::new(),
            order: Vec::new(),
        };
    }

    let mut d2: Vec<Vec<f64>> = dist
        .iter()
        .map(|row| row.iter().map(|v| v * v).collect())
        .collect();
    let mut size = vec![1usize; n];
    let mut active = vec![true; n];
    let mut id: Vec<i64> = (0..n).map(|i| -(i as i64 + 1)).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                if best.is_none_or(|(_, _, b)| d2[i][j] < b) {
                    best = Some((i, j, d2[i][j]));
                }
            }
        }
        let Some((i, j, dij)) = best else {
            break;
        };

        let (left, right) = order_pair(id[i], id[j]);
        merges.push(Merge {
            left,
            right,
            height: dij.max(0.0).sqrt(),
        });

        let (ni, nj) = (size[i] as f64, size[j] as f64);
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let nk = size[k] as f64;
            let updated =
                ((ni + nk) * d2[i][k] + (nj + nk) * d2[j][k] - nk * dij) / (ni + nj + nk);
            d2[i][k] = updated;
            d2[k][i] = updated;
        }
        size[i] += size[j];
        active[j] = false;
        id[i] = step as i64;
    }

    let order = leaf_order(&merges, n);
    Dendrogram { merges, order }
}

/// Singletons before clusters; otherwise the smaller label first.
fn order_pair(a: i64, b: i64) -> (i64, i64) {
    match (a < 0, b < 0) {
        (true, true) => {
            if a > b {
                (a, b)
            } else {
                (b, a)
            }
        }
        (true, false) => (a, b),
        (false, true) => (b, a),
        (false, false) => (a.min(b), a.max(b)),
    }
}

fn leaf_order(merges: &[Merge], n: usize) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n).collect();
    }
    let mut order = Vec::with_capacity(n);
    let mut stack = vec![merges.len() as i64];
    while let Some(node) = stack.pop() {
        if node < 0 {
            order.push((-node - 1) as usize);
        } else {
            let m = merges[(node - 1) as usize];
            stack.push(m.right);
            stack.push(m.left);
        }
    }
    order
}

/// Display order for the rows of `matrix` under binary distance + Ward.D2.
pub fn binary_ward_order(matrix: &[Vec<f64>]) -> Vec<usize> {
    ward_d2(&distance_matrix(matrix, binary_distance)).order
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/cluster.rs"]
mod tests;
