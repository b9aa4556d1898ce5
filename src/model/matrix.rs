/// Named dense matrix handed to the heatmap renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct VizMatrix {
    pub title: String,
    pub row_names: Vec<String>,
    pub col_names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl VizMatrix {
    pub fn new(title: &str, row_names: Vec<String>, col_names: Vec<String>) -> Self {
        let values = vec![vec![0.0; col_names.len()]; row_names.len()];
        Self {
            title: title.to_string(),
            row_names,
            col_names,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_names.is_empty() || self.col_names.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.row_names.len()
    }

    pub fn n_cols(&self) -> usize {
        self.col_names.len()
    }

    pub fn transpose(&self) -> VizMatrix {
        let mut out = VizMatrix::new(&self.title, self.col_names.clone(), self.row_names.clone());
        for (r, row) in self.values.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                out.values[c][r] = *v;
            }
        }
        out
    }

    pub fn reorder(&self, row_order: &[usize], col_order: &[usize]) -> VizMatrix {
        VizMatrix {
            title: self.title.clone(),
            row_names: row_order.iter().map(|&r| self.row_names[r].clone()).collect(),
            col_names: col_order.iter().map(|&c| self.col_names[c].clone()).collect(),
            values: row_order
                .iter()
                .map(|&r| col_order.iter().map(|&c| self.values[r][c]).collect())
                .collect(),
        }
    }

    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.values.iter().flatten() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        if lo > hi { (0.0, 0.0) } else { (lo, hi) }
    }
}
