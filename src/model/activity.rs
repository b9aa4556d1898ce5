#[derive(Debug, Clone, PartialEq)]
pub struct LigandActivity {
    pub ligand: String,
    pub pearson: f64,
    pub auroc: Option<f64>,
    pub aupr: Option<f64>,
    /// 1-based position in the descending Pearson order.
    pub rank: usize,
}
