/// Per-gene result of the receiver condition comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DeGene {
    pub gene: String,
    pub pct_case: f64,
    pub pct_reference: f64,
    pub log2fc: f64,
    pub p_value: f64,
    pub p_adj: f64,
}

impl DeGene {
    pub fn passes(&self, padj_max: f64, min_abs_log2fc: f64) -> bool {
        self.p_adj <= padj_max && self.log2fc.abs() >= min_abs_log2fc
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    /// Every tested gene, ascending adjusted p-value.
    pub tested: Vec<DeGene>,
    /// Genes passing both filters and present in the ligand-target network, sorted.
    pub geneset: Vec<String>,
    /// Passing genes dropped because the network has no such target.
    pub dropped_not_in_network: usize,
    pub n_case: usize,
    pub n_reference: usize,
}
