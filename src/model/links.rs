#[derive(Debug, Clone, PartialEq)]
pub struct LigandReceptorLink {
    pub ligand: String,
    pub receptor: String,
    pub weight: f64,
}

pub const UNASSIGNED_CATEGORY: &str = "unassigned";

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedLink {
    pub ligand: String,
    pub receptor: String,
    pub weight: f64,
    pub ligand_type: String,
    pub receptor_type: String,
}

/// A retained ligand -> target regulatory link for the ligand-target heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct LigandTargetLink {
    pub ligand: String,
    pub target: String,
    pub weight: f64,
}
