use crate::config::PAdjustMethod;
use crate::input::ExpressionObject;
use crate::model::signature::{DeGene, Signature};
use crate::networks::LigandTargetMatrix;
use crate::pipeline::PipelineError;
use crate::pipeline::stage1_select::Population;
use crate::stats::adjust::{benjamini_hochberg, bonferroni};
use crate::stats::ranksum::wilcoxon_rank_sum;

#[derive(Debug, Clone)]
pub struct SignatureParams {
    pub condition_column: String,
    pub case: String,
    pub reference: String,
    pub min_pct: f64,
    pub padj_max: f64,
    pub min_abs_log2fc: f64,
    pub p_adjust: PAdjustMethod,
}

/// Gene-major view of log-normalized values: per gene, (cell, value) pairs.
fn gene_major(object: &ExpressionObject) -> Vec<Vec<(u32, f32)>> {
    let mut out: Vec<Vec<(u32, f32)>> = vec![Vec::new(); object.n_genes()];
    for cell in 0..object.n_cells() {
        object.for_cell_normalized(cell, &mut |gene_id, value| {
            if value > 0.0 {
                out[gene_id as usize].push((cell as u32, value));
            }
        });
    }
    out
}

/// log2 of the mean un-logged expression plus one, the Seurat-style average.
fn log2_mean_expm1(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().map(|v| v.exp_m1()).sum::<f64>() / values.len() as f64;
    (mean + 1.0).log2()
}

/// Compares `case` against `reference` cells inside the receiver population and
/// keeps genes passing both the adjusted p-value and fold-change cutoffs that
/// the ligand-target network knows as targets.
pub fn extract_signature(
    population: &Population,
    params: &SignatureParams,
    ligand_target: &LigandTargetMatrix,
) -> Result<Signature, PipelineError> {
    let object = &population.object;
    let col = object
        .meta
        .column_index(&params.condition_column)
        .ok_or_else(|| {
            PipelineError::Selection(format!(
                "population '{}' has no condition column '{}'",
                population.name, params.condition_column
            ))
        })?;

    // slot[cell] = Some(true) for case, Some(false) for reference
    let mut slot: Vec<Option<bool>> = vec![None; object.n_cells()];
    let mut n_case = 0usize;
    let mut n_reference = 0usize;
    for (cell, s) in slot.iter_mut().enumerate() {
        let label = object.meta.value(cell, col);
        if label == params.case {
            *s = Some(true);
            n_case += 1;
        } else if label == params.reference {
            *s = Some(false);
            n_reference += 1;
        }
    }
    for (label, n) in [(&params.case, n_case), (&params.reference, n_reference)] {
        if n == 0 {
            return Err(PipelineError::MissingCondition {
                label: label.clone(),
                population: population.name.clone(),
                available: object.meta.levels(col).join(", "),
            });
        }
    }
    tracing::info!(
        population = population.name.as_str(),
        "comparing {} {} cells against {} {} cells",
        n_case,
        params.case,
        n_reference,
        params.reference
    );

    let by_gene = gene_major(object);
    let mut tested: Vec<DeGene> = Vec::new();
    let mut case_values = Vec::with_capacity(n_case);
    let mut ref_values = Vec::with_capacity(n_reference);

    for (gene_id, entries) in by_gene.iter().enumerate() {
        let mut detected_case = 0usize;
        let mut detected_ref = 0usize;
        for &(cell, _) in entries {
            match slot[cell as usize] {
                Some(true) => detected_case += 1,
                Some(false) => detected_ref += 1,
                None => {}
            }
        }
        let pct_case = detected_case as f64 / n_case as f64;
        let pct_reference = detected_ref as f64 / n_reference as f64;
        if detected_case + detected_ref == 0 || pct_case.max(pct_reference) < params.min_pct {
            continue;
        }

        case_values.clear();
        ref_values.clear();
        case_values.resize(n_case - detected_case, 0.0);
        ref_values.resize(n_reference - detected_ref, 0.0);
        for &(cell, value) in entries {
            match slot[cell as usize] {
                Some(true) => case_values.push(value as f64),
                Some(false) => ref_values.push(value as f64),
                None => {}
            }
        }

        let test = wilcoxon_rank_sum(&case_values, &ref_values);
        tested.push(DeGene {
            gene: object.symbol(gene_id as u32).to_string(),
            pct_case,
            pct_reference,
            log2fc: log2_mean_expm1(&case_values) - log2_mean_expm1(&ref_values),
            p_value: test.p_value,
            p_adj: 1.0,
        });
    }

    let p: Vec<f64> = tested.iter().map(|g| g.p_value).collect();
    let adjusted = match params.p_adjust {
        PAdjustMethod::Bonferroni => bonferroni(&p, object.n_genes()),
        PAdjustMethod::BenjaminiHochberg => benjamini_hochberg(&p),
    };
    for (gene, adj) in tested.iter_mut().zip(adjusted) {
        gene.p_adj = adj;
    }
    tested.sort_by(|a, b| a.p_adj.total_cmp(&b.p_adj).then_with(|| a.gene.cmp(&b.gene)));

    let mut geneset = Vec::new();
    let mut dropped_not_in_network = 0usize;
    for gene in tested
        .iter()
        .filter(|g| g.passes(params.padj_max, params.min_abs_log2fc))
    {
        if ligand_target.has_target(&gene.gene) {
            geneset.push(gene.gene.clone());
        } else {
            dropped_not_in_network += 1;
        }
    }
    geneset.sort();
    geneset.dedup();

    tracing::info!(
        population = population.name.as_str(),
        "tested {} genes; gene set of interest has {} genes ({} significant genes absent from the network)",
        tested.len(),
        geneset.len(),
        dropped_not_in_network
    );

    Ok(Signature {
        tested,
        geneset,
        dropped_not_in_network,
        n_case,
        n_reference,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_signature.rs"]
mod tests;
