use crate::report::{RunSummary, format_f64_6, format_opt_6};

pub fn render_report_text(s: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("Cell-Cell Communication Report\n");
    out.push_str("==============================\n\n");

    out.push_str("1. Populations\n");
    out.push_str(&format!(
        "Receiver: {} ({} cells; dataset {}, clusters {})\n",
        s.receiver.name,
        s.receiver.n_cells,
        s.receiver.dataset,
        s.receiver.clusters.join(", ")
    ));
    for sender in &s.senders {
        out.push_str(&format!(
            "Sender: {} ({} cells; dataset {}, clusters {})\n",
            sender.name,
            sender.n_cells,
            sender.dataset,
            sender.clusters.join(", ")
        ));
    }
    out.push('\n');

    out.push_str("2. Receiver signature\n");
    out.push_str(&format!(
        "{} ({} cells) vs {} ({} cells) on column '{}'\n",
        s.conditions.case,
        s.conditions.n_case,
        s.conditions.reference,
        s.conditions.n_reference,
        s.conditions.column
    ));
    out.push_str(&format!(
        "Tested genes: {}\nGene set of interest: {} (padj <= {}, |log2FC| >= {}, {} adjustment)\n",
        s.genes.tested,
        s.genes.geneset,
        format_f64_6(s.thresholds.padj_max),
        format_f64_6(s.thresholds.min_abs_log2fc),
        s.thresholds.p_adjust
    ));
    if s.genes.geneset_dropped_not_in_network > 0 {
        out.push_str(&format!(
            "Significant genes without a ligand-target prior: {}\n",
            s.genes.geneset_dropped_not_in_network
        ));
    }
    out.push_str(&format!("Background genes: {}\n\n", s.genes.background));

    out.push_str("3. Ligand activity\n");
    out.push_str(&format!(
        "Expressed ligands: {}\nExpressed receptors: {}\nPotential ligands: {}\nRanked ligands: {}\n",
        s.ligands.expressed_ligands,
        s.ligands.expressed_receptors,
        s.ligands.potential,
        s.ligands.ranked
    ));
    if s.top_ligands.is_empty() {
        out.push_str("No ligand has predictive support for the gene set.\n");
    } else {
        out.push_str("rank\tligand\tpearson\tauroc\taupr\n");
        for l in &s.top_ligands {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                l.rank,
                l.ligand,
                format_f64_6(l.pearson),
                format_opt_6(l.auroc),
                format_opt_6(l.aupr)
            ));
        }
    }
    out.push('\n');

    out.push_str("4. Networks\n");
    out.push_str(&format!(
        "Ligand-target links: {}\nLigand-receptor links: {} ({} curated)\nChord links shown: {}\n",
        s.links.ligand_target,
        s.links.ligand_receptor,
        s.links.ligand_receptor_curated,
        s.links.chord_visible
    ));

    if !s.warnings.is_empty() {
        out.push_str("\n5. Caveats\n");
        for w in &s.warnings {
            out.push_str(&format!("- {}\n", w));
        }
    }

    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
