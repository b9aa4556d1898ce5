use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{AnalysisConfig, PAdjustMethod};
use crate::model::activity::LigandActivity;
use crate::model::links::LigandTargetLink;
use crate::model::matrix::VizMatrix;
use crate::model::signature::Signature;
use crate::pipeline::stage6_annotate::{
    annotate_links, has_category_columns, read_annotated_links, write_links_csv,
};
use crate::pipeline::{AnalysisResult, PipelineError};
use crate::render::chord::{chord_layout, render_chord};
use crate::render::heatmap::render_heatmap;
use crate::render::palette::{
    ColorScale, activity_scale, ligand_receptor_scale, ligand_target_scale,
};
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{
    ConditionSummary, GeneCounts, LigandCounts, LinkCounts, RunSummary, ThresholdSummary,
    TopLigand, format_f64_6, format_opt_6,
};

pub const LINKS_CSV: &str = "ligand_receptor_links.csv";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub annotations: Option<&'a Path>,
    pub skip_plots: bool,
}

/// Writes tables, plots, `summary.json` and `report.txt` into `out_dir`.
pub fn write_outputs(
    config: &AnalysisConfig,
    result: &AnalysisResult,
    out_dir: &Path,
    options: OutputOptions<'_>,
) -> Result<RunSummary, PipelineError> {
    fs::create_dir_all(out_dir)?;
    let mut outputs = Vec::new();
    let mut warnings = Vec::new();
    let mut links = LinkCounts {
        ligand_target: result.ligand_targets.len(),
        ..LinkCounts::default()
    };

    write_geneset(&out_dir.join("geneset.tsv"), &result.signature.geneset)?;
    outputs.push("geneset.tsv".to_string());
    write_de_results(&out_dir.join("de_results.tsv"), &result.signature)?;
    outputs.push("de_results.tsv".to_string());
    write_activities(&out_dir.join("ligand_activities.tsv"), &result.activities)?;
    outputs.push("ligand_activities.tsv".to_string());
    write_ligand_targets(&out_dir.join("ligand_target_links.tsv"), &result.ligand_targets)?;
    outputs.push("ligand_target_links.tsv".to_string());

    match &result.views {
        None => warnings.push("no ligand could be ranked; network views and plots skipped".to_string()),
        Some(views) => {
            links.ligand_receptor = views.ligand_receptor.links.len();
            links.ligand_receptor_curated = views.ligand_receptor_strict.links.len();
            // Read before writing: the annotations may be the links file itself.
            let annotated_rows = match options.annotations {
                Some(path) => Some(read_annotated_links(path)?),
                None => None,
            };
            let links_path = out_dir.join(LINKS_CSV);
            if has_category_columns(&links_path)? {
                let msg = format!(
                    "{} already holds category columns; kept as is",
                    links_path.display()
                );
                tracing::warn!("{}", msg);
                warnings.push(msg);
            } else {
                write_links_csv(&links_path, &views.ligand_receptor.links)?;
            }
            outputs.push(LINKS_CSV.to_string());

            if annotated_rows.is_none() && config.categories.is_empty() {
                warnings.push(
                    "no ligand/receptor categories configured; chord sectors are unassigned"
                        .to_string(),
                );
            }
            let annotated = annotate_links(
                &views.ligand_receptor.links,
                &config.categories,
                annotated_rows.as_deref(),
            );
            let layout = chord_layout(&annotated, config.thresholds.chord_link_cutoff);
            links.chord_visible = layout.ribbons.iter().filter(|r| r.visible).count();

            if options.skip_plots {
                tracing::info!("plots skipped on request");
            } else {
                let plot = &config.plot;
                let heatmaps: [(&str, &VizMatrix, ColorScale, &str); 4] = [
                    (
                        "ligand_target_heatmap.svg",
                        &views.ligand_target,
                        ligand_target_scale(positive_max(&views.ligand_target)),
                        "Regulatory potential",
                    ),
                    (
                        "ligand_receptor_heatmap.svg",
                        &views.ligand_receptor.matrix,
                        ligand_receptor_scale(positive_max(&views.ligand_receptor.matrix)),
                        "Prior interaction potential",
                    ),
                    (
                        "ligand_receptor_strict_heatmap.svg",
                        &views.ligand_receptor_strict.matrix,
                        ligand_receptor_scale(positive_max(&views.ligand_receptor_strict.matrix)),
                        "Prior interaction potential",
                    ),
                    (
                        "ligand_activity_heatmap.svg",
                        &views.activity,
                        {
                            let (lo, hi) = views.activity.value_range();
                            activity_scale(lo, hi)
                        },
                        "Pearson",
                    ),
                ];
                for (name, matrix, scale, legend) in heatmaps {
                    if matrix.is_empty() {
                        let msg = format!("{} skipped: empty matrix", name);
                        tracing::warn!("{}", msg);
                        warnings.push(msg);
                        continue;
                    }
                    render_heatmap(&out_dir.join(name), matrix, &scale, legend, plot.width, plot.height)?;
                    outputs.push(name.to_string());
                }
                if layout.sectors.is_empty() {
                    let msg = "chord_diagram.svg skipped: no ligand-receptor links".to_string();
                    tracing::warn!("{}", msg);
                    warnings.push(msg);
                } else {
                    render_chord(&out_dir.join("chord_diagram.svg"), &layout, plot.chord_size)?;
                    outputs.push("chord_diagram.svg".to_string());
                }
            }
        }
    }

    outputs.push("summary.json".to_string());
    outputs.push("report.txt".to_string());
    let summary = build_summary(config, result, links, outputs, warnings);
    write_text(&out_dir.join("summary.json"), &render_summary_json(&summary)?)?;
    write_text(&out_dir.join("report.txt"), &render_report_text(&summary))?;
    tracing::info!("wrote {} outputs to {}", summary.outputs.len(), out_dir.display());
    Ok(summary)
}

fn positive_max(matrix: &VizMatrix) -> f64 {
    let (_, hi) = matrix.value_range();
    if hi > 0.0 { hi } else { 1.0 }
}

pub fn build_summary(
    config: &AnalysisConfig,
    result: &AnalysisResult,
    links: LinkCounts,
    outputs: Vec<String>,
    warnings: Vec<String>,
) -> RunSummary {
    let t = &config.thresholds;
    RunSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        receiver: result.receiver.clone(),
        senders: result.senders.clone(),
        conditions: ConditionSummary {
            column: config.condition_column().to_string(),
            case: config.conditions.case.clone(),
            reference: config.conditions.reference.clone(),
            n_case: result.signature.n_case,
            n_reference: result.signature.n_reference,
        },
        thresholds: ThresholdSummary {
            receiver_min_pct: t.receiver_min_pct,
            sender_min_pct: t.sender_min_pct,
            de_min_pct: t.de_min_pct,
            padj_max: t.padj_max,
            min_abs_log2fc: t.min_abs_log2fc,
            p_adjust: match t.p_adjust {
                PAdjustMethod::Bonferroni => "bonferroni".to_string(),
                PAdjustMethod::BenjaminiHochberg => "benjamini_hochberg".to_string(),
            },
            top_ligands: t.top_ligands,
            targets_per_ligand: t.targets_per_ligand,
            ligand_target_quantile: t.ligand_target_quantile,
            chord_link_cutoff: t.chord_link_cutoff,
        },
        genes: GeneCounts {
            receiver_expressed: result.receiver_expressed.len(),
            sender_expressed: result.sender_expressed.len(),
            tested: result.signature.tested.len(),
            geneset: result.signature.geneset.len(),
            geneset_dropped_not_in_network: result.signature.dropped_not_in_network,
            background: result.background.len(),
        },
        ligands: LigandCounts {
            expressed_ligands: result.candidates.expressed_ligands.len(),
            expressed_receptors: result.candidates.expressed_receptors.len(),
            potential: result.candidates.potential_ligands.len(),
            ranked: result.activities.len(),
        },
        top_ligands: result
            .activities
            .iter()
            .take(t.top_ligands)
            .map(|a| TopLigand {
                rank: a.rank,
                ligand: a.ligand.clone(),
                pearson: a.pearson,
                auroc: a.auroc,
                aupr: a.aupr,
            })
            .collect(),
        links,
        outputs,
        warnings,
    }
}

fn write_geneset(path: &Path, geneset: &[String]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "gene")?;
    for gene in geneset {
        writeln!(w, "{}", gene)?;
    }
    w.flush()
}

fn write_de_results(path: &Path, signature: &Signature) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "gene\tpct_case\tpct_reference\tlog2fc\tp_value\tp_adj\tin_geneset"
    )?;
    for g in &signature.tested {
        let in_geneset = signature.geneset.binary_search(&g.gene).is_ok();
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{:e}\t{:e}\t{}",
            g.gene,
            format_f64_6(g.pct_case),
            format_f64_6(g.pct_reference),
            format_f64_6(g.log2fc),
            g.p_value,
            g.p_adj,
            in_geneset
        )?;
    }
    w.flush()
}

fn write_activities(path: &Path, activities: &[LigandActivity]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "rank\tligand\tpearson\tauroc\taupr")?;
    for a in activities {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            a.rank,
            a.ligand,
            format_f64_6(a.pearson),
            format_opt_6(a.auroc),
            format_opt_6(a.aupr)
        )?;
    }
    w.flush()
}

fn write_ligand_targets(path: &Path, links: &[LigandTargetLink]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "ligand\ttarget\tweight")?;
    for l in links {
        writeln!(w, "{}\t{}\t{}", l.ligand, l.target, format_f64_6(l.weight))?;
    }
    w.flush()
}

fn write_text(path: &Path, text: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(text.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_report.rs"]
mod tests;
