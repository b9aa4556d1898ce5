use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::CategoryMaps;
use crate::model::links::{AnnotatedLink, LigandReceptorLink, UNASSIGNED_CATEGORY};
use crate::pipeline::PipelineError;

#[derive(Debug, Serialize, Deserialize)]
struct LinkRow {
    ligand: String,
    receptor: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct AnnotatedRow {
    ligand: String,
    receptor: String,
    weight: f64,
    #[serde(default)]
    ligand_type: Option<String>,
    #[serde(default)]
    receptor_type: Option<String>,
}

/// Writes `ligand,receptor,weight` rows, the file a curator annotates.
pub fn write_links_csv(path: &Path, links: &[LigandReceptorLink]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    for link in links {
        writer.serialize(LinkRow {
            ligand: link.ligand.clone(),
            receptor: link.receptor.clone(),
            weight: link.weight,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// True when `path` exists and already carries the category columns, i.e. it
/// is a curated copy that must not be overwritten.
pub fn has_category_columns(path: &Path) -> Result<bool, PipelineError> {
    if !path.exists() {
        return Ok(false);
    }
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?;
    Ok(missing_category_column(headers).is_none())
}

fn missing_category_column(headers: &csv::StringRecord) -> Option<&'static str> {
    CATEGORY_COLUMNS
        .into_iter()
        .find(|required| !headers.iter().any(|h| h == *required))
}

const CATEGORY_COLUMNS: [&str; 2] = ["ligand_type", "receptor_type"];

/// Annotated copy of the links file: the three link columns plus
/// `ligand_type` and `receptor_type`. Blank categories become `unassigned`.
pub fn read_annotated_links(path: &Path) -> Result<Vec<AnnotatedLink>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers = reader.headers()?.clone();
    if let Some(required) = missing_category_column(&headers) {
        return Err(PipelineError::Annotation(format!(
            "{} lacks a '{}' column",
            path.display(),
            required
        )));
    }
    let mut out = Vec::new();
    for row in reader.deserialize() {
        let row: AnnotatedRow = row?;
        out.push(AnnotatedLink {
            ligand: row.ligand.to_ascii_uppercase(),
            receptor: row.receptor.to_ascii_uppercase(),
            weight: row.weight,
            ligand_type: category_or_unassigned(row.ligand_type),
            receptor_type: category_or_unassigned(row.receptor_type),
        });
    }
    Ok(out)
}

fn category_or_unassigned(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => UNASSIGNED_CATEGORY.to_string(),
    }
}

/// Attaches categories to the computed links. With an annotated file, its
/// categories win and pairs the run did not produce are dropped; otherwise
/// the config maps are used. Anything left without a category is `unassigned`.
pub fn annotate_links(
    links: &[LigandReceptorLink],
    categories: &CategoryMaps,
    annotated: Option<&[AnnotatedLink]>,
) -> Vec<AnnotatedLink> {
    let mut from_file: BTreeMap<(&str, &str), &AnnotatedLink> = BTreeMap::new();
    if let Some(rows) = annotated {
        for row in rows {
            from_file.insert((row.ligand.as_str(), row.receptor.as_str()), row);
        }
        let dropped: Vec<String> = rows
            .iter()
            .filter(|r| {
                !links
                    .iter()
                    .any(|l| l.ligand == r.ligand && l.receptor == r.receptor)
            })
            .map(|r| format!("{}-{}", r.ligand, r.receptor))
            .collect();
        if !dropped.is_empty() {
            tracing::warn!(
                "ignoring {} annotated pairs not among the computed links: {}",
                dropped.len(),
                dropped.join(", ")
            );
        }
    }

    let lookup = |map: &BTreeMap<String, String>, key: &str| -> Option<String> {
        map.get(key)
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .cloned()
    };

    let mut unassigned = 0usize;
    let mut out = Vec::with_capacity(links.len());
    for link in links {
        let file_row = from_file.get(&(link.ligand.as_str(), link.receptor.as_str()));
        if annotated.is_some() && file_row.is_none() {
            tracing::warn!(
                "link {}-{} missing from the annotation file",
                link.ligand,
                link.receptor
            );
        }
        let ligand_type = file_row
            .map(|r| r.ligand_type.clone())
            .filter(|t| t != UNASSIGNED_CATEGORY)
            .or_else(|| lookup(&categories.ligands, &link.ligand));
        let receptor_type = file_row
            .map(|r| r.receptor_type.clone())
            .filter(|t| t != UNASSIGNED_CATEGORY)
            .or_else(|| lookup(&categories.receptors, &link.receptor));
        if ligand_type.is_none() || receptor_type.is_none() {
            unassigned += 1;
        }
        out.push(AnnotatedLink {
            ligand: link.ligand.clone(),
            receptor: link.receptor.clone(),
            weight: link.weight,
            ligand_type: ligand_type.unwrap_or_else(|| UNASSIGNED_CATEGORY.to_string()),
            receptor_type: receptor_type.unwrap_or_else(|| UNASSIGNED_CATEGORY.to_string()),
        });
    }
    if unassigned > 0 {
        tracing::warn!(
            "{} of {} links have an unassigned ligand or receptor category",
            unassigned,
            links.len()
        );
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_annotate.rs"]
mod tests;
