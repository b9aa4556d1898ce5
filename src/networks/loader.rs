use std::path::Path;

use crate::config::NetworkSources;
use crate::input::features::normalize_symbol;
use crate::input::gz::{logical_name, open_maybe_gz};
use crate::networks::fetch::resolve_source;
use crate::networks::{
    LigandTargetMatrix, LrInteraction, LrNetwork, NetworkError, PriorNetworks, WeightedEdge,
    WeightedLrNetwork,
};

pub fn load_networks(sources: &NetworkSources) -> Result<PriorNetworks, NetworkError> {
    let lt_path = resolve_source(&sources.ligand_target, &sources.cache_dir)?;
    let lr_path = resolve_source(&sources.lr_network, &sources.cache_dir)?;
    let wlr_path = resolve_source(&sources.weighted_lr, &sources.cache_dir)?;

    let ligand_target = read_ligand_target_matrix(&lt_path)?;
    tracing::info!(
        "ligand-target matrix: {} targets x {} ligands",
        ligand_target.n_targets(),
        ligand_target.ligands().len()
    );
    let lr_network = read_lr_network(&lr_path)?;
    tracing::info!(
        "ligand-receptor network: {} interactions ({} curated)",
        lr_network.interactions.len(),
        lr_network.curated().interactions.len()
    );
    let weighted_lr = read_weighted_lr(&wlr_path)?;
    tracing::info!("weighted ligand-receptor network: {} edges", weighted_lr.edges.len());

    Ok(PriorNetworks {
        ligand_target,
        lr_network,
        weighted_lr,
    })
}

fn open_delimited(path: &Path) -> Result<csv::Reader<Box<dyn std::io::BufRead>>, NetworkError> {
    let name = logical_name(path);
    let delimiter = if name.ends_with(".tsv") || name.ends_with(".txt") {
        b'\t'
    } else {
        b','
    };
    let reader = open_maybe_gz(path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn require_column(
    headers: &csv::StringRecord,
    names: &[&str],
    path: &Path,
) -> Result<usize, NetworkError> {
    find_column(headers, names).ok_or_else(|| {
        NetworkError::Parse(format!(
            "{}: missing column {}",
            path.display(),
            names.join("/")
        ))
    })
}

fn parse_weight(raw: &str) -> Result<f32, NetworkError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(0.0);
    }
    raw.parse::<f32>()
        .map_err(|_| NetworkError::Parse(format!("invalid weight '{}'", raw)))
}

/// Header `<label>,<ligand>...`; one row per target gene.
pub fn read_ligand_target_matrix(path: &Path) -> Result<LigandTargetMatrix, NetworkError> {
    let mut rdr = open_delimited(path)?;
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(NetworkError::Parse(format!(
            "{}: ligand-target matrix needs a target column and at least one ligand",
            path.display()
        )));
    }
    let ligands: Vec<String> = headers.iter().skip(1).map(normalize_symbol).collect();
    let mut profiles: Vec<Vec<f32>> = vec![Vec::new(); ligands.len()];
    let mut targets = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let target = normalize_symbol(record.get(0).unwrap_or(""));
        if target.is_empty() {
            continue;
        }
        for (l, profile) in profiles.iter_mut().enumerate() {
            profile.push(parse_weight(record.get(l + 1).unwrap_or(""))?);
        }
        targets.push(target);
    }

    LigandTargetMatrix::new(targets, ligands, profiles)
}

/// Columns `from,to[,source][,database]` (or `ligand,receptor`).
pub fn read_lr_network(path: &Path) -> Result<LrNetwork, NetworkError> {
    let mut rdr = open_delimited(path)?;
    let headers = rdr.headers()?.clone();
    let from = require_column(&headers, &["from", "ligand"], path)?;
    let to = require_column(&headers, &["to", "receptor"], path)?;
    let source = find_column(&headers, &["source"]);
    let database = find_column(&headers, &["database"]);

    let mut interactions = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let ligand = normalize_symbol(record.get(from).unwrap_or(""));
        let receptor = normalize_symbol(record.get(to).unwrap_or(""));
        if ligand.is_empty() || receptor.is_empty() {
            continue;
        }
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or("")
                .to_string()
        };
        interactions.push(LrInteraction {
            ligand,
            receptor,
            source: field(source),
            database: field(database),
        });
    }
    Ok(LrNetwork { interactions })
}

/// Columns `from,to,weight`.
pub fn read_weighted_lr(path: &Path) -> Result<WeightedLrNetwork, NetworkError> {
    let mut rdr = open_delimited(path)?;
    let headers = rdr.headers()?.clone();
    let from = require_column(&headers, &["from", "ligand"], path)?;
    let to = require_column(&headers, &["to", "receptor"], path)?;
    let weight = require_column(&headers, &["weight"], path)?;

    let mut edges = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let ligand = normalize_symbol(record.get(from).unwrap_or(""));
        let receptor = normalize_symbol(record.get(to).unwrap_or(""));
        if ligand.is_empty() || receptor.is_empty() {
            continue;
        }
        edges.push(WeightedEdge {
            ligand,
            receptor,
            weight: parse_weight(record.get(weight).unwrap_or(""))? as f64,
        });
    }
    Ok(WeightedLrNetwork { edges })
}
