mod config;
mod input;
mod logging;
mod model;
mod networks;
mod pipeline;
mod render;
mod report;
mod stats;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AnalysisConfig, load_config};
use crate::input::{ExpressionObject, load_dataset};
use crate::networks::fetch::resolve_source;
use crate::networks::loader::load_networks;
use crate::pipeline::stage7_report::{OutputOptions, write_outputs};
use crate::pipeline::{PipelineError, run_analysis};

#[derive(Debug, Parser)]
#[command(
    name = "kira-cellcomm",
    version,
    about = "Ligand activity prioritization and cell-cell communication from 10x scRNA-seq"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full analysis and write tables, plots and reports.
    Run(RunArgs),
    /// Download and cache the prior networks named in the config.
    Fetch {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print a starter config to stdout.
    Template,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long)]
    config: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// Annotated copy of ligand_receptor_links.csv with ligand_type/receptor_type.
    #[arg(long)]
    annotations: Option<PathBuf>,
    #[arg(long)]
    skip_plots: bool,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Command::Run(args) => run_pipeline(&args),
        Command::Fetch { config } => {
            let config = load_config(&config)?;
            let n = &config.networks;
            for source in [&n.ligand_target, &n.lr_network, &n.weighted_lr] {
                let path = resolve_source(source, &n.cache_dir)?;
                println!("{}\t{}", source, path.display());
            }
            Ok(())
        }
        Command::Template => {
            println!("{}", serde_json::to_string_pretty(&AnalysisConfig::template())?);
            Ok(())
        }
    }
}

fn run_pipeline(args: &RunArgs) -> Result<(), PipelineError> {
    let config = load_config(&args.config)?;
    let datasets = load_datasets(&config)?;
    let networks = load_networks(&config.networks)?;
    let result = run_analysis(&config, &datasets, &networks)?;
    let summary = write_outputs(
        &config,
        &result,
        &args.out,
        OutputOptions {
            annotations: args.annotations.as_deref(),
            skip_plots: args.skip_plots,
        },
    )?;
    for warning in &summary.warnings {
        tracing::warn!("{}", warning);
    }
    Ok(())
}

/// Loads only the datasets some receiver or sender group draws from.
fn load_datasets(
    config: &AnalysisConfig,
) -> Result<BTreeMap<String, ExpressionObject>, PipelineError> {
    let mut out = BTreeMap::new();
    for name in std::iter::once(&config.receiver).chain(&config.senders) {
        let group = config.group(name)?;
        if out.contains_key(&group.dataset) {
            continue;
        }
        let dataset = config.datasets.get(&group.dataset).ok_or_else(|| {
            PipelineError::Selection(format!("unknown dataset '{}'", group.dataset))
        })?;
        let object = load_dataset(&group.dataset, &dataset.input, &dataset.meta)?;
        out.insert(group.dataset.clone(), object);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
