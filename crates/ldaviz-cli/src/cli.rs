use clap::{Parser, Subcommand};
use ldaviz_core::config::{parse_aggregation, parse_backend, parse_metric};
use ldaviz_core::models::{Aggregation, StorageBackend, TopicMetric};
use ldaviz_workspace::{Action, SweepRange};
use std::path::PathBuf;

/// ldaviz - Explore families of LDA topic-model runs
#[derive(Parser, Debug)]
#[command(name = "ldaviz")]
#[command(about = "Compare and project LDA topic-model runs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Workspace directory
    #[arg(long, short = 'd', global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Storage backend for topic data (files or sqlite)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<StorageBackend>,

    /// Topic distance metric (bhattacharyya, hellinger, kl, js, euclidean)
    #[arg(long, global = true, value_parser = parse_metric)]
    pub metric: Option<TopicMetric>,

    /// How topic distances combine into a configuration distance (minimal or hausdorff)
    #[arg(long, global = true, value_parser = parse_aggregation)]
    pub aggregation: Option<Aggregation>,

    /// Command that trains models for a parameter list
    #[arg(long, global = true)]
    pub generator: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show workspace contents, artifact integrity and effective configuration
    Status(StatusArgs),

    /// Run a single action, loading its prerequisites first
    Run(RunArgs),

    /// Compute distances and coordinates for every configuration
    Pipeline(PipelineArgs),

    /// Write a parameter grid to the workspace
    Sweep(SweepArgs),

    /// Train models for the stored parameter list
    Generate,

    /// Topic-by-topic distances between two configurations
    Compare(CompareArgs),
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// List every configuration
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Action name, e.g. collect-metadata or calculate-distances
    pub action: Action,

    /// Target directory for switch-directory
    #[arg(long)]
    pub target: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PipelineArgs {
    /// Recompute distances even when a saved matrix exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Topic counts as start:end:step or a single value
    #[arg(long)]
    pub kappa: SweepRange,

    /// Document-topic prior as start:end:step or a single value
    #[arg(long)]
    pub alpha: SweepRange,

    /// Topic-word prior as start:end:step or a single value
    #[arg(long)]
    pub eta: SweepRange,

    /// Run the generator right after writing the grid
    #[arg(long)]
    pub generate: bool,
}

#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// First configuration id
    pub first: u32,

    /// Second configuration id
    pub second: u32,
}
