use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::configs::{BuildGraphConfig, GraphConfig, OverlapSource, RunConfig};

#[derive(Parser)]
#[command(name = "ncrp", version, about = "Refine and propagate per-read taxonomic labels over a read-overlap graph")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {

    /// Label refinement and propagation
    Run(RunArgs),

    /// Build the overlap graph once and store it as a binary archive
    BuildGraph(BuildGraphArgs),
}

/// Overlap records, exactly one source
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct OverlapInputArgs {

    /// minimap2 PAF file
    #[arg(long)]
    pub paf: Option<PathBuf>,

    /// Edge list: read1 read2 overlap
    #[arg(long)]
    pub edges: Option<PathBuf>,
}

impl OverlapInputArgs {
    fn source(&self) -> Result<OverlapSource> {
        match (&self.paf, &self.edges) {
            (Some(paf), _) => Ok(OverlapSource::Paf(paf.clone())),
            (None, Some(edges)) => Ok(OverlapSource::EdgeList(edges.clone())),
            (None, None) => bail!("one of --paf or --edges is required"),
        }
    }
}

#[derive(Args)]
pub struct GraphArgs {

    /// Overlaps shorter than this (bp) are dropped
    #[arg(long, default_value_t = 130)]
    pub min_overlap: u32,

    /// Read length used for weight normalization when the input has no lengths
    #[arg(long, default_value_t = 1000)]
    pub default_read_len: u32,
}

impl From<&GraphArgs> for GraphConfig {
    fn from(args: &GraphArgs) -> Self {
        Self {
            min_overlap: args.min_overlap,
            default_read_len: args.default_read_len,
        }
    }
}

#[derive(Args)]
#[group(id = "overlap_source", required = true, multiple = false)]
pub struct RunInputArgs {

    /// minimap2 PAF file
    #[arg(long)]
    pub paf: Option<PathBuf>,

    /// Edge list: read1 read2 overlap
    #[arg(long)]
    pub edges: Option<PathBuf>,

    /// Graph archive written by build-graph
    #[arg(long)]
    pub graph: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {

    /// Kraken2 per-read output
    #[arg(short, long)]
    pub kraken: PathBuf,

    #[command(flatten)]
    pub input: RunInputArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    /// Overlap histogram bin width (bp)
    #[arg(long, default_value_t = 100)]
    pub hist_bin: u32,

    /// Overlap histogram TSV output
    #[arg(long)]
    pub hist_out: Option<PathBuf>,

    /// Degree histogram TSV output
    #[arg(long)]
    pub degree_hist_out: Option<PathBuf>,

    /// Normalized weight histogram TSV output
    #[arg(long)]
    pub weight_hist_out: Option<PathBuf>,

    /// Number of bins for the weight histogram
    #[arg(long, default_value_t = 50)]
    pub weight_bins: usize,

    /// Final label output
    #[arg(short, long, default_value = "final_labels.tsv")]
    pub output: PathBuf,
}

impl TryFrom<&RunArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: &RunArgs) -> Result<Self> {
        let overlaps = match (&args.input.paf, &args.input.edges, &args.input.graph) {
            (Some(paf), _, _) => OverlapSource::Paf(paf.clone()),
            (None, Some(edges), _) => OverlapSource::EdgeList(edges.clone()),
            (None, None, Some(graph)) => OverlapSource::Archive(graph.clone()),
            (None, None, None) => bail!("one of --paf, --edges or --graph is required"),
        };
        Ok(Self {
            kraken: args.kraken.clone(),
            overlaps,
            graph: GraphConfig::from(&args.graph),
            hist_bin: args.hist_bin,
            hist_out: args.hist_out.clone(),
            degree_hist_out: args.degree_hist_out.clone(),
            weight_hist_out: args.weight_hist_out.clone(),
            weight_bins: args.weight_bins,
            output: args.output.clone(),
        })
    }
}

#[derive(Args)]
pub struct BuildGraphArgs {

    #[command(flatten)]
    pub input: OverlapInputArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    /// Graph archive output
    #[arg(short, long, default_value = "graph.bin")]
    pub output: PathBuf,
}

impl TryFrom<&BuildGraphArgs> for BuildGraphConfig {
    type Error = anyhow::Error;

    fn try_from(args: &BuildGraphArgs) -> Result<Self> {
        Ok(Self {
            overlaps: args.input.source()?,
            graph: GraphConfig::from(&args.graph),
            output: args.output.clone(),
        })
    }
}
