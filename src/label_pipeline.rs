/// Orchestration of one invocation: load labels, build the graph, refine, propagate, write

use anyhow::Result;
use tracing::{info, warn};

use crate::configs::{BuildGraphConfig, GraphConfig, OverlapSource, RunConfig};
use crate::create_overlap_graph::{EdgeStats, GraphArchive, GraphBuilder, OverlapGraph};
use crate::graph_analysis;
use crate::id_map::IdMap;
use crate::kraken_io;
use crate::parse_overlaps::{self, OverlapFormat};
use crate::propagate_labels::propagate_labels;
use crate::refine_labels::refine_labels;

/// Label counts after each stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total_reads: usize,
    pub initial_labels: usize,
    pub refined_labels: usize,
    pub final_labels: usize,
    pub edge_stats: EdgeStats,
    /// Parameters the graph was actually built with
    pub graph_config: GraphConfig,
}

fn log_edge_stats(stats: &EdgeStats, min_overlap: u32) {
    info!(
        "Edge stats | raw records: {}  |  removed (<{}): {}  |  self-loops skipped: {}  |  passed threshold (records): {}  |  unique undirected edges (kept): {}",
        stats.raw, min_overlap, stats.too_short, stats.self_loops, stats.kept_records, stats.unique_edges
    );
}

/// Parse overlap records and collect them, without finalizing
fn collect_overlaps(source: &OverlapSource, config: &GraphConfig, reads: &mut IdMap) -> Result<Option<GraphBuilder>> {
    let (path, format) = match source {
        OverlapSource::Paf(path) => (path, OverlapFormat::Paf),
        OverlapSource::EdgeList(path) => (path, OverlapFormat::EdgeList),
        OverlapSource::Archive(_) => return Ok(None),
    };

    let mut builder = GraphBuilder::new(config.min_overlap);
    parse_overlaps::load_overlap_file(path, format, reads, &mut builder)?;
    log_edge_stats(&builder.stats(), config.min_overlap);
    Ok(Some(builder))
}

fn finalize(builder: GraphBuilder, config: &GraphConfig) -> (OverlapGraph, EdgeStats) {
    let (graph, stats) = builder.finalize(config.default_read_len);
    info!("Nodes(with degree>0): {}", graph.nodes_with_edges().count());
    info!("Graph fixed. Lmax={}", graph.max_read_len());
    (graph, stats)
}

fn report_graph(graph: &OverlapGraph, config: &RunConfig) -> Result<()> {
    let sizes = graph_analysis::component_sizes_sorted(graph);
    info!(
        "Connected components: {} | largest: {:?}",
        sizes.len(),
        &sizes[..sizes.len().min(5)]
    );

    if let Some(path) = &config.degree_hist_out {
        graph_analysis::write_degree_tsv(path, &graph_analysis::degree_distribution(graph))?;
    }
    if let Some(path) = &config.weight_hist_out {
        graph_analysis::write_histogram_tsv(path, &graph_analysis::weight_histogram(graph, config.weight_bins))?;
    }
    Ok(())
}

/// Full pipeline for `ncrp run`
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let mut taxa = IdMap::new();

    // an archive brings its own read table, classifier reads are added on top of it
    let (mut reads, archived) = match &config.overlaps {
        OverlapSource::Archive(path) => {
            info!("Loading graph archive: {}", path.display());
            let archive = GraphArchive::load(path)?;
            if archive.config != config.graph {
                warn!(
                    "Graph archive was built with --min-overlap {} --default-read-len {}; ignoring --min-overlap {} --default-read-len {}",
                    archive.config.min_overlap, archive.config.default_read_len,
                    config.graph.min_overlap, config.graph.default_read_len
                );
            }
            log_edge_stats(&archive.stats, archive.config.min_overlap);
            (archive.reads, Some((archive.graph, archive.stats, archive.config)))
        }
        _ => (IdMap::new(), None),
    };

    let classified = kraken_io::load_kraken_file(&config.kraken, &mut reads, &mut taxa)?;

    let (graph, edge_stats, graph_config) = match archived {
        Some(built) => {
            if config.hist_out.is_some() {
                warn!("Overlap histogram needs raw overlaps and is not available from a graph archive");
            }
            built
        }
        None => {
            let builder = collect_overlaps(&config.overlaps, &config.graph, &mut reads)?
                .unwrap_or_else(|| GraphBuilder::new(config.graph.min_overlap));
            let bins = graph_analysis::overlap_histogram(&builder, config.hist_bin);
            graph_analysis::log_overlap_histogram(&bins, config.hist_bin);
            if let Some(path) = &config.hist_out {
                graph_analysis::write_histogram_tsv(path, &bins)?;
            }
            let (graph, stats) = finalize(builder, &config.graph);
            (graph, stats, config.graph)
        }
    };

    report_graph(&graph, config)?;

    info!("Refining labels ...");
    let refined = refine_labels(&graph, &classified.labels);

    info!("Running label propagation ...");
    let propagated = propagate_labels(&graph, &refined);

    kraken_io::write_final_labels_file(&config.output, &classified.order, &propagated, &reads, &taxa)?;
    info!("Done.");

    Ok(RunSummary {
        total_reads: classified.order.len(),
        initial_labels: classified.labels.len(),
        refined_labels: refined.len(),
        final_labels: propagated.len(),
        edge_stats,
        graph_config,
    })
}

/// Build the graph and store it for later runs, for `ncrp build-graph`
pub fn build_graph(config: &BuildGraphConfig) -> Result<EdgeStats> {
    let mut reads = IdMap::new();
    let Some(builder) = collect_overlaps(&config.overlaps, &config.graph, &mut reads)? else {
        anyhow::bail!("build-graph needs a PAF or edge-list input");
    };
    let (graph, stats) = finalize(builder, &config.graph);
    GraphArchive { graph, stats, config: config.graph, reads }.save(&config.output)?;
    Ok(stats)
}
