/// Graph diagnostics: overlap, degree and weight histograms, connected components

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::create_overlap_graph::{GraphBuilder, NodeId, OverlapGraph};

/// One histogram bin, bounds are inclusive for integer histograms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: usize,
}

/// Histogram of best raw overlaps over unique undirected edges.
/// Overlaps past the last bin are clamped into it.
pub fn overlap_histogram(builder: &GraphBuilder, bin_width: u32) -> Vec<HistogramBin> {
    let bin_width = bin_width.max(1);
    let max_overlap = builder.edges().map(|(_, _, ov)| ov).max().unwrap_or(0);
    if max_overlap == 0 {
        return Vec::new();
    }

    let nbins = max_overlap.div_ceil(bin_width).max(1) as usize;
    let mut counts = vec![0usize; nbins];
    for (_, _, ov) in builder.edges() {
        let idx = ((ov / bin_width) as usize).min(nbins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            left: (i as u64 * bin_width as u64) as f64,
            right: ((i as u64 + 1) * bin_width as u64 - 1) as f64,
            count,
        })
        .collect()
}

/// Degree -> number of nodes with that degree, over nodes with at least one edge
pub fn degree_distribution(graph: &OverlapGraph) -> BTreeMap<usize, usize> {
    let mut dist = BTreeMap::new();
    for u in graph.nodes_with_edges() {
        *dist.entry(graph.degree(u)).or_insert(0) += 1;
    }
    dist
}

/// Equal-width histogram of normalized edge weights over [0, max weight]
pub fn weight_histogram(graph: &OverlapGraph, bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let weights: Vec<f32> = graph.unique_weights().collect();
    let max_weight = weights.iter().copied().fold(0.0f32, f32::max) as f64;
    if weights.is_empty() {
        return Vec::new();
    }

    let width = if max_weight > 0.0 { max_weight / bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for w in weights {
        let idx = ((w as f64 / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            left: i as f64 * width,
            right: (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Connected components of the overlap graph, isolated node slots excluded
pub fn connected_components(graph: &OverlapGraph) -> Vec<Vec<NodeId>> {
    let mut visited = vec![false; graph.num_nodes()];
    let mut components: Vec<Vec<NodeId>> = Vec::new();

    for start in graph.nodes_with_edges() {

        // check if already visited
        if visited[start as usize] {
            continue;
        }

        // new component
        let mut component: Vec<NodeId> = Vec::new();
        let mut stack: Vec<NodeId> = vec![start];
        visited[start as usize] = true;

        while let Some(current) = stack.pop() {
            component.push(current);
            for &neighbor in graph.neighbors(current) {
                if !visited[neighbor as usize] {
                    visited[neighbor as usize] = true;
                    stack.push(neighbor);
                }
            }
        }

        components.push(component);
    }

    components
}

/// Convenience: return component sizes sorted descending
pub fn component_sizes_sorted(graph: &OverlapGraph) -> Vec<usize> {
    let mut sizes: Vec<usize> = connected_components(graph)
        .into_iter()
        .map(|c| c.len())
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

/// Log the overlap histogram as TSV rows
pub fn log_overlap_histogram(bins: &[HistogramBin], bin_width: u32) {
    if bins.is_empty() {
        info!("Edge overlap histogram: no edges to count.");
        return;
    }
    info!("Edge overlap histogram (unique undirected, bin={}bp):", bin_width);
    info!("bin_left\tbin_right\tcount");
    for b in bins {
        info!("{}\t{}\t{}", b.left, b.right, b.count);
    }
}

pub fn write_histogram_tsv<P: AsRef<Path>>(path: P, bins: &[HistogramBin]) -> Result<()> {
    let path = path.as_ref();
    let mut w = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    writeln!(w, "bin_left\tbin_right\tcount")?;
    for b in bins {
        writeln!(w, "{}\t{}\t{}", b.left, b.right, b.count)?;
    }
    w.flush()?;
    info!("Histogram written to: {}", path.display());
    Ok(())
}

pub fn write_degree_tsv<P: AsRef<Path>>(path: P, degrees: &BTreeMap<usize, usize>) -> Result<()> {
    let path = path.as_ref();
    let mut w = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    writeln!(w, "degree\tcount")?;
    for (degree, count) in degrees {
        writeln!(w, "{}\t{}", degree, count)?;
    }
    w.flush()?;
    info!("Degree histogram written to: {}", path.display());
    Ok(())
}
