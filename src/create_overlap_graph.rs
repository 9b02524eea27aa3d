/// Overlap graph creation module
/// Collects overlap records, keeps the best overlap per read pair and freezes the result
/// into a compact symmetric adjacency structure with normalized edge weights

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::configs::GraphConfig;
use crate::id_map::IdMap;

/// Dense read id
pub type NodeId = u32;

/// One overlap between two reads, ids already mapped to integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub overlap: u32,
    pub source_len: Option<u32>,
    pub target_len: Option<u32>,
}

impl OverlapRecord {

    /// Record without length information (edge lists)
    pub fn new(source: NodeId, target: NodeId, overlap: u32) -> Self {
        Self { source, target, overlap, source_len: None, target_len: None }
    }

    pub fn with_lengths(mut self, source_len: u32, target_len: u32) -> Self {
        self.source_len = Some(source_len);
        self.target_len = Some(target_len);
        self
    }
}

/// Counters collected while building the graph
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStats {
    pub raw: usize,
    pub too_short: usize,
    pub self_loops: usize,
    pub kept_records: usize,
    pub unique_edges: usize,
}

/// Incremental graph construction: best overlap per unordered read pair
pub struct GraphBuilder {
    min_overlap: u32,
    // key is (min id, max id)
    best_overlaps: AHashMap<(NodeId, NodeId), u32>,
    max_read_len: Option<u32>,
    stats: EdgeStats,
}

impl GraphBuilder {

    pub fn new(min_overlap: u32) -> Self {
        Self {
            min_overlap,
            best_overlaps: AHashMap::new(),
            max_read_len: None,
            stats: EdgeStats::default(),
        }
    }

    /// Add a single overlap record
    pub fn add_record(&mut self, record: OverlapRecord) {
        self.stats.raw += 1;

        if record.overlap < self.min_overlap {
            self.stats.too_short += 1;
            return;
        }
        if record.source == record.target {
            self.stats.self_loops += 1;
            return;
        }
        self.stats.kept_records += 1;

        // only reads of kept records count towards Lmax
        for len in [record.source_len, record.target_len].into_iter().flatten() {
            self.max_read_len = Some(self.max_read_len.map_or(len, |m| m.max(len)));
        }

        let key = if record.source < record.target {
            (record.source, record.target)
        } else {
            (record.target, record.source)
        };
        let best = self.best_overlaps.entry(key).or_insert(record.overlap);
        if record.overlap > *best {
            *best = record.overlap;
        }
        self.stats.unique_edges = self.best_overlaps.len();
    }

    /// Edge statistics so far
    pub fn stats(&self) -> EdgeStats {
        self.stats
    }

    /// Longest read length among kept records, if any of them carried lengths
    pub fn max_read_len(&self) -> Option<u32> {
        self.max_read_len
    }

    /// Unique undirected edges with their best raw overlap, as (smaller id, larger id, overlap)
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, u32)> + '_ {
        self.best_overlaps.iter().map(|(&(u, v), &ov)| (u, v, ov))
    }

    /// Freeze into the compact form, normalizing weights by the longest read length
    pub fn finalize(self, default_read_len: u32) -> (OverlapGraph, EdgeStats) {
        let lmax = self.max_read_len.unwrap_or(default_read_len).max(1);

        // both directions of every edge, sorted so rows come out ordered by neighbor id
        let mut directed: Vec<(NodeId, NodeId, u32)> = Vec::with_capacity(self.best_overlaps.len() * 2);
        for (&(u, v), &ov) in &self.best_overlaps {
            directed.push((u, v, ov));
            directed.push((v, u, ov));
        }
        directed.sort_unstable_by_key(|&(u, v, _)| (u, v));

        let num_nodes = directed.last().map_or(0, |&(u, _, _)| u as usize + 1);
        let mut offsets = vec![0usize; num_nodes + 1];
        for &(u, _, _) in &directed {
            offsets[u as usize + 1] += 1;
        }
        for i in 0..num_nodes {
            offsets[i + 1] += offsets[i];
        }

        let neighbors: Vec<NodeId> = directed.iter().map(|&(_, v, _)| v).collect();
        let weights: Vec<f32> = directed
            .par_iter()
            .map(|&(_, _, ov)| ov as f32 / lmax as f32)
            .collect();

        let graph = OverlapGraph { offsets, neighbors, weights, max_read_len: lmax };
        (graph, self.stats)
    }
}

/// Compact symmetric adjacency structure (CSR layout) indexed by node id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapGraph {
    offsets: Vec<usize>,
    neighbors: Vec<NodeId>,
    weights: Vec<f32>,
    max_read_len: u32,
}

impl OverlapGraph {

    /// Number of node slots; ids at or above this have no edges
    pub fn num_nodes(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of unique undirected edges
    pub fn num_edges(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// Lmax used for weight normalization
    pub fn max_read_len(&self) -> u32 {
        self.max_read_len
    }

    fn row(&self, node: NodeId) -> std::ops::Range<usize> {
        let u = node as usize;
        if u >= self.num_nodes() {
            return 0..0;
        }
        self.offsets[u]..self.offsets[u + 1]
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.neighbors[self.row(node)]
    }

    pub fn weights(&self, node: NodeId) -> &[f32] {
        &self.weights[self.row(node)]
    }

    /// (neighbor, weight) pairs of a node
    pub fn edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.neighbors(node).iter().copied().zip(self.weights(node).iter().copied())
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.row(node).len()
    }

    /// Nodes with at least one neighbor
    pub fn nodes_with_edges(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_nodes() as NodeId).filter(|&u| self.degree(u) > 0)
    }

    /// All normalized edge weights, each undirected edge counted once
    pub fn unique_weights(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.num_nodes() as NodeId).flat_map(move |u| {
            self.edges(u).filter(move |&(v, _)| u < v).map(|(_, w)| w)
        })
    }
}

/// Build and finalize a graph from a stream of records
pub fn build_overlap_graph<I>(records: I, min_overlap: u32, default_read_len: u32) -> (OverlapGraph, EdgeStats)
where
    I: IntoIterator<Item = OverlapRecord>,
{
    let mut builder = GraphBuilder::new(min_overlap);
    for record in records {
        builder.add_record(record);
    }
    builder.finalize(default_read_len)
}

/// A finalized graph together with the read names its node ids refer to
/// and the parameters it was built with
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphArchive {
    pub graph: OverlapGraph,
    pub stats: EdgeStats,
    pub config: GraphConfig,
    pub reads: IdMap,
}

impl GraphArchive {

    // serialize the graph
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating graph archive {}", path.display()))?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self).with_context(|| format!("writing graph archive {}", path.display()))?;
        info!("Graph archive written to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening graph archive {}", path.display()))?;
        let archive: Self = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("reading graph archive {}", path.display()))?;
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn weight_between(graph: &OverlapGraph, u: NodeId, v: NodeId) -> Option<f32> {
        graph.edges(u).find(|&(n, _)| n == v).map(|(_, w)| w)
    }

    #[test]
    fn keeps_maximum_overlap_per_pair() {
        let records = vec![
            OverlapRecord::new(0, 1, 150).with_lengths(1000, 1000),
            OverlapRecord::new(1, 0, 300).with_lengths(1000, 1000),
            OverlapRecord::new(0, 1, 200).with_lengths(1000, 1000),
        ];
        let (graph, stats) = build_overlap_graph(records, 130, 1000);
        assert_eq!(stats.raw, 3);
        assert_eq!(stats.kept_records, 3);
        assert_eq!(stats.unique_edges, 1);
        assert_eq!(weight_between(&graph, 0, 1), Some(0.3));
        assert_eq!(weight_between(&graph, 1, 0), Some(0.3));
        assert_eq!(graph.degree(0), 1);
    }

    #[test]
    fn threshold_is_inclusive() {
        let records = vec![
            OverlapRecord::new(0, 1, 130),
            OverlapRecord::new(1, 2, 129),
        ];
        let (graph, stats) = build_overlap_graph(records, 130, 1000);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.kept_records, 1);
        assert!(weight_between(&graph, 0, 1).is_some());
        assert!(weight_between(&graph, 1, 2).is_none());
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    fn self_loops_are_counted_and_dropped() {
        let records = vec![
            OverlapRecord::new(3, 3, 500),
            OverlapRecord::new(3, 4, 500),
        ];
        let (graph, stats) = build_overlap_graph(records, 130, 1000);
        assert_eq!(stats.self_loops, 1);
        assert_eq!(stats.unique_edges, 1);
        assert!(!graph.neighbors(3).contains(&3));
        assert_eq!(graph.neighbors(3), &[4]);
    }

    #[test]
    fn below_threshold_self_loop_counts_as_too_short() {
        let (_, stats) = build_overlap_graph(vec![OverlapRecord::new(1, 1, 10)], 130, 1000);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.self_loops, 0);
    }

    #[test]
    fn lmax_comes_from_longest_read() {
        let records = vec![
            OverlapRecord::new(0, 1, 400).with_lengths(800, 2000),
            OverlapRecord::new(1, 2, 1000).with_lengths(2000, 1500),
        ];
        let (graph, _) = build_overlap_graph(records, 130, 1000);
        assert_eq!(graph.max_read_len(), 2000);
        assert_eq!(weight_between(&graph, 0, 1), Some(0.2));
        assert_eq!(weight_between(&graph, 2, 1), Some(0.5));
    }

    #[test]
    fn lmax_ignores_filtered_records() {
        let records = vec![
            OverlapRecord::new(0, 1, 500).with_lengths(1000, 1000),
            OverlapRecord::new(2, 3, 100).with_lengths(5000, 5000),
            OverlapRecord::new(4, 4, 900).with_lengths(8000, 8000),
        ];
        let (graph, stats) = build_overlap_graph(records, 130, 1000);
        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.self_loops, 1);
        assert_eq!(graph.max_read_len(), 1000);
        assert_eq!(weight_between(&graph, 0, 1), Some(0.5));
    }

    #[test]
    fn lmax_falls_back_without_lengths() {
        let (graph, _) = build_overlap_graph(vec![OverlapRecord::new(0, 1, 250)], 130, 1000);
        assert_eq!(graph.max_read_len(), 1000);
        assert_eq!(weight_between(&graph, 0, 1), Some(0.25));
    }

    #[test]
    fn adjacency_is_symmetric_and_sorted() {
        let records = vec![
            OverlapRecord::new(5, 2, 300),
            OverlapRecord::new(2, 9, 400),
            OverlapRecord::new(0, 2, 200),
            OverlapRecord::new(9, 5, 350),
        ];
        let (graph, stats) = build_overlap_graph(records, 130, 1000);
        assert_eq!(graph.num_edges(), stats.unique_edges);
        assert_eq!(graph.neighbors(2), &[0, 5, 9]);
        for u in graph.nodes_with_edges() {
            for (v, w) in graph.edges(u) {
                assert_ne!(u, v);
                assert_eq!(weight_between(&graph, v, u), Some(w));
            }
        }
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let (graph, stats) = build_overlap_graph(Vec::new(), 130, 1000);
        assert_eq!(graph.num_nodes(), 0);
        assert_eq!(graph.num_edges(), 0);
        assert_eq!(stats, EdgeStats::default());
        assert!(graph.neighbors(42).is_empty());
    }

    #[test]
    fn archive_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let mut reads = IdMap::new();
        let a = reads.get_or_insert("a");
        let b = reads.get_or_insert("b");
        let config = GraphConfig { min_overlap: 300, default_read_len: 1500 };
        let (graph, stats) = build_overlap_graph(vec![OverlapRecord::new(a, b, 500)], config.min_overlap, config.default_read_len);
        GraphArchive { graph: graph.clone(), stats, config, reads }.save(&path).unwrap();

        let loaded = GraphArchive::load(&path).unwrap();
        assert_eq!(loaded.graph, graph);
        assert_eq!(loaded.stats, stats);
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.reads.get("b"), Some(b));
    }

    proptest! {
        #[test]
        fn finalized_graph_is_symmetric_without_self_loops(
            raw in prop::collection::vec((0u32..25, 0u32..25, 0u32..3000, 100u32..5000), 0..120),
        ) {
            let records: Vec<OverlapRecord> = raw
                .iter()
                .map(|&(u, v, ov, len)| OverlapRecord::new(u, v, ov).with_lengths(len, len))
                .collect();
            let (graph, stats) = build_overlap_graph(records.iter().copied(), 130, 1000);

            prop_assert_eq!(stats.raw, records.len());
            prop_assert_eq!(stats.too_short + stats.self_loops + stats.kept_records, stats.raw);
            prop_assert_eq!(graph.num_edges(), stats.unique_edges);

            for u in graph.nodes_with_edges() {
                let row = graph.neighbors(u);
                prop_assert!(row.windows(2).all(|w| w[0] < w[1]));
                for (v, w) in graph.edges(u) {
                    prop_assert_ne!(u, v);
                    prop_assert_eq!(weight_between(&graph, v, u), Some(w));

                    // weight reflects the best overlap seen for the pair
                    let best = records
                        .iter()
                        .filter(|r| r.overlap >= 130 && ((r.source, r.target) == (u, v) || (r.source, r.target) == (v, u)))
                        .map(|r| r.overlap)
                        .max();
                    prop_assert_eq!(Some(w), best.map(|ov| ov as f32 / graph.max_read_len() as f32));
                }
            }
        }
    }
}
