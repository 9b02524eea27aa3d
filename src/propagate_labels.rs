/// Layered label propagation
/// BFS distances from every labelled read split the graph into layers. Layer d is labelled
/// only from already-labelled neighbors in layer d-1, one layer at a time.

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::create_overlap_graph::{NodeId, OverlapGraph};
use crate::{LabelId, Labels};

const UNREACHED: u32 = u32::MAX;

/// BFS layers from the labelled nodes: `layers[d]` holds the nodes at distance d
pub fn distance_layers(graph: &OverlapGraph, labels: &Labels) -> (Vec<u32>, Vec<Vec<NodeId>>) {
    let n = labels
        .last_key_value()
        .map_or(0, |(&max_seed, _)| max_seed as usize + 1)
        .max(graph.num_nodes());

    let mut dist = vec![UNREACHED; n];
    let mut layers: Vec<Vec<NodeId>> = vec![Vec::with_capacity(labels.len())];
    let mut queue: VecDeque<NodeId> = VecDeque::with_capacity(labels.len());

    for &seed in labels.keys() {
        dist[seed as usize] = 0;
        layers[0].push(seed);
        queue.push_back(seed);
    }

    while let Some(u) = queue.pop_front() {
        let next = dist[u as usize] + 1;
        for &v in graph.neighbors(u) {
            if dist[v as usize] == UNREACHED {
                dist[v as usize] = next;
                if layers.len() <= next as usize {
                    layers.push(Vec::new());
                }
                layers[next as usize].push(v);
                queue.push_back(v);
            }
        }
    }

    (dist, layers)
}

/// Weighted vote over the labelled neighbors one layer closer.
/// Highest total weight wins, ties go to the smaller label id.
fn vote(graph: &OverlapGraph, dist: &[u32], labels: &[Option<LabelId>], node: NodeId, layer: u32) -> Option<LabelId> {
    let mut tally: BTreeMap<LabelId, f64> = BTreeMap::new();
    for (u, w) in graph.edges(node) {
        if dist[u as usize] != layer - 1 {
            continue;
        }
        if let Some(label) = labels[u as usize] {
            *tally.entry(label).or_insert(0.0) += w as f64;
        }
    }

    let mut best: Option<(LabelId, f64)> = None;
    for (label, weight) in tally {
        if best.is_none_or(|(_, b)| weight > b) {
            best = Some((label, weight));
        }
    }
    best.map(|(label, _)| label)
}

/// Fill in labels for every unlabelled node reachable from a labelled one.
/// Existing labels are never changed.
pub fn propagate_labels(graph: &OverlapGraph, labels: &Labels) -> Labels {
    let mut propagated = labels.clone();
    if labels.is_empty() {
        return propagated;
    }

    let (dist, layers) = distance_layers(graph, labels);
    let mut dense: Vec<Option<LabelId>> = vec![None; dist.len()];
    for (&node, &label) in labels {
        dense[node as usize] = Some(label);
    }

    for (d, layer) in layers.iter().enumerate().skip(1) {
        // votes only read layer d-1, which is final by now
        let assigned: Vec<(NodeId, LabelId)> = layer
            .par_iter()
            .filter_map(|&v| vote(graph, &dist, &dense, v, d as u32).map(|label| (v, label)))
            .collect();

        debug!("Layer {}: {} nodes, {} labelled", d, layer.len(), assigned.len());
        for (v, label) in assigned {
            dense[v as usize] = Some(label);
            propagated.insert(v, label);
        }
    }

    info!("Label propagation: {} new labels over {} layers", propagated.len() - labels.len(), layers.len().saturating_sub(1));
    propagated
}
