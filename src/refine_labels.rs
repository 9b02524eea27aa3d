/// Label refinement
/// Multi-source BFS from every labelled read at once. Each read is claimed by the seed whose
/// frontier reaches it first; where two territories touch we get a collision and remember,
/// per seed, the shortest collision path and the labels found at that distance.
/// Seeds whose closest opposing labels are mixed or foreign are dropped as ambiguous.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::info;

use crate::create_overlap_graph::{NodeId, OverlapGraph};
use crate::{LabelId, Labels};

const UNOWNED: NodeId = NodeId::MAX;

/// Closest collision of one seed with another seed's territory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Path length between the two seeds through the collision
    pub distance: u32,
    /// Labels of the opposing seeds met at that distance
    pub labels: BTreeSet<LabelId>,
}

impl Conflict {
    fn record(slot: &mut Option<Conflict>, distance: u32, label: LabelId) {
        match slot {
            Some(c) if distance > c.distance => {}
            Some(c) if distance == c.distance => {
                c.labels.insert(label);
            }
            _ => {
                *slot = Some(Conflict { distance, labels: BTreeSet::from([label]) });
            }
        }
    }

    /// A seed is ambiguous when its nearest rivals disagree with each other or with the seed
    fn is_ambiguous(&self, own_label: LabelId) -> bool {
        !self.labels.is_empty() && (self.labels.len() > 1 || !self.labels.contains(&own_label))
    }
}

/// Nearest collision for every seed that collides with anything.
/// Seeds are expanded in ascending id order and rows are sorted, so frontier ties go to
/// whichever seed entered the queue first.
pub fn nearest_conflicts(graph: &OverlapGraph, labels: &Labels) -> BTreeMap<NodeId, Conflict> {
    let Some((&max_seed, _)) = labels.last_key_value() else {
        return BTreeMap::new();
    };
    let n = graph.num_nodes().max(max_seed as usize + 1);

    let mut owner = vec![UNOWNED; n];
    let mut dist = vec![0u32; n];
    let mut conflicts: Vec<Option<Conflict>> = vec![None; n];
    let mut queue: VecDeque<NodeId> = VecDeque::with_capacity(labels.len());

    for &seed in labels.keys() {
        owner[seed as usize] = seed;
        queue.push_back(seed);
    }

    while let Some(u) = queue.pop_front() {
        let own_u = owner[u as usize];
        let du = dist[u as usize];

        for &v in graph.neighbors(u) {
            let own_v = owner[v as usize];
            if own_v == UNOWNED {
                owner[v as usize] = own_u;
                dist[v as usize] = du + 1;
                queue.push_back(v);
            } else if own_v != own_u {
                let candidate = du + dist[v as usize] + 1;
                Conflict::record(&mut conflicts[own_u as usize], candidate, labels[&own_v]);
                Conflict::record(&mut conflicts[own_v as usize], candidate, labels[&own_u]);
            }
        }
    }

    labels
        .keys()
        .filter_map(|&seed| conflicts[seed as usize].take().map(|c| (seed, c)))
        .collect()
}

/// Remove ambiguous seeds. The result is always a subset of the input.
pub fn refine_labels(graph: &OverlapGraph, labels: &Labels) -> Labels {
    if labels.is_empty() {
        return labels.clone();
    }

    let conflicts = nearest_conflicts(graph, labels);
    let refined: Labels = labels
        .iter()
        .filter(|&(seed, &own)| !conflicts.get(seed).is_some_and(|c| c.is_ambiguous(own)))
        .map(|(&seed, &own)| (seed, own))
        .collect();

    info!("Refined labels: removed {} ambiguous nodes.", labels.len() - refined.len());
    refined
}
