//! Taxonomic label refinement and propagation over read-overlap graphs.
//!
//! Reads that overlap usually come from the same organism. Classifier labels are cleaned by
//! dropping seeds whose nearest neighbours in overlap space disagree, and the surviving labels
//! are then spread, layer by layer, to unclassified reads.

use std::collections::BTreeMap;

pub mod cli;
pub mod configs;
pub mod create_overlap_graph;
pub mod graph_analysis;
pub mod id_map;
pub mod kraken_io;
pub mod label_pipeline;
pub mod parse_overlaps;
pub mod propagate_labels;
pub mod refine_labels;
pub mod utils;

/// Dense taxon id
pub type LabelId = u32;

/// Read id -> taxon id
pub type Labels = BTreeMap<create_overlap_graph::NodeId, LabelId>;
