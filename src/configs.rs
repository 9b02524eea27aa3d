use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Graph construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub min_overlap: u32,
    pub default_read_len: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_overlap: 130,
            default_read_len: 1000,
        }
    }
}

/// Where overlaps come from
#[derive(Debug, Clone)]
pub enum OverlapSource {
    Paf(PathBuf),
    EdgeList(PathBuf),
    Archive(PathBuf),
}

pub struct RunConfig {
    pub kraken: PathBuf,
    pub overlaps: OverlapSource,
    pub graph: GraphConfig,
    pub hist_bin: u32,
    pub hist_out: Option<PathBuf>,
    pub degree_hist_out: Option<PathBuf>,
    pub weight_hist_out: Option<PathBuf>,
    pub weight_bins: usize,
    pub output: PathBuf,
}

pub struct BuildGraphConfig {
    pub overlaps: OverlapSource,
    pub graph: GraphConfig,
    pub output: PathBuf,
}
