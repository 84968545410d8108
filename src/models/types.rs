use std::ops::Deref;

use serde::Deserialize;

/// Identifier handed out to a leaf of a finalized partition tree.
pub type CodewordId = u32;

/// Handle of a node inside the partition tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<usize> for NodeId {
    // Arena size is bounded by `2 * codebook_size - 1`, which is checked against
    // `u32::MAX` before building starts.
    fn from(index: usize) -> Self {
        Self(index as u32)
    }
}

impl Deref for NodeId {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// How a leaf's sample range is divided in two when it gets split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Seed two centroids from the halves either side of the mean on the split
    /// dimension, then assign every sample to the nearer one (one 2-means step).
    #[default]
    TwoMeans,
    /// Sort the range along the split dimension and cut at the mean.
    MeanCut,
}

/// How the nearest-codeword lookup walks the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Best-first traversal ordered by the box lower bound.
    #[default]
    BestFirst,
    /// Best-first, additionally skipping subtrees whose lower bound exceeds the
    /// smallest farthest-corner distance seen so far.
    UpperBoundPruning,
}
