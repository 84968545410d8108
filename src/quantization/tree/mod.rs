//! Binary partition tree used both as the codebook and as its search index.

mod bounds;
mod builder;
mod node;
mod refine;
mod search;

pub use self::bounds::BoundingBox;
pub use self::builder::build_codebook;
pub use self::node::PartitionNode;
pub use self::refine::Accumulator;
pub use self::search::Nearest;

use crate::models::sample::Sample;
use crate::models::types::{CodewordId, NodeId};
use crate::quantization::QuantizationError;

/// A representative point handed out to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Codeword {
    pub id: CodewordId,
    pub point: Vec<f64>,
    /// Number of input points the codeword covered when the tree was built;
    /// refinement does not update it.
    pub population: u64,
}

/// A finalized partition tree.
///
/// Nodes live in an arena; a child always sits at a higher index than its
/// parent and the root is at index 0. Nodes refer to the sample slice the
/// tree was built over by `(start, len)` only, so the tree can outlive a
/// borrow of that slice.
#[derive(Debug, Clone)]
pub struct PartitionTree {
    nodes: Vec<PartitionNode>,
    dims: usize,
    first_id: CodewordId,
    // Leaves ordered by codeword id.
    leaves: Vec<NodeId>,
}

impl PartitionTree {
    /// Numbers the leaves left to right, links every sample to its leaf and
    /// derives the bounding boxes.
    fn finalize(
        mut nodes: Vec<PartitionNode>,
        dims: usize,
        first_id: CodewordId,
        samples: &mut [Sample],
    ) -> Self {
        let mut leaves = Vec::new();
        let mut stack = vec![NodeId::from(0u32)];
        while let Some(id) = stack.pop() {
            match nodes[id.index()].children {
                Some([left, right]) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => leaves.push(id),
            }
        }

        for (offset, &leaf) in leaves.iter().enumerate() {
            let codeword = first_id + offset as CodewordId;
            let node = &mut nodes[leaf.index()];
            node.codeword = Some(codeword);
            for sample in &mut samples[node.range()] {
                sample.codeword = Some(codeword);
                sample.leaf = Some(leaf);
            }
        }

        let mut tree = PartitionTree {
            nodes,
            dims,
            first_id,
            leaves,
        };
        tree.recompute_bounds();
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId::from(0u32)
    }

    pub fn node(&self, id: NodeId) -> &PartitionNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[PartitionNode] {
        &self.nodes
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn first_id(&self) -> CodewordId {
        self.first_id
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf handles in codeword order.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn leaf(&self, codeword: CodewordId) -> Option<&PartitionNode> {
        let slot = codeword.checked_sub(self.first_id)? as usize;
        self.leaves.get(slot).map(|id| self.node(*id))
    }

    /// Current codewords in id order. Points follow refinement; populations
    /// are the sample counts each leaf covered when the tree was built.
    pub fn codebook(&self) -> Vec<Codeword> {
        self.leaves
            .iter()
            .map(|id| {
                let node = self.node(*id);
                Codeword {
                    id: node.codeword.unwrap_or_default(),
                    point: node.mean.clone(),
                    population: node.population,
                }
            })
            .collect()
    }

    /// The part of `samples` covered by `id`, where `samples` is the slice the
    /// tree was built over. `None` if the range does not fit in `samples`.
    pub fn samples_of<'s>(&self, id: NodeId, samples: &'s [Sample]) -> Option<&'s [Sample]> {
        samples.get(self.node(id).range())
    }

    fn check_query(&self, point: &[u8], weights: &[f64]) -> Result<(), QuantizationError> {
        if point.len() != self.dims {
            return Err(QuantizationError::DimensionMismatch {
                expected: self.dims,
                found: point.len(),
            });
        }
        crate::quantization::validate_weights(weights, self.dims)
    }
}
