//! Nearest-codeword lookup over the partition tree.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::refine::Accumulator;
use super::PartitionTree;
use crate::distance::euclidean::weighted_sq_distance;
use crate::models::types::{CodewordId, NodeId, SearchStrategy};
use crate::quantization::QuantizationError;

/// Result of a nearest-codeword query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub codeword: CodewordId,
    pub leaf: NodeId,
    /// Weighted squared distance from the query to the codeword.
    pub sq_error: f64,
}

impl Nearest {
    // Smaller error wins, then the smaller codeword id.
    fn beats(&self, other: &Nearest) -> bool {
        self.sq_error < other.sq_error
            || (self.sq_error == other.sq_error && self.codeword < other.codeword)
    }
}

/// Heap entry; ordered so that `BinaryHeap` pops the smallest bound first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    bound: f64,
    node: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartitionTree {
    /// Finds the codeword closest to `point` under `weights`.
    ///
    /// Returns exactly what [`PartitionTree::brute_force_nearest`] returns,
    /// ties included.
    pub fn find_nearest(
        &self,
        point: &[u8],
        weights: &[f64],
    ) -> Result<Nearest, QuantizationError> {
        self.find_nearest_with(point, weights, SearchStrategy::BestFirst)
    }

    pub fn find_nearest_with(
        &self,
        point: &[u8],
        weights: &[f64],
        strategy: SearchStrategy,
    ) -> Result<Nearest, QuantizationError> {
        self.check_query(point, weights)?;
        self.best_first(point, weights, strategy)
            .ok_or(QuantizationError::NotTrained)
    }

    /// Like [`PartitionTree::find_nearest`], also adding `point` to the
    /// matched codeword's statistics in `acc`.
    pub fn find_nearest_recorded(
        &self,
        point: &[u8],
        weights: &[f64],
        acc: &mut Accumulator,
    ) -> Result<Nearest, QuantizationError> {
        self.check_accumulator(acc)?;
        let nearest = self.find_nearest(point, weights)?;
        acc.record(&nearest, point, 1);
        Ok(nearest)
    }

    /// Linear scan over all codewords.
    pub fn brute_force_nearest(
        &self,
        point: &[u8],
        weights: &[f64],
    ) -> Result<Nearest, QuantizationError> {
        self.check_query(point, weights)?;
        let mut best: Option<Nearest> = None;
        for &leaf in &self.leaves {
            let node = self.node(leaf);
            let Some(codeword) = node.codeword else {
                continue;
            };
            let candidate = Nearest {
                codeword,
                leaf,
                sq_error: weighted_sq_distance(point, &node.mean, weights),
            };
            if best.map_or(true, |b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
        best.ok_or(QuantizationError::NotTrained)
    }

    // Every node's box holds the means of all leaves below it, so its lower
    // bound never exceeds the distance to any of those leaves, and a leaf's
    // bound is its exact distance. Popping stops once the smallest remaining
    // bound is strictly worse than the best leaf, so equal-distance leaves are
    // all seen and the lowest id wins.
    fn best_first(
        &self,
        point: &[u8],
        weights: &[f64],
        strategy: SearchStrategy,
    ) -> Option<Nearest> {
        let prune_by_upper = strategy == SearchStrategy::UpperBoundPruning;
        let root = self.node(self.root());

        let mut heap = BinaryHeap::with_capacity(2 * self.leaf_count());
        heap.push(Candidate {
            bound: root.bounds.min_sq_distance(point, weights),
            node: self.root(),
        });
        // Farthest-corner distance of any pushed box; some leaf is at least this close.
        let mut ceiling = if prune_by_upper {
            root.bounds.max_sq_distance(point, weights)
        } else {
            f64::INFINITY
        };

        let mut best: Option<Nearest> = None;
        while let Some(Candidate { bound, node: id }) = heap.pop() {
            if best.map_or(false, |b| bound > b.sq_error) {
                break;
            }
            let node = self.node(id);
            match node.children {
                Some(children) => {
                    for child_id in children {
                        let child = self.node(child_id);
                        if prune_by_upper {
                            ceiling = ceiling.min(child.bounds.max_sq_distance(point, weights));
                        }
                        let child_bound = child.bounds.min_sq_distance(point, weights);
                        if child_bound > ceiling {
                            continue;
                        }
                        heap.push(Candidate {
                            bound: child_bound,
                            node: child_id,
                        });
                    }
                }
                None => {
                    let Some(codeword) = node.codeword else {
                        continue;
                    };
                    let candidate = Nearest {
                        codeword,
                        leaf: id,
                        sq_error: bound,
                    };
                    if best.map_or(true, |b| candidate.beats(&b)) {
                        best = Some(candidate);
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_heap_pops_smallest_bound() {
        let mut heap = BinaryHeap::new();
        for (bound, node) in [(4.0, 1u32), (0.5, 2), (9.0, 3), (0.5, 0)] {
            heap.push(Candidate {
                bound,
                node: NodeId::from(node),
            });
        }
        let order: Vec<u32> = std::iter::from_fn(|| heap.pop()).map(|c| *c.node).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_nearest_tie_break() {
        let a = Nearest {
            codeword: 3,
            leaf: NodeId::from(5u32),
            sq_error: 2.0,
        };
        let b = Nearest {
            codeword: 1,
            leaf: NodeId::from(7u32),
            sq_error: 2.0,
        };
        assert!(b.beats(&a));
        assert!(!a.beats(&b));
        assert!(!a.beats(&a));
    }
}
