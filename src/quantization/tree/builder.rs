//! Greedy construction of the partition tree.

use log::{debug, info, warn};

use super::node::PartitionNode;
use super::PartitionTree;
use crate::distance::euclidean::weighted_sq_distance;
use crate::models::sample::Sample;
use crate::models::types::{CodewordId, NodeId, SplitStrategy};
use crate::quantization::{validate_weights, QuantizationError};

/// Builds a codebook of at most `codebook_size` codewords over `samples`.
///
/// The slice is reordered in place so that every node of the returned tree
/// covers a contiguous sub-range of it, and every sample is labelled with the
/// codeword and leaf it ended up in. Codeword ids are assigned left to right
/// starting at `first_id`.
///
/// Fewer codewords than requested are produced when the input runs out of
/// splittable variation (e.g. fewer distinct samples than `codebook_size`).
pub fn build_codebook(
    samples: &mut [Sample],
    dims: usize,
    codebook_size: usize,
    weights: &[f64],
    first_id: CodewordId,
    strategy: SplitStrategy,
) -> Result<PartitionTree, QuantizationError> {
    validate_build_input(samples, dims, codebook_size, weights, first_id)?;

    let max_leaves = codebook_size.min(samples.len());
    let mut builder = TreeBuilder {
        samples,
        weights,
        strategy,
        nodes: Vec::with_capacity(2 * max_leaves - 1),
        leaves: Vec::with_capacity(max_leaves),
    };
    builder.grow(codebook_size);

    let TreeBuilder { samples, nodes, .. } = builder;
    let tree = PartitionTree::finalize(nodes, dims, first_id, samples);
    info!(
        "built codebook with {} codewords ({} requested) over {} samples",
        tree.leaf_count(),
        codebook_size,
        samples.len()
    );
    Ok(tree)
}

fn validate_build_input(
    samples: &[Sample],
    dims: usize,
    codebook_size: usize,
    weights: &[f64],
    first_id: CodewordId,
) -> Result<(), QuantizationError> {
    if dims == 0 {
        return Err(QuantizationError::InvalidDimensions(
            "dimension count cannot be 0".to_string(),
        ));
    }
    if samples.is_empty() {
        return Err(QuantizationError::EmptyInput);
    }
    if codebook_size == 0 {
        return Err(QuantizationError::InvalidCodebookSize(codebook_size));
    }
    // Codeword ids and arena handles are both u32.
    let last_id = first_id as u64 + codebook_size as u64 - 1;
    if last_id > u32::MAX as u64 || codebook_size.min(samples.len()) > (u32::MAX / 2) as usize {
        return Err(QuantizationError::InvalidCodebookSize(codebook_size));
    }
    validate_weights(weights, dims)?;
    for sample in samples.iter() {
        if sample.dims() != dims {
            return Err(QuantizationError::DimensionMismatch {
                expected: dims,
                found: sample.dims(),
            });
        }
        if sample.count == 0 {
            return Err(QuantizationError::InvalidInput(format!(
                "sample {:?} has a count of 0",
                sample.coords
            )));
        }
    }
    Ok(())
}

struct TreeBuilder<'a> {
    samples: &'a mut [Sample],
    weights: &'a [f64],
    strategy: SplitStrategy,
    nodes: Vec<PartitionNode>,
    // Current leaves, in no particular order.
    leaves: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn grow(&mut self, codebook_size: usize) {
        let root = PartitionNode::from_range(0, self.samples, self.weights);
        let root = self.push(root);
        self.leaves.push(root);

        while self.leaves.len() < codebook_size {
            let Some(position) = self.find_worst() else {
                info!(
                    "no splittable leaves left, stopping at {} of {} codewords",
                    self.leaves.len(),
                    codebook_size
                );
                break;
            };
            let leaf = self.leaves[position];
            match self.split(leaf) {
                Some([left, right]) => {
                    self.leaves[position] = left;
                    self.leaves.push(right);
                }
                None => {
                    warn!("node {} could not be split, freezing it", *leaf);
                    self.nodes[leaf.index()].total_error = 0.0;
                }
            }
        }
    }

    fn push(&mut self, node: PartitionNode) -> NodeId {
        self.nodes.push(node);
        NodeId::from(self.nodes.len() - 1)
    }

    /// Position in `leaves` of the leaf with the largest total error, or `None`
    /// once every leaf is error free.
    fn find_worst(&self) -> Option<usize> {
        let mut worst: Option<(usize, f64)> = None;
        for (position, leaf) in self.leaves.iter().enumerate() {
            let error = self.nodes[leaf.index()].total_error;
            if error > worst.map_or(0.0, |(_, e)| e) {
                worst = Some((position, error));
            }
        }
        worst.map(|(position, _)| position)
    }

    fn split(&mut self, leaf: NodeId) -> Option<[NodeId; 2]> {
        let node = &self.nodes[leaf.index()];
        let dim = node.worst_dimension();
        let pivot = node.mean[dim];
        let start = node.start;
        let range = node.range();

        let slice = &mut self.samples[range];
        let mut cut = match self.strategy {
            SplitStrategy::TwoMeans => two_means_cut(slice, dim, pivot, self.weights),
            SplitStrategy::MeanCut => mean_cut(slice, dim, pivot),
        };
        if cut == 0 || cut == slice.len() {
            debug!(
                "{:?} split of node {} left one side empty, cutting at the nearest value boundary",
                self.strategy, *leaf
            );
            cut = boundary_cut(slice, dim)?;
        }

        let left = PartitionNode::from_range(start, &slice[..cut], self.weights);
        let right = PartitionNode::from_range(start + cut, &slice[cut..], self.weights);
        debug!(
            "split node {} on dimension {} into {} + {} samples",
            *leaf,
            dim,
            left.len,
            right.len
        );

        let children = [self.push(left), self.push(right)];
        self.nodes[leaf.index()].children = Some(children);
        Some(children)
    }
}

/// One 2-means step: seed a centroid on each side of `pivot` along `dim`,
/// then move every sample nearer to the upper centroid behind the others.
/// Returns the number of samples in the lower half.
fn two_means_cut(slice: &mut [Sample], dim: usize, pivot: f64, weights: &[f64]) -> usize {
    let (lower, upper) = match side_centroids(slice, dim, pivot) {
        (Some(lower), Some(upper)) => (lower, upper),
        _ => {
            debug!(
                "all samples on one side of the mean on dimension {}, seeding from extremes",
                dim
            );
            let Some(seeds) = extreme_seeds(slice, dim) else {
                return 0;
            };
            seeds
        }
    };
    partition_in_place(slice, |sample| {
        weighted_sq_distance(&sample.coords, &upper, weights)
            < weighted_sq_distance(&sample.coords, &lower, weights)
    })
}

/// Sorts along `dim` and cuts before the first sample at or above `pivot`.
fn mean_cut(slice: &mut [Sample], dim: usize, pivot: f64) -> usize {
    slice.sort_unstable_by_key(|sample| sample.coords[dim]);
    slice.partition_point(|sample| (sample.coords[dim] as f64) < pivot)
}

/// Sorts along `dim` and cuts at the change of value closest to the middle.
/// `None` if every sample has the same value on `dim`.
fn boundary_cut(slice: &mut [Sample], dim: usize) -> Option<usize> {
    slice.sort_unstable_by_key(|sample| sample.coords[dim]);
    let middle = slice.len() / 2;
    (1..slice.len())
        .filter(|&i| slice[i - 1].coords[dim] != slice[i].coords[dim])
        .min_by_key(|&i| i.abs_diff(middle))
}

/// Weighted means of the samples below `pivot` and at or above it on `dim`.
fn side_centroids(
    slice: &[Sample],
    dim: usize,
    pivot: f64,
) -> (Option<Vec<f64>>, Option<Vec<f64>>) {
    let dims = slice.first().map_or(0, Sample::dims);
    let mut sums = [vec![0.0f64; dims], vec![0.0f64; dims]];
    let mut populations = [0u64; 2];

    for sample in slice {
        let side = usize::from(sample.coords[dim] as f64 >= pivot);
        populations[side] += sample.count;
        for (sum, &v) in sums[side].iter_mut().zip(sample.coords.iter()) {
            *sum += v as f64 * sample.count as f64;
        }
    }

    let [lower, upper] = sums;
    let centroid = |sum: Vec<f64>, population: u64| {
        (population > 0).then(|| {
            sum.into_iter()
                .map(|s| s / population as f64)
                .collect::<Vec<f64>>()
        })
    };
    (centroid(lower, populations[0]), centroid(upper, populations[1]))
}

/// Coordinates of the lowest and highest samples on `dim`.
fn extreme_seeds(slice: &[Sample], dim: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let low = slice.iter().min_by_key(|sample| sample.coords[dim])?;
    let high = slice.iter().max_by_key(|sample| sample.coords[dim])?;
    let as_point = |sample: &Sample| sample.coords.iter().map(|&v| v as f64).collect();
    Some((as_point(low), as_point(high)))
}

/// Moves every sample for which `goes_right` is false in front of the others,
/// returning how many there are.
fn partition_in_place<F>(slice: &mut [Sample], mut goes_right: F) -> usize
where
    F: FnMut(&Sample) -> bool,
{
    let mut boundary = 0;
    for i in 0..slice.len() {
        if !goes_right(&slice[i]) {
            slice.swap(i, boundary);
            boundary += 1;
        }
    }
    boundary
}
