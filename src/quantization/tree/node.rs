use super::bounds::BoundingBox;
use crate::models::sample::Sample;
use crate::models::types::{CodewordId, NodeId};

/// One cluster of the partition tree.
///
/// A node covers `samples[start..start + len]` of the slice the tree was built
/// over. Internal nodes have exactly two children whose ranges split the
/// parent's range; their own `codeword` is `None`.
#[derive(Debug, Clone)]
pub struct PartitionNode {
    pub start: usize,
    pub len: usize,
    /// Sum of the sample counts in range.
    pub population: u64,
    pub mean: Vec<f64>,
    /// Per-dimension weighted error, see [`PartitionNode::from_range`].
    pub error: Vec<f64>,
    pub total_error: f64,
    pub bounds: BoundingBox,
    pub children: Option<[NodeId; 2]>,
    pub codeword: Option<CodewordId>,
}

impl PartitionNode {
    /// Computes the statistics of the non-empty range `samples`, which starts
    /// at offset `start` of the build slice.
    ///
    /// The error on dimension `d` is the weighted sum of squared deviations
    /// from the mean, multiplied by the weight of `d` and by the largest single
    /// squared deviation on `d`. The last factor makes ranges with isolated
    /// outliers look worse than ranges with the same spread evenly distributed.
    pub fn from_range(start: usize, samples: &[Sample], weights: &[f64]) -> Self {
        let dims = weights.len();
        let population: u64 = samples.iter().map(|s| s.count).sum();

        let mut sums = vec![0.0f64; dims];
        for sample in samples {
            let count = sample.count as f64;
            for (sum, &v) in sums.iter_mut().zip(sample.coords.iter()) {
                *sum += v as f64 * count;
            }
        }
        let mean: Vec<f64> = sums.iter().map(|s| s / population as f64).collect();

        let mut spread = vec![0.0f64; dims];
        let mut worst = vec![0.0f64; dims];
        for sample in samples {
            let count = sample.count as f64;
            for d in 0..dims {
                let dev = sample.coords[d] as f64 - mean[d];
                let sq = dev * dev;
                spread[d] += sq * count;
                if sq > worst[d] {
                    worst[d] = sq;
                }
            }
        }
        let error: Vec<f64> = (0..dims).map(|d| weights[d] * spread[d] * worst[d]).collect();
        let total_error = error.iter().sum();

        PartitionNode {
            start,
            len: samples.len(),
            population,
            bounds: BoundingBox::from_point(&mean),
            mean,
            error,
            total_error,
            children: None,
            codeword: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Dimension contributing the most error; the first one on ties.
    pub fn worst_dimension(&self) -> usize {
        let mut worst = 0;
        for (d, &e) in self.error.iter().enumerate() {
            if e > self.error[worst] {
                worst = d;
            }
        }
        worst
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}
