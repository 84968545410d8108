//! Lloyd-style refinement of the codeword means.

use log::{debug, info};
use rayon::prelude::*;

use super::bounds::BoundingBox;
use super::search::Nearest;
use super::PartitionTree;
use crate::models::sample::Sample;
use crate::models::types::CodewordId;
use crate::quantization::QuantizationError;

// Samples handed to one rayon task by `classify_par`.
const CLASSIFY_CHUNK: usize = 4096;

/// Per-codeword statistics collected while classifying a population.
///
/// Each caller owns its accumulator, so any number of threads can classify
/// against the same tree; partial results are combined with
/// [`Accumulator::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    dims: usize,
    first_id: CodewordId,
    // Coordinate sums, `dims` entries per codeword.
    sums: Vec<f64>,
    hits: Vec<u64>,
    total_sq_error: f64,
}

impl Accumulator {
    pub fn new(tree: &PartitionTree) -> Self {
        Accumulator {
            dims: tree.dims(),
            first_id: tree.first_id(),
            sums: vec![0.0; tree.dims() * tree.leaf_count()],
            hits: vec![0; tree.leaf_count()],
            total_sq_error: 0.0,
        }
    }

    /// Adds `point`, standing for `count` input points, to the codeword in
    /// `nearest`.
    pub(super) fn record(&mut self, nearest: &Nearest, point: &[u8], count: u64) {
        let slot = (nearest.codeword - self.first_id) as usize;
        let weight = count as f64;
        for (sum, &v) in self.sums[slot * self.dims..(slot + 1) * self.dims]
            .iter_mut()
            .zip(point.iter())
        {
            *sum += v as f64 * weight;
        }
        self.hits[slot] += count;
        self.total_sq_error += nearest.sq_error * weight;
    }

    pub fn merge(&mut self, other: &Accumulator) -> Result<(), QuantizationError> {
        if !self.same_shape(other) {
            return Err(QuantizationError::InvalidInput(
                "cannot merge accumulators of different codebooks".to_string(),
            ));
        }
        for (sum, other_sum) in self.sums.iter_mut().zip(other.sums.iter()) {
            *sum += other_sum;
        }
        for (hits, other_hits) in self.hits.iter_mut().zip(other.hits.iter()) {
            *hits += other_hits;
        }
        self.total_sq_error += other.total_sq_error;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.hits.iter_mut().for_each(|h| *h = 0);
        self.total_sq_error = 0.0;
    }

    pub fn hits(&self, codeword: CodewordId) -> u64 {
        codeword
            .checked_sub(self.first_id)
            .and_then(|slot| self.hits.get(slot as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> u64 {
        self.hits.iter().sum()
    }

    /// Sum of squared errors of everything recorded since the last reset.
    pub fn total_sq_error(&self) -> f64 {
        self.total_sq_error
    }

    /// Mean of the points recorded for `codeword`, if it got any.
    pub fn centroid(&self, codeword: CodewordId) -> Option<Vec<f64>> {
        let hits = self.hits(codeword);
        if hits == 0 {
            return None;
        }
        let slot = (codeword - self.first_id) as usize;
        Some(
            self.sums[slot * self.dims..(slot + 1) * self.dims]
                .iter()
                .map(|s| s / hits as f64)
                .collect(),
        )
    }

    fn same_shape(&self, other: &Accumulator) -> bool {
        self.dims == other.dims
            && self.first_id == other.first_id
            && self.hits.len() == other.hits.len()
    }
}

impl PartitionTree {
    /// Classifies every sample, recording it with its count.
    pub fn classify(
        &self,
        samples: &[Sample],
        weights: &[f64],
        acc: &mut Accumulator,
    ) -> Result<(), QuantizationError> {
        self.check_accumulator(acc)?;
        for sample in samples {
            let nearest = self.find_nearest(&sample.coords, weights)?;
            acc.record(&nearest, &sample.coords, sample.count);
        }
        Ok(())
    }

    /// Classifies `samples` on the rayon pool and returns the merged statistics.
    pub fn classify_par(
        &self,
        samples: &[Sample],
        weights: &[f64],
    ) -> Result<Accumulator, QuantizationError> {
        samples
            .par_chunks(CLASSIFY_CHUNK)
            .map(|chunk| -> Result<Accumulator, QuantizationError> {
                let mut acc = Accumulator::new(self);
                self.classify(chunk, weights, &mut acc)?;
                Ok(acc)
            })
            .try_reduce(
                || Accumulator::new(self),
                |mut merged, acc| {
                    merged.merge(&acc)?;
                    Ok(merged)
                },
            )
    }

    /// Moves every codeword that received hits to the mean of the points
    /// recorded for it, clears `acc` and refreshes the bounding boxes.
    /// Codeword ids and the tree shape are left alone.
    pub fn optimize(&mut self, acc: &mut Accumulator) -> Result<(), QuantizationError> {
        self.check_accumulator(acc)?;
        let dims = self.dims;
        let mut moved = 0;
        for (slot, leaf) in self.leaves.iter().enumerate() {
            let hits = acc.hits[slot];
            if hits == 0 {
                continue;
            }
            let node = &mut self.nodes[leaf.index()];
            for (mean, sum) in node
                .mean
                .iter_mut()
                .zip(acc.sums[slot * dims..(slot + 1) * dims].iter())
            {
                *mean = sum / hits as f64;
            }
            moved += 1;
        }
        info!(
            "refined {} of {} codewords, squared error before refinement {}",
            moved,
            self.leaf_count(),
            acc.total_sq_error()
        );
        acc.reset();
        self.recompute_bounds();
        Ok(())
    }

    /// Rebuilds every bounding box bottom-up from the current leaf means.
    pub fn recompute_bounds(&mut self) {
        // Children always sit after their parent in the arena.
        for i in (0..self.nodes.len()).rev() {
            let bounds = match self.nodes[i].children {
                Some([left, right]) => self.nodes[left.index()]
                    .bounds
                    .union(&self.nodes[right.index()].bounds),
                None => BoundingBox::from_point(&self.nodes[i].mean),
            };
            self.nodes[i].bounds = bounds;
        }
        debug!("recomputed bounds of {} nodes", self.nodes.len());
    }

    pub(super) fn check_accumulator(&self, acc: &Accumulator) -> Result<(), QuantizationError> {
        if acc.dims != self.dims
            || acc.first_id != self.first_id
            || acc.hits.len() != self.leaf_count()
        {
            return Err(QuantizationError::InvalidInput(
                "accumulator does not belong to this codebook".to_string(),
            ));
        }
        Ok(())
    }
}
