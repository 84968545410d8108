use log::{info, warn};

use super::tree::{build_codebook, Codeword, Nearest, PartitionTree};
use super::{Quantization, QuantizationError};
use crate::config_loader::QuantizerConfig;
use crate::models::sample::{deduplicate, Sample};

/// Codebook quantizer backed by a [`PartitionTree`].
///
/// Holds everything a build needs (dimension count, weights, target size,
/// id offset, strategies) so no state is shared between quantizers.
#[derive(Debug, Clone)]
pub struct TreeQuantization {
    config: QuantizerConfig,
    weights: Vec<f64>,
    tree: Option<PartitionTree>,
}

impl TreeQuantization {
    pub fn new(config: QuantizerConfig) -> Result<Self, QuantizationError> {
        config.validate()?;
        let weights = config.resolved_weights();
        Ok(TreeQuantization {
            config,
            weights,
            tree: None,
        })
    }

    pub fn config(&self) -> &QuantizerConfig {
        &self.config
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn tree(&self) -> Option<&PartitionTree> {
        self.tree.as_ref()
    }

    pub fn codebook(&self) -> Result<Vec<Codeword>, QuantizationError> {
        self.tree
            .as_ref()
            .map(PartitionTree::codebook)
            .ok_or(QuantizationError::NotTrained)
    }

    fn check_samples(&self, samples: &[Sample]) -> Result<(), QuantizationError> {
        if samples.is_empty() {
            return Err(QuantizationError::EmptyInput);
        }
        for sample in samples {
            if sample.dims() != self.config.dims {
                return Err(QuantizationError::DimensionMismatch {
                    expected: self.config.dims,
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

    /// Runs one classify-then-optimize round over `samples` and returns the
    /// squared error of the population before the codewords moved.
    pub fn refine(&mut self, samples: &[Sample]) -> Result<f64, QuantizationError> {
        let tree = self.tree.as_mut().ok_or(QuantizationError::NotTrained)?;
        let mut acc = tree.classify_par(samples, &self.weights)?;
        let error = acc.total_sq_error();
        tree.optimize(&mut acc)?;
        Ok(error)
    }
}

impl Quantization for TreeQuantization {
    /// Deduplicates `samples`, builds the tree over them (reordering the
    /// vector) and runs the configured number of refinement rounds.
    ///
    /// Any previous tree is dropped first. `samples` is left untouched if it
    /// is rejected.
    fn train(&mut self, samples: &mut Vec<Sample>) -> Result<(), QuantizationError> {
        self.tree = None;
        self.check_samples(samples)?;
        let total = samples.len();
        let distinct = deduplicate(samples)?;
        if distinct < self.config.codebook_size {
            warn!(
                "only {} distinct samples for a codebook of {}",
                distinct, self.config.codebook_size
            );
        }
        info!("training on {} samples ({} distinct)", total, distinct);

        self.tree = Some(build_codebook(
            samples,
            self.config.dims,
            self.config.codebook_size,
            &self.weights,
            self.config.first_id,
            self.config.split_strategy,
        )?);

        for pass in 0..self.config.refinement_passes {
            let error = self.refine(samples)?;
            info!("refinement pass {}: squared error {}", pass + 1, error);
        }
        Ok(())
    }

    fn quantize(&self, point: &[u8]) -> Result<Nearest, QuantizationError> {
        let tree = self.tree.as_ref().ok_or(QuantizationError::NotTrained)?;
        tree.find_nearest_with(point, &self.weights, self.config.search_strategy)
    }
}
