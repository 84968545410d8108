pub mod codebook;
pub mod tree;

use std::fmt;

use crate::models::sample::Sample;
use crate::quantization::tree::Nearest;

pub trait Quantization {
    fn train(&mut self, samples: &mut Vec<Sample>) -> Result<(), QuantizationError>;
    fn quantize(&self, point: &[u8]) -> Result<Nearest, QuantizationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuantizationError {
    EmptyInput,
    InvalidDimensions(String),
    DimensionMismatch { expected: usize, found: usize },
    InvalidCodebookSize(usize),
    InvalidWeights(String),
    InvalidInput(String),
    NotTrained,
}

impl fmt::Display for QuantizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantizationError::EmptyInput => write!(f, "No samples supplied"),
            QuantizationError::InvalidDimensions(msg) => {
                write!(f, "Invalid dimension count: {}", msg)
            }
            QuantizationError::DimensionMismatch { expected, found } => write!(
                f,
                "Dimension mismatch: expected {} dimensions, found {}",
                expected, found
            ),
            QuantizationError::InvalidCodebookSize(size) => {
                write!(f, "Invalid codebook size: {}", size)
            }
            QuantizationError::InvalidWeights(msg) => write!(f, "Invalid weights: {}", msg),
            QuantizationError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            QuantizationError::NotTrained => write!(f, "Quantizer has not been trained yet"),
        }
    }
}

impl std::error::Error for QuantizationError {}

/// Checks that `weights` has one finite, non-negative entry per dimension.
pub fn validate_weights(weights: &[f64], dims: usize) -> Result<(), QuantizationError> {
    if weights.len() != dims {
        return Err(QuantizationError::InvalidWeights(format!(
            "expected {} weights, got {}",
            dims,
            weights.len()
        )));
    }
    if let Some((dim, weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(QuantizationError::InvalidWeights(format!(
            "weight {} for dimension {} must be finite and non-negative",
            weight, dim
        )));
    }
    Ok(())
}
