use super::types::{CodewordId, NodeId};
use crate::quantization::QuantizationError;

/// A byte-valued point with the number of input points it stands for.
///
/// `codeword` and `leaf` are filled in when a partition tree is built over the
/// slice holding this sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub coords: Vec<u8>,
    pub count: u64,
    pub codeword: Option<CodewordId>,
    pub leaf: Option<NodeId>,
}

impl Sample {
    pub fn new(coords: Vec<u8>) -> Self {
        Self::with_count(coords, 1)
    }

    pub fn with_count(coords: Vec<u8>, count: u64) -> Self {
        Sample {
            coords,
            count,
            codeword: None,
            leaf: None,
        }
    }

    pub fn dims(&self) -> usize {
        self.coords.len()
    }
}

/// Splits packed data (`dims` bytes per point, e.g. RGBRGB...) into samples of
/// multiplicity one.
pub fn samples_from_interleaved(
    data: &[u8],
    dims: usize,
) -> Result<Vec<Sample>, QuantizationError> {
    if dims == 0 {
        return Err(QuantizationError::InvalidDimensions(
            "dimension count cannot be 0".to_string(),
        ));
    }
    if data.len() % dims != 0 {
        return Err(QuantizationError::InvalidInput(format!(
            "{} bytes is not a whole number of {}-byte samples",
            data.len(),
            dims
        )));
    }
    Ok(data
        .chunks_exact(dims)
        .map(|chunk| Sample::new(chunk.to_vec()))
        .collect())
}

/// Sorts `samples` by coordinate vector and merges exact duplicates, summing
/// their counts. Returns the number of distinct samples left.
pub fn deduplicate(samples: &mut Vec<Sample>) -> Result<usize, QuantizationError> {
    let Some(first) = samples.first() else {
        return Ok(0);
    };
    let dims = first.dims();
    if dims == 0 {
        return Err(QuantizationError::InvalidDimensions(
            "samples must have at least one dimension".to_string(),
        ));
    }
    if let Some(bad) = samples.iter().find(|s| s.dims() != dims) {
        return Err(QuantizationError::DimensionMismatch {
            expected: dims,
            found: bad.dims(),
        });
    }

    samples.sort_unstable_by(|a, b| a.coords.cmp(&b.coords));
    // `dedup_by` hands us (later, kept) pairs; fold the later count into the kept one.
    samples.dedup_by(|later, kept| {
        if later.coords == kept.coords {
            kept.count += later.count;
            true
        } else {
            false
        }
    });

    log::debug!("deduplicated input to {} distinct samples", samples.len());
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    #[derive(Clone, Debug)]
    struct RawSamples(Vec<Sample>);

    impl Arbitrary for RawSamples {
        fn arbitrary(g: &mut Gen) -> Self {
            let dims = usize::arbitrary(g) % 3 + 1;
            let len = usize::arbitrary(g) % 64;
            let samples = (0..len)
                .map(|_| {
                    // Narrow value range so duplicates actually show up
                    let coords = (0..dims).map(|_| u8::arbitrary(g) % 4).collect();
                    Sample::with_count(coords, u64::from(u8::arbitrary(g) % 5) + 1)
                })
                .collect();
            RawSamples(samples)
        }
    }

    #[test]
    fn test_deduplicate_merges_counts() {
        let mut samples = vec![
            Sample::new(vec![10, 0]),
            Sample::new(vec![0, 5]),
            Sample::with_count(vec![10, 0], 3),
            Sample::new(vec![0, 5]),
        ];
        let distinct = deduplicate(&mut samples).unwrap();
        assert_eq!(distinct, 2);
        assert_eq!(samples[0].coords, vec![0, 5]);
        assert_eq!(samples[0].count, 2);
        assert_eq!(samples[1].coords, vec![10, 0]);
        assert_eq!(samples[1].count, 4);
    }

    #[test]
    fn test_deduplicate_empty() {
        let mut samples = Vec::new();
        assert_eq!(deduplicate(&mut samples).unwrap(), 0);
    }

    #[test]
    fn test_deduplicate_rejects_mixed_dimensions() {
        let mut samples = vec![Sample::new(vec![1, 2]), Sample::new(vec![1, 2, 3])];
        assert_eq!(
            deduplicate(&mut samples),
            Err(QuantizationError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_deduplicate_rejects_zero_dimensions() {
        let mut samples = vec![Sample::new(vec![])];
        assert!(matches!(
            deduplicate(&mut samples),
            Err(QuantizationError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_samples_from_interleaved() {
        let samples = samples_from_interleaved(&[1, 2, 3, 4, 5, 6], 3).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].coords, vec![4, 5, 6]);
        assert!(samples.iter().all(|s| s.count == 1));

        assert!(matches!(
            samples_from_interleaved(&[1, 2, 3, 4], 3),
            Err(QuantizationError::InvalidInput(_))
        ));
        assert!(matches!(
            samples_from_interleaved(&[1, 2], 0),
            Err(QuantizationError::InvalidDimensions(_))
        ));
    }

    #[quickcheck]
    fn prop_deduplicate_preserves_total_count(raw: RawSamples) -> bool {
        let RawSamples(mut samples) = raw;
        let before: u64 = samples.iter().map(|s| s.count).sum();
        deduplicate(&mut samples).unwrap();
        let after: u64 = samples.iter().map(|s| s.count).sum();
        before == after
    }

    #[quickcheck]
    fn prop_deduplicate_strictly_sorted(raw: RawSamples) -> bool {
        let RawSamples(mut samples) = raw;
        let distinct = deduplicate(&mut samples).unwrap();
        distinct == samples.len() && samples.windows(2).all(|w| w[0].coords < w[1].coords)
    }
}
