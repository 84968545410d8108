/// Weighted squared euclidean distance between a byte point and a real-valued
/// centroid. Every error and bound in the quantizer is expressed in this metric.
pub fn weighted_sq_distance(point: &[u8], centroid: &[f64], weights: &[f64]) -> f64 {
    point
        .iter()
        .zip(centroid.iter())
        .zip(weights.iter())
        .map(|((&p, &c), &w)| {
            let diff = p as f64 - c;
            w * (diff * diff)
        })
        .sum()
}

/// Smallest weighted squared distance from `point` to any point of the box
/// `[min, max]`. Zero on every dimension where the coordinate lies inside.
pub fn min_sq_distance_to_box(point: &[u8], min: &[f64], max: &[f64], weights: &[f64]) -> f64 {
    point
        .iter()
        .zip(min.iter().zip(max.iter()))
        .zip(weights.iter())
        .map(|((&p, (&lo, &hi)), &w)| {
            let p = p as f64;
            let diff = if p < lo {
                p - lo
            } else if p > hi {
                p - hi
            } else {
                0.0
            };
            w * (diff * diff)
        })
        .sum()
}

/// Weighted squared distance from `point` to the farthest corner of `[min, max]`.
pub fn max_sq_distance_to_box(point: &[u8], min: &[f64], max: &[f64], weights: &[f64]) -> f64 {
    point
        .iter()
        .zip(min.iter().zip(max.iter()))
        .zip(weights.iter())
        .map(|((&p, (&lo, &hi)), &w)| {
            let p = p as f64;
            let diff = (p - lo).abs().max((p - hi).abs());
            w * (diff * diff)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sq_distance() {
        assert_eq!(weighted_sq_distance(&[7], &[10.0], &[1.0]), 9.0);
        assert_eq!(weighted_sq_distance(&[1, 2], &[4.0, 6.0], &[2.0, 0.5]), 18.0 + 8.0);
        assert_eq!(weighted_sq_distance(&[3, 3], &[3.0, 3.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_min_distance_inside_box_is_zero() {
        assert_eq!(
            min_sq_distance_to_box(&[5, 5], &[0.0, 0.0], &[10.0, 10.0], &[1.0, 1.0]),
            0.0
        );
    }

    #[test]
    fn test_min_distance_outside_box() {
        // 3 below on x, 2 above on y
        let d = min_sq_distance_to_box(&[0, 12], &[3.0, 0.0], &[10.0, 10.0], &[1.0, 2.0]);
        assert_eq!(d, 9.0 + 8.0);
    }

    #[test]
    fn test_degenerate_box_matches_point_distance() {
        let centroid = [12.25, 200.5, 3.0];
        let weights = [0.299, 0.587, 0.114];
        for point in [[0u8, 0, 0], [12, 201, 3], [255, 255, 255]] {
            assert_eq!(
                min_sq_distance_to_box(&point, &centroid, &centroid, &weights),
                weighted_sq_distance(&point, &centroid, &weights)
            );
        }
    }

    #[test]
    fn test_max_distance_picks_farthest_corner() {
        let d = max_sq_distance_to_box(&[2, 5], &[0.0, 0.0], &[10.0, 10.0], &[1.0, 1.0]);
        assert_eq!(d, 64.0 + 25.0);
        let inner = min_sq_distance_to_box(&[2, 5], &[0.0, 0.0], &[10.0, 10.0], &[1.0, 1.0]);
        assert!(inner <= d);
    }
}
