use crate::distance::euclidean::{max_sq_distance_to_box, min_sq_distance_to_box};

/// Axis-aligned box over the codeword means below a node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn from_point(point: &[f64]) -> Self {
        BoundingBox {
            min: point.to_vec(),
            max: point.to_vec(),
        }
    }

    /// Componentwise union of two boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self
                .min
                .iter()
                .zip(other.min.iter())
                .map(|(a, b)| a.min(*b))
                .collect(),
            max: self
                .max
                .iter()
                .zip(other.max.iter())
                .map(|(a, b)| a.max(*b))
                .collect(),
        }
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        point
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }

    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    /// Lower bound on the weighted squared distance from `point` to anything
    /// inside the box.
    pub fn min_sq_distance(&self, point: &[u8], weights: &[f64]) -> f64 {
        min_sq_distance_to_box(point, &self.min, &self.max, weights)
    }

    /// Upper bound on the weighted squared distance from `point` to anything
    /// inside the box.
    pub fn max_sq_distance(&self, point: &[u8], weights: &[f64]) -> f64 {
        max_sq_distance_to_box(point, &self.min, &self.max, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union() {
        let a = BoundingBox::from_point(&[1.0, 8.0]);
        let b = BoundingBox {
            min: vec![3.0, 2.0],
            max: vec![4.0, 5.0],
        };
        let u = a.union(&b);
        assert_eq!(u.min, vec![1.0, 2.0]);
        assert_eq!(u.max, vec![4.0, 8.0]);
        assert!(u.contains(&[1.0, 8.0]));
        assert!(u.contains(&[3.5, 4.0]));
        assert!(!u.contains(&[0.5, 4.0]));
    }

    #[test]
    fn test_point_box() {
        let p = BoundingBox::from_point(&[2.5, 7.0]);
        assert!(p.is_point());
        assert_eq!(
            p.min_sq_distance(&[4, 7], &[1.0, 1.0]),
            p.max_sq_distance(&[4, 7], &[1.0, 1.0])
        );
    }
}
