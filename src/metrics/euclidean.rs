use crate::core::distance_metric::VectorMetric;

/// Plain Euclidean distance. Defined for every pair of equal-length vectors.
#[derive(Debug, Clone)]
pub struct EuclideanDistance;

impl VectorMetric for EuclideanDistance {
    const NAME: &'static str = "euclidean";

    fn distance(a: &[f64], b: &[f64]) -> Option<f64> {
        debug_assert_eq!(a.len(), b.len());
        let sq: f64 = a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum();
        Some(sq.sqrt())
    }
}
