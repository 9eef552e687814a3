use crate::core::distance_metric::{dot, l2_norm, VectorMetric};

/// Cosine distance `1 - cos(a, b)`.
///
/// Edge cases:
/// - Either vector has zero norm → undefined (`None`)
/// - Similarity is clamped to [-1, 1] for numerical stability, so the
///   distance lies in [0, 2]
#[derive(Debug, Clone)]
pub struct CosineDistance;

impl VectorMetric for CosineDistance {
    const NAME: &'static str = "cosine";

    fn distance(a: &[f64], b: &[f64]) -> Option<f64> {
        let na = l2_norm(a);
        let nb = l2_norm(b);
        if na == 0.0 || nb == 0.0 {
            return None;
        }
        let sim = (dot(a, b) / (na * nb)).clamp(-1.0, 1.0);
        Some(1.0 - sim)
    }
}
