/// Trait for distances between embedding vectors.
///
/// Designed for static polymorphism: the shift detector is generic over
/// `M: VectorMetric`, so the per-pair call is monomorphized and inlined.
pub trait VectorMetric: Clone + Send + Sync {
    /// Short name used in logs and shift tables.
    const NAME: &'static str;

    /// Distance between `a` and `b`, or `None` where the metric is undefined
    /// (e.g. cosine against a zero vector).
    fn distance(a: &[f64], b: &[f64]) -> Option<f64>;

    /// How much closer `a` and `b` are than a precomputed reference distance.
    ///
    /// Positive means the pair contracted relative to the reference. `None`
    /// when either distance is undefined.
    fn contraction(reference: Option<f64>, a: &[f64], b: &[f64]) -> Option<f64> {
        let reference = reference?;
        let current = Self::distance(a, b)?;
        Some(reference - current)
    }
}

/// Dot product of two equal-length vectors.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2 norm of a vector.
#[inline]
pub fn l2_norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
