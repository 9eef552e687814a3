use crate::core::error::{PatternError, Result};
use serde::{Deserialize, Serialize};

/// Lower bound of the normalized weight of an observed edge.
pub const MIN_EDGE_WEIGHT: f64 = 0.01;

/// Weight of an unobserved edge, as a fraction of [`MIN_EDGE_WEIGHT`].
pub const MISSING_EDGE_PROP: f64 = 0.1;

/// Centroid-relative distance changes at or below this are treated as no shift.
///
/// The centroid is a floating-point mean, so a node that never moves still
/// differs from it by a few ULPs.
pub const SHIFT_TOLERANCE: f64 = 1e-9;

/// Configuration for a pattern detection run.
///
/// The key set is closed: deserialization rejects unknown fields.
///
/// # Examples
///
/// ```
/// use casepat_rs::PatternConfig;
///
/// let config = PatternConfig::new(5, 4).with_mutual_information(false);
/// assert!(config.validate().is_ok());
/// assert!(PatternConfig::new(5, 1).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternConfig {
    /// Minimum number of subjects supporting a converging pair (`θ_min`).
    pub min_pattern_count: usize,
    /// Maximum number of attribute values in a pattern (`L_max`).
    pub max_pattern_length: usize,
    /// Weight edges by pointwise mutual information instead of raw counts.
    pub mutual_information: bool,
    /// Add the identity to the adjacency before encoding.
    pub add_self_loops: bool,
    /// Apply symmetric normalization `D^-1/2 X D^-1/2` before encoding.
    pub laplacian_normalize: bool,
    /// L2-normalize every embedding row.
    pub row_normalize_embedding: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_pattern_count: 10,
            max_pattern_length: 5,
            mutual_information: true,
            add_self_loops: true,
            laplacian_normalize: true,
            row_normalize_embedding: true,
        }
    }
}

impl PatternConfig {
    pub fn new(min_pattern_count: usize, max_pattern_length: usize) -> Self {
        Self {
            min_pattern_count,
            max_pattern_length,
            ..Self::default()
        }
    }

    pub fn with_mutual_information(mut self, enabled: bool) -> Self {
        self.mutual_information = enabled;
        self
    }

    pub fn with_self_loops(mut self, enabled: bool) -> Self {
        self.add_self_loops = enabled;
        self
    }

    pub fn with_laplacian(mut self, enabled: bool) -> Self {
        self.laplacian_normalize = enabled;
        self
    }

    pub fn with_row_normalization(mut self, enabled: bool) -> Self {
        self.row_normalize_embedding = enabled;
        self
    }

    /// Parse a JSON configuration document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_pattern_count < 1 {
            return Err(PatternError::configuration(format!(
                "min_pattern_count must be >= 1, got {}",
                self.min_pattern_count
            )));
        }
        if self.max_pattern_length < 2 {
            return Err(PatternError::configuration(format!(
                "max_pattern_length must be >= 2, got {}",
                self.max_pattern_length
            )));
        }
        Ok(())
    }

    /// Weight given to the weakest observed edge of a period graph.
    pub fn floor_weight(&self) -> f64 {
        MIN_EDGE_WEIGHT
    }

    /// Weight given to every unobserved pair of a period graph.
    pub fn missing_edge_weight(&self) -> f64 {
        MISSING_EDGE_PROP * MIN_EDGE_WEIGHT
    }
}
