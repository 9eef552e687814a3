use serde::{Deserialize, Serialize};

/// A recoverable condition observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// No record in the period carries two or more attribute values; its
    /// graph consists of floor edges only.
    EmptyPeriod { period: String },
    /// A node has a zero-norm embedding in a period; pairs involving it are
    /// skipped for that period.
    DegenerateEmbedding { period: String, tav: String },
    /// The ranker produced no rows.
    NoPatternsFound,
}

/// Largest connected component size of one period graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLcc {
    pub period: String,
    pub size: usize,
}

/// Structured diagnostics captured from a detection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Number of subjects in the normalized input.
    pub n_subjects: usize,
    /// Number of distinct (subject, period) records.
    pub n_records: usize,
    /// Number of periods.
    pub n_periods: usize,
    /// Number of distinct typed attribute values (graph nodes).
    pub n_nodes: usize,
    /// Number of distinct attribute types (embedding width).
    pub n_attribute_types: usize,
    /// (period, cross-type pair) combinations evaluated by the shift detector.
    pub all_pairs: usize,
    /// Converging pairs across all periods.
    pub close_pairs: usize,
    /// Patterns emitted by the miner before ranking.
    pub mined_patterns: usize,
    /// Largest connected component size per period, in period order.
    pub per_period_lcc_sizes: Vec<PeriodLcc>,
    /// Number of nodes in the LCC of every period.
    pub dynamic_lcc_size: usize,
    pub warnings: Vec<PipelineWarning>,
}

impl Diagnostics {
    pub fn warn(&mut self, warning: PipelineWarning) {
        self.warnings.push(warning);
    }

    /// Periods flagged as carrying no co-occurrence signal.
    pub fn empty_periods(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                PipelineWarning::EmptyPeriod { period } => Some(period.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the run produced no ranked patterns.
    pub fn no_patterns_found(&self) -> bool {
        self.warnings.contains(&PipelineWarning::NoPatternsFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let d = Diagnostics::default();
        assert_eq!(d.all_pairs, 0);
        assert_eq!(d.close_pairs, 0);
        assert!(d.per_period_lcc_sizes.is_empty());
        assert!(d.warnings.is_empty());
        assert!(!d.no_patterns_found());
    }

    #[test]
    fn test_warning_accessors() {
        let mut d = Diagnostics::default();
        d.warn(PipelineWarning::EmptyPeriod {
            period: "2019".into(),
        });
        d.warn(PipelineWarning::DegenerateEmbedding {
            period: "2019".into(),
            tav: "A==x".into(),
        });
        d.warn(PipelineWarning::NoPatternsFound);
        assert_eq!(d.empty_periods(), vec!["2019"]);
        assert!(d.no_patterns_found());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let json = serde_json::to_value(PipelineWarning::EmptyPeriod {
            period: "2019".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "empty_period");
        assert_eq!(json["period"], "2019");
    }
}
