pub mod algorithms;
pub mod core;
pub mod metrics;
pub mod report;

pub use crate::algorithms::counter::{PeriodStats, RecordCounter, TimeSeriesPoint};
pub use crate::algorithms::embed::{embed_periods, GraphEncoder, PeriodEmbeddings};
pub use crate::algorithms::graph::{build_period_graphs, PeriodGraph, Vocabulary, WeightedEdge};
pub use crate::algorithms::miner::{mine_patterns, MinedPattern};
pub use crate::algorithms::normalize::{normalize, Observation, ObservationSet};
pub use crate::algorithms::pipeline::{detect_patterns, Detection};
pub use crate::algorithms::query::{AttributeCount, PatternQuery};
pub use crate::algorithms::ranker::{rank_patterns, PatternRow, PatternsTable};
pub use crate::algorithms::shift::{detect_shifts, PairShift, ShiftTable};
pub use crate::core::config::{PatternConfig, MIN_EDGE_WEIGHT, MISSING_EDGE_PROP, SHIFT_TOLERANCE};
pub use crate::core::diagnostics::{Diagnostics, PeriodLcc, PipelineWarning};
pub use crate::core::distance_metric::VectorMetric;
pub use crate::core::embedding::Embedding;
pub use crate::core::error::{PatternError, Result};
pub use crate::core::table::{CaseTable, TableSchema};
pub use crate::core::tav::{PATTERN_SEPARATOR, TAV_SEPARATOR};
pub use crate::metrics::cosine::CosineDistance;
pub use crate::metrics::euclidean::EuclideanDistance;
pub use crate::report::{PromptTemplate, ReportContext};

/// High-level facade over the detection pipeline with a validated configuration.
///
/// # Examples
///
/// ```
/// use casepat_rs::{CaseTable, Engine, PatternConfig, TableSchema};
///
/// let mut table = CaseTable::new(["Year", "Region", "Diagnosis"]);
/// for year in ["2019", "2020", "2021"] {
///     for _ in 0..20 {
///         table.push_row([year, "South", "FluB"]).unwrap();
///         table.push_row([year, "North", "FluC"]).unwrap();
///     }
/// }
/// for _ in 0..50 {
///     table.push_row(["2020", "North", "FluA"]).unwrap();
/// }
///
/// let engine = Engine::new(PatternConfig::new(5, 4)).unwrap();
/// let detection = engine.detect(&table, &TableSchema::new("Year")).unwrap();
/// assert_eq!(detection.diagnostics.n_periods, 3);
/// for row in &detection.patterns {
///     assert!(row.overall_score >= 0.0 && row.overall_score <= 1.0);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: PatternConfig,
}

impl Engine {
    /// Create an engine, rejecting an out-of-range configuration.
    pub fn new(config: PatternConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine from a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(PatternConfig::from_json(json)?)
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Run the full pipeline on `table`.
    pub fn detect(&self, table: &CaseTable, schema: &TableSchema) -> Result<Detection> {
        detect_patterns(table, schema, &self.config)
    }

    /// Run the pipeline and assemble report evidence for its best pattern.
    ///
    /// Returns `None` for the context when nothing was detected.
    pub fn detect_and_explain(
        &self,
        table: &CaseTable,
        schema: &TableSchema,
    ) -> Result<(Detection, Option<ReportContext>)> {
        let detection = self.detect(table, schema)?;
        let context = match detection.patterns.top() {
            Some(top) => Some(ReportContext::from_detection(
                &detection,
                table,
                schema,
                &top.pattern,
                &top.period,
            )?),
            None => None,
        };
        Ok((detection, context))
    }
}
