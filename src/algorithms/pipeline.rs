use tracing::{info, instrument, warn};

use crate::algorithms::counter::RecordCounter;
use crate::algorithms::embed::embed_periods;
use crate::algorithms::graph::{build_period_graphs, dynamic_lcc, Vocabulary};
use crate::algorithms::miner::mine_patterns;
use crate::algorithms::normalize::normalize;
use crate::algorithms::query::PatternQuery;
use crate::algorithms::ranker::{rank_patterns, PatternsTable};
use crate::algorithms::shift::{detect_shifts, ShiftTable};
use crate::core::config::PatternConfig;
use crate::core::diagnostics::{Diagnostics, PeriodLcc, PipelineWarning};
use crate::core::error::Result;
use crate::core::table::{CaseTable, TableSchema};

/// Everything a detection run produces.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Ranked patterns, best first.
    pub patterns: PatternsTable,
    pub diagnostics: Diagnostics,
    /// Converging pairs behind the patterns.
    pub shifts: ShiftTable,
    /// Support index over the normalized input, reusable for queries.
    pub counter: RecordCounter,
}

impl Detection {
    /// Query helper over the table this detection was run on.
    pub fn query<'a>(&'a self, table: &'a CaseTable, schema: &'a TableSchema) -> PatternQuery<'a> {
        PatternQuery::new(table, schema, &self.counter)
    }
}

/// Run the full detection pipeline on a case table.
///
/// # Errors
/// [`PatternError::Configuration`](crate::PatternError::Configuration) for an
/// out-of-range config, [`PatternError::InputSchema`](crate::PatternError::InputSchema)
/// for a table the normalizer rejects. Empty periods, degenerate embeddings
/// and an empty result are reported in [`Detection::diagnostics`] instead.
#[instrument(
    skip(table, schema, config),
    fields(period_column = %schema.period_column, rows = table.len())
)]
pub fn detect_patterns(
    table: &CaseTable,
    schema: &TableSchema,
    config: &PatternConfig,
) -> Result<Detection> {
    config.validate()?;

    let observations = normalize(table, schema)?;
    let vocab = Vocabulary::from_observations(&observations);
    let counter = RecordCounter::new(&observations);

    let mut diagnostics = Diagnostics {
        n_subjects: counter.n_subjects(),
        n_records: counter.n_records(),
        n_periods: observations.periods.len(),
        n_nodes: vocab.len(),
        n_attribute_types: vocab.n_types(),
        ..Diagnostics::default()
    };
    info!(
        subjects = diagnostics.n_subjects,
        periods = diagnostics.n_periods,
        nodes = diagnostics.n_nodes,
        attribute_types = diagnostics.n_attribute_types,
        "normalized input"
    );

    let graphs = build_period_graphs(&observations, &vocab, config);
    for graph in &graphs {
        diagnostics.per_period_lcc_sizes.push(PeriodLcc {
            period: graph.period.clone(),
            size: graph.lcc.len(),
        });
        if graph.is_empty_signal() {
            warn!(period = %graph.period, "no record carries two attribute values");
            diagnostics.warn(PipelineWarning::EmptyPeriod {
                period: graph.period.clone(),
            });
        }
    }
    diagnostics.dynamic_lcc_size = dynamic_lcc(&graphs).len();

    let embeddings = embed_periods(&graphs, &vocab, config);
    let shifts = detect_shifts(&embeddings, &vocab, &counter, config);
    diagnostics.all_pairs = shifts.all_pairs;
    diagnostics.close_pairs = shifts.close_pairs();
    for node in &shifts.degenerate {
        diagnostics.warn(PipelineWarning::DegenerateEmbedding {
            period: node.period.clone(),
            tav: node.tav.clone(),
        });
    }

    let mined = mine_patterns(&shifts, &counter, config);
    diagnostics.mined_patterns = mined.len();
    let patterns = rank_patterns(&mined, &counter);
    if patterns.is_empty() {
        info!("no patterns found");
        diagnostics.warn(PipelineWarning::NoPatternsFound);
    }

    info!(
        all_pairs = diagnostics.all_pairs,
        close_pairs = diagnostics.close_pairs,
        mined = diagnostics.mined_patterns,
        patterns = patterns.len(),
        "pattern detection complete"
    );

    Ok(Detection {
        patterns,
        diagnostics,
        shifts,
        counter,
    })
}
