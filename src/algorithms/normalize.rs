use std::collections::BTreeSet;

use tracing::debug;

use crate::core::error::{PatternError, Result};
use crate::core::natural::natural_sorted;
use crate::core::table::{is_missing, CaseTable, TableSchema};
use crate::core::tav::{encode_tav, TAV_SEPARATOR};

/// One `(subject, period, typed attribute value)` fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Observation {
    pub subject: String,
    pub period: String,
    pub tav: String,
}

/// The long-format observation relation derived from a case table.
///
/// Observations are sorted by `(subject, period, tav)` and deduplicated, so
/// two tables with the same rows in a different order normalize to the same
/// multiset of counts.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    /// Name of the period column; a TAV of this type selects periods.
    pub period_column: String,
    /// Sorted, deduplicated observations.
    pub observations: Vec<Observation>,
    /// Every period that has at least one row, in natural order.
    pub periods: Vec<String>,
    /// Every subject id seen, including those without any non-empty attribute.
    pub subjects: Vec<String>,
}

impl ObservationSet {
    /// Distinct attribute types carried by at least one observation, sorted.
    pub fn attribute_types(&self) -> Vec<String> {
        let types: BTreeSet<&str> = self
            .observations
            .iter()
            .filter_map(|o| o.tav.split_once(TAV_SEPARATOR).map(|(t, _)| t))
            .collect();
        types.into_iter().map(String::from).collect()
    }

    /// Distinct typed attribute values, sorted.
    pub fn tavs(&self) -> Vec<String> {
        let tavs: BTreeSet<&str> = self.observations.iter().map(|o| o.tav.as_str()).collect();
        tavs.into_iter().map(String::from).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Melt a case table into `(subject, period, TAV)` observations.
///
/// Subjects are taken from the schema's subject column, or numbered `1..N`
/// in row order when there is none. Periods, subjects and values are
/// compared with surrounding whitespace trimmed. Missing cells (see
/// [`is_missing`](crate::core::table::is_missing)) are dropped; rows with a
/// missing period are dropped entirely.
///
/// # Errors
/// [`PatternError::InputSchema`] if the period or subject column is absent,
/// every period is empty, no attribute column is available, or a column name
/// or value collides with the TAV separator.
pub fn normalize(table: &CaseTable, schema: &TableSchema) -> Result<ObservationSet> {
    let period_idx = table.column_index(&schema.period_column).ok_or_else(|| {
        PatternError::input_schema(format!(
            "period column '{}' not found",
            schema.period_column
        ))
    })?;
    if schema.period_column.contains(TAV_SEPARATOR) {
        return Err(PatternError::input_schema(format!(
            "period column '{}' collides with the separator '{TAV_SEPARATOR}'",
            schema.period_column
        )));
    }
    let subject_idx = match &schema.subject_column {
        Some(name) => Some(table.column_index(name).ok_or_else(|| {
            PatternError::input_schema(format!("subject column '{name}' not found"))
        })?),
        None => None,
    };
    let attributes = schema.resolve_attributes(table)?;

    let mut observations = Vec::new();
    let mut periods = BTreeSet::new();
    let mut subjects = BTreeSet::new();
    let mut dropped_rows = 0usize;

    for (row_no, row) in table.rows().iter().enumerate() {
        let period = row[period_idx].trim();
        if is_missing(period) {
            dropped_rows += 1;
            continue;
        }
        let subject = match subject_idx {
            Some(idx) if !is_missing(&row[idx]) => row[idx].trim().to_string(),
            Some(_) => {
                dropped_rows += 1;
                continue;
            }
            None => (row_no + 1).to_string(),
        };
        periods.insert(period.to_string());
        subjects.insert(subject.clone());

        for (col_idx, name) in &attributes {
            let value = row[*col_idx].trim();
            if is_missing(value) {
                continue;
            }
            observations.push(Observation {
                subject: subject.clone(),
                period: period.to_string(),
                tav: encode_tav(name, value)?,
            });
        }
    }

    if periods.is_empty() {
        return Err(PatternError::input_schema(format!(
            "period column '{}' has no non-empty values",
            schema.period_column
        )));
    }

    observations.sort_unstable();
    observations.dedup();

    debug!(
        rows = table.len(),
        dropped_rows,
        observations = observations.len(),
        periods = periods.len(),
        "normalized case table"
    );

    Ok(ObservationSet {
        period_column: schema.period_column.clone(),
        observations,
        periods: natural_sorted(periods),
        subjects: subjects.into_iter().collect(),
    })
}
