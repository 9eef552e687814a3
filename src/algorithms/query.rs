use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::algorithms::counter::{RecordCounter, TimeSeriesPoint};
use crate::core::error::{PatternError, Result};
use crate::core::table::{is_missing, CaseTable, TableSchema};
use crate::core::tav::{split_pattern, split_tav};

/// Number of distinct subjects carrying `attribute == value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCount {
    pub attribute: String,
    pub value: String,
    pub count: usize,
}

/// Post-hoc lookups for a detected pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternQuery<'a> {
    table: &'a CaseTable,
    schema: &'a TableSchema,
    counter: &'a RecordCounter,
}

impl<'a> PatternQuery<'a> {
    pub fn new(table: &'a CaseTable, schema: &'a TableSchema, counter: &'a RecordCounter) -> Self {
        Self {
            table,
            schema,
            counter,
        }
    }

    /// Support of `pattern` in every period, in natural period order.
    ///
    /// # Errors
    /// [`PatternError::InvalidPattern`] if a fragment is not a typed attribute
    /// value or names a column absent from the table.
    pub fn time_series(&self, pattern: &str) -> Result<Vec<TimeSeriesPoint>> {
        let tavs = self.parse(pattern)?;
        Ok(self.counter.time_series(&tavs))
    }

    /// Distribution of the other attributes among subjects matching
    /// `pattern` in `period`.
    ///
    /// Rows are selected where the period column equals `period` and every
    /// pattern column holds the pattern's value. The remaining attribute
    /// columns are counted by distinct subject, largest count first, ties by
    /// attribute then value.
    pub fn attribute_counts(&self, pattern: &str, period: &str) -> Result<Vec<AttributeCount>> {
        let tavs = self.parse(pattern)?;
        let mut conditions: Vec<(usize, &str)> = Vec::with_capacity(tavs.len());
        for tav in &tavs {
            if let Some((column, value)) = split_tav(tav) {
                if let Some(idx) = self.table.column_index(column) {
                    conditions.push((idx, value));
                }
            }
        }

        let period_idx = self.table.column_index(&self.schema.period_column).ok_or_else(|| {
            PatternError::input_schema(format!(
                "period column '{}' not found",
                self.schema.period_column
            ))
        })?;
        let subject_idx = self
            .schema
            .subject_column
            .as_deref()
            .and_then(|name| self.table.column_index(name));
        let remaining: Vec<(usize, String)> = self
            .schema
            .resolve_attributes(self.table)?
            .into_iter()
            .filter(|(idx, _)| conditions.iter().all(|(c, _)| c != idx))
            .collect();

        let mut subjects: BTreeMap<(&str, &str), BTreeSet<String>> = BTreeMap::new();
        for (row_no, row) in self.table.rows().iter().enumerate() {
            if row[period_idx].trim() != period {
                continue;
            }
            if !conditions.iter().all(|&(idx, value)| row[idx].trim() == value) {
                continue;
            }
            let subject = match subject_idx {
                Some(idx) if is_missing(&row[idx]) => continue,
                Some(idx) => row[idx].trim().to_string(),
                None => (row_no + 1).to_string(),
            };
            for (idx, name) in &remaining {
                let value = row[*idx].trim();
                if is_missing(value) {
                    continue;
                }
                subjects
                    .entry((name.as_str(), value))
                    .or_default()
                    .insert(subject.clone());
            }
        }

        let mut counts: Vec<AttributeCount> = subjects
            .into_iter()
            .map(|((attribute, value), set)| AttributeCount {
                attribute: attribute.to_string(),
                value: value.to_string(),
                count: set.len(),
            })
            .collect();
        // BTreeMap order already gives (attribute, value) ascending
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    fn parse<'p>(&self, pattern: &'p str) -> Result<Vec<&'p str>> {
        let tavs = split_pattern(pattern);
        if tavs.is_empty() {
            return Err(PatternError::invalid_pattern(
                pattern,
                "no typed attribute values",
            ));
        }
        for tav in &tavs {
            let Some((column, _)) = split_tav(tav) else {
                return Err(PatternError::invalid_pattern(
                    pattern,
                    format!("'{tav}' is not a typed attribute value"),
                ));
            };
            if self.table.column_index(column).is_none() {
                return Err(PatternError::invalid_pattern(
                    pattern,
                    format!("column '{column}' not found"),
                ));
            }
        }
        Ok(tavs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::normalize::normalize;

    fn table() -> CaseTable {
        let mut t = CaseTable::new(["Year", "Region", "Diagnosis", "Age"]);
        for row in [
            ["2019", "North", "FluA", "adult"],
            ["2020", "North", "FluA", "child"],
            ["2020", "North", "FluA", "child"],
            ["2020", "North", "FluA", "adult"],
            ["2020", "North", "FluB", "adult"],
            ["2020", "South", "FluA", ""],
        ] {
            t.push_row(row).unwrap();
        }
        t
    }

    fn with_query<R>(f: impl FnOnce(PatternQuery<'_>) -> R) -> R {
        let t = table();
        let schema = TableSchema::new("Year");
        let counter = RecordCounter::new(&normalize(&t, &schema).unwrap());
        f(PatternQuery::new(&t, &schema, &counter))
    }

    #[test]
    fn test_time_series() {
        let ts = with_query(|q| q.time_series("Region==North & Diagnosis==FluA").unwrap());
        let got: Vec<(&str, usize)> = ts.iter().map(|p| (p.period.as_str(), p.count)).collect();
        assert_eq!(got, vec![("2019", 1), ("2020", 3)]);
        assert_eq!(ts[0].pattern, "Diagnosis==FluA & Region==North");
    }

    #[test]
    fn test_attribute_counts() {
        let counts = with_query(|q| {
            q.attribute_counts("Diagnosis==FluA & Region==North", "2020")
                .unwrap()
        });
        assert_eq!(
            counts,
            vec![
                AttributeCount {
                    attribute: "Age".into(),
                    value: "child".into(),
                    count: 2,
                },
                AttributeCount {
                    attribute: "Age".into(),
                    value: "adult".into(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_attribute_counts_ties_ordered() {
        let counts = with_query(|q| q.attribute_counts("Region==North", "2020").unwrap());
        let got: Vec<(&str, &str, usize)> = counts
            .iter()
            .map(|c| (c.attribute.as_str(), c.value.as_str(), c.count))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Diagnosis", "FluA", 3),
                ("Age", "adult", 2),
                ("Age", "child", 2),
                ("Diagnosis", "FluB", 1),
            ]
        );
    }

    #[test]
    fn test_invalid_patterns() {
        with_query(|q| {
            for bad in ["", "Region", "Region==North & Diagnosis", "Country==X"] {
                let err = q.time_series(bad).unwrap_err();
                assert!(
                    matches!(err, PatternError::InvalidPattern { .. }),
                    "'{bad}' should be rejected"
                );
            }
            assert!(q.attribute_counts("Country==X", "2020").is_err());
        });
    }

    #[test]
    fn test_unknown_value_is_zero() {
        let ts = with_query(|q| q.time_series("Region==West").unwrap());
        assert!(ts.iter().all(|p| p.count == 0));
        let counts = with_query(|q| q.attribute_counts("Region==West", "2020").unwrap());
        assert!(counts.is_empty());
    }

    #[test]
    fn test_padded_cells_match_trimmed_values() {
        let mut t = CaseTable::new(["Year", "Region", "Age"]);
        t.push_row(["2020", " North", "child "]).unwrap();
        t.push_row(["2020", "North", "child"]).unwrap();
        let schema = TableSchema::new("Year");
        let counter = RecordCounter::new(&normalize(&t, &schema).unwrap());
        let q = PatternQuery::new(&t, &schema, &counter);
        assert_eq!(q.time_series("Region==North").unwrap()[0].count, 2);
        let counts = q.attribute_counts("Region==North", "2020").unwrap();
        assert_eq!(
            counts,
            vec![AttributeCount {
                attribute: "Age".into(),
                value: "child".into(),
                count: 2,
            }]
        );
    }
}
