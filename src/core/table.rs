use crate::core::error::{PatternError, Result};
use serde::{Deserialize, Serialize};

/// Tokens treated as a missing value (after trimming whitespace).
pub const NULL_TOKENS: [&str; 4] = ["", "nan", "<NA>", "None"];

/// Whether a raw cell value counts as missing.
#[inline]
pub fn is_missing(value: &str) -> bool {
    let v = value.trim();
    NULL_TOKENS.contains(&v)
}

/// A case table: named string columns, one row per subject record.
///
/// The caller is responsible for loading, stringifying and discretizing the
/// data; this type only guarantees every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CaseTable {
    /// Create an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and rows, validating row widths.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<String>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row. Fails if its width differs from the header.
    pub fn push_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(PatternError::input_schema(format!(
                "row {} has {} cells, header has {} columns",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Return a copy of the table with rows in a different order.
    ///
    /// `order[i]` is the source row placed at position `i`.
    pub fn reordered(&self, order: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Which columns of a [`CaseTable`] play which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column holding the period label.
    pub period_column: String,
    /// Column holding the subject identifier; row number (`1..N`) when absent.
    pub subject_column: Option<String>,
    /// Attribute columns to analyze; every remaining column when absent.
    pub attribute_columns: Option<Vec<String>>,
}

impl TableSchema {
    pub fn new(period_column: impl Into<String>) -> Self {
        Self {
            period_column: period_column.into(),
            subject_column: None,
            attribute_columns: None,
        }
    }

    pub fn with_subject_column(mut self, column: impl Into<String>) -> Self {
        self.subject_column = Some(column.into());
        self
    }

    pub fn with_attribute_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve the attribute columns of `table` as `(column index, name)` pairs.
    ///
    /// Fails if a named column is missing or nothing is left to analyze.
    pub fn resolve_attributes(&self, table: &CaseTable) -> Result<Vec<(usize, String)>> {
        let resolved: Vec<(usize, String)> = match &self.attribute_columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    table
                        .column_index(name)
                        .map(|idx| (idx, name.clone()))
                        .ok_or_else(|| {
                            PatternError::input_schema(format!(
                                "attribute column '{name}' not found"
                            ))
                        })
                })
                .collect::<Result<_>>()?,
            None => table
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, name)| {
                    **name != self.period_column
                        && self.subject_column.as_deref() != Some(name.as_str())
                })
                .map(|(idx, name)| (idx, name.clone()))
                .collect(),
        };

        let resolved: Vec<(usize, String)> = resolved
            .into_iter()
            .filter(|(_, name)| {
                *name != self.period_column && self.subject_column.as_deref() != Some(name.as_str())
            })
            .collect();

        if resolved.is_empty() {
            return Err(PatternError::input_schema(
                "table has no attribute columns besides the period and subject columns",
            ));
        }
        Ok(resolved)
    }
}
