//! Prompt assembly for narrative reports on a detected pattern.
//!
//! The crate does not call any language model. It only fills a caller
//! supplied template with the pattern's evidence so the caller can hand the
//! text to whatever reporting backend it uses.

use serde::{Deserialize, Serialize};

use crate::algorithms::counter::TimeSeriesPoint;
use crate::algorithms::pipeline::Detection;
use crate::algorithms::query::AttributeCount;
use crate::core::error::Result;
use crate::core::table::{CaseTable, TableSchema};

/// Evidence for one `(pattern, period)` report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    pub pattern: String,
    pub period: String,
    pub time_series: Vec<TimeSeriesPoint>,
    pub attribute_counts: Vec<AttributeCount>,
    pub instructions: String,
}

impl ReportContext {
    /// Gather the time series and co-occurring attribute counts of `pattern`.
    pub fn from_detection(
        detection: &Detection,
        table: &CaseTable,
        schema: &TableSchema,
        pattern: &str,
        period: &str,
    ) -> Result<Self> {
        let query = detection.query(table, schema);
        Ok(Self {
            pattern: pattern.to_string(),
            period: period.to_string(),
            time_series: query.time_series(pattern)?,
            attribute_counts: query.attribute_counts(pattern, period)?,
            instructions: String::new(),
        })
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// `period,pattern,count` CSV with header.
    pub fn time_series_csv(&self) -> String {
        let mut out = String::from("period,pattern,count\n");
        for p in &self.time_series {
            out.push_str(&csv_line(&[&p.period, &p.pattern, &p.count.to_string()]));
        }
        out
    }

    /// `attribute,value,count` CSV with header.
    pub fn attribute_counts_csv(&self) -> String {
        let mut out = String::from("attribute,value,count\n");
        for c in &self.attribute_counts {
            out.push_str(&csv_line(&[&c.attribute, &c.value, &c.count.to_string()]));
        }
        out
    }
}

/// A text template with `{pattern}`, `{period}`, `{time_series}`,
/// `{attribute_counts}` and `{instructions}` placeholders.
///
/// Any other brace sequence is copied through unchanged, and substituted
/// text is never re-scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn render(&self, context: &ReportContext) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let replacement = tail.find('}').and_then(|close| {
                let value = match &tail[1..close] {
                    "pattern" => context.pattern.clone(),
                    "period" => context.period.clone(),
                    "time_series" => context.time_series_csv(),
                    "attribute_counts" => context.attribute_counts_csv(),
                    "instructions" => context.instructions.clone(),
                    _ => return None,
                };
                Some((value, close + 1))
            });
            match replacement {
                Some((value, consumed)) => {
                    out.push_str(&value);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| {
            if f.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReportContext {
        ReportContext {
            pattern: "Diagnosis==FluA & Region==North".into(),
            period: "2020".into(),
            time_series: vec![
                TimeSeriesPoint {
                    period: "2019".into(),
                    pattern: "Diagnosis==FluA & Region==North".into(),
                    count: 0,
                },
                TimeSeriesPoint {
                    period: "2020".into(),
                    pattern: "Diagnosis==FluA & Region==North".into(),
                    count: 100,
                },
            ],
            attribute_counts: vec![AttributeCount {
                attribute: "Age".into(),
                value: "0-4, 5-9".into(),
                count: 12,
            }],
            instructions: String::new(),
        }
        .with_instructions("Be brief.")
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let t = PromptTemplate::new("{pattern} in {period}\n{time_series}{attribute_counts}{instructions}");
        let out = t.render(&context());
        assert_eq!(
            out,
            "Diagnosis==FluA & Region==North in 2020\n\
             period,pattern,count\n\
             2019,Diagnosis==FluA & Region==North,0\n\
             2020,Diagnosis==FluA & Region==North,100\n\
             attribute,value,count\n\
             Age,\"0-4, 5-9\",12\n\
             Be brief."
        );
    }

    #[test]
    fn test_unknown_braces_untouched() {
        let t = PromptTemplate::new("{ \"json\": 1 } {unknown} {period");
        assert_eq!(t.render(&context()), "{ \"json\": 1 } {unknown} {period");
    }

    #[test]
    fn test_substituted_text_not_rescanned() {
        let mut ctx = context();
        ctx.pattern = "{period}".into();
        let t = PromptTemplate::new("{pattern}/{period}");
        assert_eq!(t.render(&ctx), "{period}/2020");
    }
}
