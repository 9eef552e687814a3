use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::counter::RecordCounter;
use crate::algorithms::miner::MinedPattern;
use crate::core::natural::natural_cmp;
use crate::core::tav::join_pattern;

/// One ranked pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRow {
    pub period: String,
    /// Sorted TAVs joined with `" & "`.
    pub pattern: String,
    pub length: usize,
    pub count: usize,
    /// Mean support over all periods, rounded.
    pub mean: usize,
    /// Standard score of `count` against all periods, two decimals.
    pub z_score: f64,
    /// Number of periods in which the miner emitted this pattern.
    pub detections: usize,
    /// Composite salience relative to the best row, in `[0, 1]`, two decimals.
    pub overall_score: f64,
}

/// Ranked patterns, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternsTable {
    pub rows: Vec<PatternRow>,
}

impl PatternsTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternRow> {
        self.rows.iter()
    }

    /// Highest-scoring row.
    pub fn top(&self) -> Option<&PatternRow> {
        self.rows.first()
    }

    /// Rows for `pattern`, in table order.
    pub fn find<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a PatternRow> + 'a {
        self.rows.iter().filter(move |r| r.pattern == pattern)
    }

    /// Serialize the rows as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}

impl<'a> IntoIterator for &'a PatternsTable {
    type Item = &'a PatternRow;
    type IntoIter = std::slice::Iter<'a, PatternRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Score and order mined patterns against their history.
///
/// For each `(period, S, count)`, `z = (count - mean) / sd` over the support
/// of `S` in every period (population sd). A row with `z < 0` is dropped;
/// with zero variance `z = 0` and the row is kept iff `count >= mean`. The
/// raw score `z * |S| * detections * ln(1 + count)` is divided by the
/// largest raw score and rounded to two decimals. Exactly one row, the
/// largest raw score with ties going to the first by pattern then period,
/// scores 1.00; every other row is capped at 0.99. When no raw score is
/// positive the other rows score 0. Rows are sorted by score descending,
/// then pattern, then period.
pub fn rank_patterns(mined: &[MinedPattern], counter: &RecordCounter) -> PatternsTable {
    let mut detections: HashMap<&[String], usize> = HashMap::new();
    for m in mined {
        *detections.entry(m.tavs.as_slice()).or_default() += 1;
    }

    let mut scored: Vec<(PatternRow, f64)> = Vec::with_capacity(mined.len());
    for m in mined {
        let stats = counter.period_mean_sd_max(&m.tavs);
        let count = m.count as f64;
        let z = if stats.sd > 0.0 {
            (count - stats.mean) / stats.sd
        } else if count >= stats.mean {
            0.0
        } else {
            continue;
        };
        if z < 0.0 {
            continue;
        }
        let detected = detections.get(m.tavs.as_slice()).copied().unwrap_or(1);
        let raw = z * m.len() as f64 * detected as f64 * count.ln_1p();
        scored.push((
            PatternRow {
                period: m.period.clone(),
                pattern: join_pattern(&m.tavs),
                length: m.len(),
                count: m.count,
                mean: stats.mean.round() as usize,
                z_score: round2(z),
                detections: detected,
                overall_score: 0.0,
            },
            raw,
        ));
    }

    let top = scored
        .iter()
        .enumerate()
        .max_by(|(_, (a, ra)), (_, (b, rb))| {
            ra.partial_cmp(rb)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.pattern.cmp(&a.pattern))
                .then_with(|| natural_cmp(&b.period, &a.period))
        })
        .map(|(i, _)| i);
    let raw: Vec<f64> = scored.iter().map(|(_, r)| *r).collect();
    let scores = overall_scores(&raw, top);
    let mut rows: Vec<PatternRow> = scored
        .into_iter()
        .zip(scores)
        .map(|((mut row, _), score)| {
            row.overall_score = score;
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.overall_score
            .partial_cmp(&a.overall_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pattern.cmp(&b.pattern))
            .then_with(|| natural_cmp(&a.period, &b.period))
    });

    debug!(mined = mined.len(), ranked = rows.len(), "ranked patterns");
    PatternsTable { rows }
}

/// Scores relative to `raw[top]`, which alone maps to 1.0.
fn overall_scores(raw: &[f64], top: Option<usize>) -> Vec<f64> {
    let max = top.map_or(0.0, |i| raw[i]);
    raw.iter()
        .enumerate()
        .map(|(i, &r)| {
            if Some(i) == top {
                1.0
            } else if max > 0.0 {
                round2(r / max).min(0.99)
            } else {
                0.0
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::normalize::normalize;
    use crate::core::table::{CaseTable, TableSchema};

    /// A==x & B==y has support 1, 1, 7 over p1..p3; A==w & B==y is flat at 2.
    fn counter() -> RecordCounter {
        let mut t = CaseTable::new(["P", "A", "B"]);
        for (p, n) in [("p1", 1), ("p2", 1), ("p3", 7)] {
            for _ in 0..n {
                t.push_row([p, "x", "y"]).unwrap();
            }
            for _ in 0..2 {
                t.push_row([p, "w", "y"]).unwrap();
            }
        }
        RecordCounter::new(&normalize(&t, &TableSchema::new("P")).unwrap())
    }

    fn mined(period: &str, tavs: &[&str], count: usize) -> MinedPattern {
        MinedPattern {
            period: period.into(),
            tavs: tavs.iter().map(|t| t.to_string()).collect(),
            count,
        }
    }

    #[test]
    fn test_z_score_and_normalization() {
        let c = counter();
        let table = rank_patterns(
            &[
                mined("p3", &["A==x", "B==y"], 7),
                mined("p2", &["A==w", "B==y"], 2),
            ],
            &c,
        );
        assert_eq!(table.len(), 2);
        let top = table.top().unwrap();
        assert_eq!(top.pattern, "A==x & B==y");
        assert_eq!(top.mean, 3);
        // mean 3, sd sqrt(8) → z = 4 / 2.828...
        assert!((top.z_score - 1.41).abs() < 1e-9, "z = {}", top.z_score);
        assert_eq!(top.overall_score, 1.0);
        assert_eq!(top.detections, 1);

        // Flat history: zero variance keeps the row with a zero score
        let flat = &table.rows[1];
        assert_eq!(flat.pattern, "A==w & B==y");
        assert_eq!(flat.z_score, 0.0);
        assert_eq!(flat.overall_score, 0.0);
    }

    #[test]
    fn test_negative_z_dropped() {
        let c = counter();
        let table = rank_patterns(&[mined("p1", &["A==x", "B==y"], 1)], &c);
        assert!(table.is_empty());
    }

    #[test]
    fn test_single_top_when_every_z_is_zero() {
        let c = counter();
        let table = rank_patterns(
            &[
                mined("p2", &["A==w", "B==y"], 2),
                mined("p1", &["A==w", "B==y"], 2),
            ],
            &c,
        );
        let scores: Vec<(&str, f64)> = table
            .iter()
            .map(|r| (r.period.as_str(), r.overall_score))
            .collect();
        assert_eq!(scores, vec![("p1", 1.0), ("p2", 0.0)]);
    }

    #[test]
    fn test_near_ties_do_not_round_to_one() {
        assert_eq!(
            overall_scores(&[9.99, 10.0, 5.0, 10.0], Some(1)),
            vec![0.99, 1.0, 0.5, 0.99]
        );
        assert_eq!(overall_scores(&[0.0, 0.0], Some(0)), vec![1.0, 0.0]);
        assert!(overall_scores(&[], None).is_empty());
    }

    #[test]
    fn test_detections_and_tie_order() {
        let c = counter();
        let table = rank_patterns(
            &[
                mined("p3", &["A==w", "B==y"], 2),
                mined("p1", &["A==w", "B==y"], 2),
                mined("p2", &["A==w", "B==y"], 2),
            ],
            &c,
        );
        let periods: Vec<&str> = table.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["p1", "p2", "p3"]);
        assert!(table.iter().all(|r| r.detections == 3));
        assert_eq!(table.find("A==w & B==y").count(), 3);
    }

    #[test]
    fn test_to_json() {
        let c = counter();
        let table = rank_patterns(&[mined("p3", &["A==x", "B==y"], 7)], &c);
        let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["pattern"], "A==x & B==y");
        assert_eq!(json[0]["overall_score"], 1.0);
    }
}
