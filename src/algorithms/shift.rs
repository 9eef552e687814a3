use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithms::counter::RecordCounter;
use crate::algorithms::embed::PeriodEmbeddings;
use crate::algorithms::graph::Vocabulary;
use crate::core::config::{PatternConfig, SHIFT_TOLERANCE};
use crate::core::distance_metric::VectorMetric;
use crate::core::embedding::Embedding;
use crate::core::tav::dynamic_node_id;
use crate::metrics::cosine::CosineDistance;
use crate::metrics::euclidean::EuclideanDistance;

/// A converging attribute pair in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairShift {
    pub period: String,
    /// Lexicographically smaller TAV of the pair.
    pub a: String,
    pub b: String,
    /// `support(period, {a, b})`.
    pub count: usize,
    /// Mean support of the pair over all periods.
    pub mean_count: f64,
    pub count_delta: f64,
    /// `count / mean_count`.
    pub count_factor: f64,
    /// Centroid cosine distance minus period cosine distance. `None` when
    /// the centroid cosine is undefined.
    pub delta_cosine: Option<f64>,
    /// Centroid Euclidean distance minus period Euclidean distance.
    pub delta_euclidean: f64,
}

impl PairShift {
    /// Whether the pair moved closer under either metric.
    pub fn is_contracting(&self) -> bool {
        converges(self.delta_cosine, self.delta_euclidean)
    }
}

/// Either delta exceeds [`SHIFT_TOLERANCE`].
fn converges(delta_cosine: Option<f64>, delta_euclidean: f64) -> bool {
    delta_cosine.is_some_and(|d| d > SHIFT_TOLERANCE) || delta_euclidean > SHIFT_TOLERANCE
}

/// A node excluded from one period because its embedding has zero norm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateNode {
    pub period: String,
    pub tav: String,
}

/// Converging pairs of every period plus evaluation totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftTable {
    /// Converging pairs, by period (natural order) then `(a, b)` ascending.
    pub rows: Vec<PairShift>,
    /// `(period, cross-type pair)` combinations evaluated.
    pub all_pairs: usize,
    /// Zero-norm nodes, once per `(period, node)`.
    pub degenerate: Vec<DegenerateNode>,
}

impl ShiftTable {
    /// Number of converging `(period, pair)` rows.
    pub fn close_pairs(&self) -> usize {
        self.rows.len()
    }

    /// Converging pairs of `period` as `(a, b)` with `a < b`, ascending.
    pub fn pairs_in(&self, period: &str) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .filter(|r| r.period == period)
            .map(|r| (r.a.as_str(), r.b.as_str()))
            .collect()
    }
}

struct PeriodShifts {
    rows: Vec<PairShift>,
    evaluated: usize,
    degenerate: Vec<usize>,
}

/// Find converging cross-type pairs in every period.
///
/// A pair converges in `p` when it is closer in `p` than in the centroid
/// under cosine or Euclidean distance, and its support in `p` reaches
/// `min_pattern_count`. Same-type pairs are never evaluated; pairs touching
/// a zero-norm node are skipped for that period.
pub fn detect_shifts(
    embeddings: &PeriodEmbeddings,
    vocab: &Vocabulary,
    counter: &RecordCounter,
    config: &PatternConfig,
) -> ShiftTable {
    let pairs = cross_type_pairs(vocab);
    let ref_cosine = centroid_distances::<CosineDistance>(&embeddings.centroid, &pairs);
    let ref_euclidean = centroid_distances::<EuclideanDistance>(&embeddings.centroid, &pairs);

    let scan = |(period, z): (&String, &Embedding)| {
        scan_period(
            period,
            z,
            vocab,
            &pairs,
            (ref_cosine.as_slice(), ref_euclidean.as_slice()),
            counter,
            config.min_pattern_count,
        )
    };

    #[cfg(feature = "parallel")]
    let per_period: Vec<PeriodShifts> = {
        use rayon::prelude::*;
        embeddings
            .periods
            .par_iter()
            .zip(embeddings.embeddings.par_iter())
            .map(scan)
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let per_period: Vec<PeriodShifts> = embeddings
        .periods
        .iter()
        .zip(embeddings.embeddings.iter())
        .map(scan)
        .collect();

    let mut table = ShiftTable::default();
    for (period, shifts) in embeddings.periods.iter().zip(per_period) {
        table.all_pairs += shifts.evaluated;
        table.rows.extend(shifts.rows);
        for node in shifts.degenerate {
            warn!(
                node = %dynamic_node_id(vocab.tav(node), period),
                "zero-norm embedding, pairs skipped"
            );
            table.degenerate.push(DegenerateNode {
                period: period.clone(),
                tav: vocab.tav(node).to_string(),
            });
        }
    }

    debug!(
        candidate_pairs = pairs.len(),
        all_pairs = table.all_pairs,
        close_pairs = table.close_pairs(),
        "detected period shifts"
    );
    table
}

/// Every unordered node pair `(i, j)`, `i < j`, whose types differ.
fn cross_type_pairs(vocab: &Vocabulary) -> Vec<(usize, usize)> {
    let n = vocab.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            if vocab.label(i) != vocab.label(j) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

fn centroid_distances<M: VectorMetric>(
    centroid: &Embedding,
    pairs: &[(usize, usize)],
) -> Vec<Option<f64>> {
    let distances: Vec<Option<f64>> = pairs
        .iter()
        .map(|&(i, j)| M::distance(centroid.row(i), centroid.row(j)))
        .collect();
    let undefined = distances.iter().filter(|d| d.is_none()).count();
    if undefined > 0 {
        debug!(metric = M::NAME, undefined, "centroid distance undefined for some pairs");
    }
    distances
}

fn scan_period(
    period: &str,
    z: &Embedding,
    vocab: &Vocabulary,
    pairs: &[(usize, usize)],
    (ref_cosine, ref_euclidean): (&[Option<f64>], &[Option<f64>]),
    counter: &RecordCounter,
    min_count: usize,
) -> PeriodShifts {
    let degenerate: Vec<usize> = (0..z.n()).filter(|&i| z.norm(i) == 0.0).collect();
    let is_degenerate = |i: usize| degenerate.binary_search(&i).is_ok();

    let mut rows = Vec::new();
    let mut evaluated = 0;
    for (k, &(i, j)) in pairs.iter().enumerate() {
        if is_degenerate(i) || is_degenerate(j) {
            continue;
        }
        evaluated += 1;

        let (zi, zj) = (z.row(i), z.row(j));
        let delta_cosine = CosineDistance::contraction(ref_cosine[k], zi, zj);
        let delta_euclidean =
            EuclideanDistance::contraction(ref_euclidean[k], zi, zj).unwrap_or(0.0);
        if !converges(delta_cosine, delta_euclidean) {
            continue;
        }

        let tavs = [vocab.tav(i), vocab.tav(j)];
        let count = counter.support(period, &tavs);
        if count < min_count {
            continue;
        }
        let mean_count = counter.period_mean_sd_max(&tavs).mean;
        rows.push(PairShift {
            period: period.to_string(),
            a: tavs[0].to_string(),
            b: tavs[1].to_string(),
            count,
            mean_count,
            count_delta: count as f64 - mean_count,
            count_factor: if mean_count > 0.0 {
                count as f64 / mean_count
            } else {
                0.0
            },
            delta_cosine,
            delta_euclidean,
        });
    }

    PeriodShifts {
        rows,
        evaluated,
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::embed::embed_periods;
    use crate::algorithms::graph::build_period_graphs;
    use crate::algorithms::normalize::normalize;
    use crate::core::table::{CaseTable, TableSchema};

    /// Flu cases over three years; 2020 adds a North FluA cluster.
    fn table() -> CaseTable {
        let mut t = CaseTable::new(["Year", "Region", "Diagnosis"]);
        for year in ["2019", "2020", "2021"] {
            for _ in 0..20 {
                for flu in ["FluA", "FluB", "FluC"] {
                    t.push_row([year, "South", flu]).unwrap();
                }
                for flu in ["FluB", "FluC"] {
                    t.push_row([year, "North", flu]).unwrap();
                }
            }
        }
        for _ in 0..100 {
            t.push_row(["2020", "North", "FluA"]).unwrap();
        }
        t
    }

    fn run(config: &PatternConfig) -> (ShiftTable, Vocabulary) {
        let obs = normalize(&table(), &TableSchema::new("Year")).unwrap();
        let vocab = Vocabulary::from_observations(&obs);
        let counter = RecordCounter::new(&obs);
        let graphs = build_period_graphs(&obs, &vocab, config);
        let embeddings = embed_periods(&graphs, &vocab, config);
        (detect_shifts(&embeddings, &vocab, &counter, config), vocab)
    }

    #[test]
    fn test_cross_type_pairs_only() {
        let vocab = Vocabulary::from_tavs(vec!["A==x".into(), "A==w".into(), "B==y".into()]);
        assert_eq!(cross_type_pairs(&vocab), vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn test_converging_pair_found() {
        let config = PatternConfig::new(5, 4);
        let (shifts, _) = run(&config);
        assert_eq!(
            shifts.pairs_in("2020"),
            vec![("Diagnosis==FluA", "Region==North")]
        );
        let row = shifts.rows.iter().find(|r| r.period == "2020").unwrap();
        assert_eq!(row.count, 100);
        assert!((row.mean_count - 100.0 / 3.0).abs() < 1e-9);
        assert!((row.count_factor - 3.0).abs() < 1e-9);
        assert!(row.is_contracting());
        // 6 cross-type pairs in each of 3 periods
        assert_eq!(shifts.all_pairs, 18);
        // FluA/North is absent outside 2020, so the other years keep 5 pairs each
        assert_eq!(shifts.close_pairs(), 11);
        assert_eq!(shifts.pairs_in("2019").len(), 5);
        assert!(shifts.degenerate.is_empty());
    }

    #[test]
    fn test_support_threshold_filters() {
        let config = PatternConfig::new(101, 4);
        let (shifts, _) = run(&config);
        assert_eq!(shifts.close_pairs(), 0);
        assert_eq!(shifts.all_pairs, 18);
    }

    #[test]
    fn test_rounding_noise_is_not_a_shift() {
        let row = |delta_cosine: Option<f64>, delta_euclidean: f64| PairShift {
            period: "p1".into(),
            a: "A==x".into(),
            b: "B==y".into(),
            count: 3,
            mean_count: 3.0,
            count_delta: 0.0,
            count_factor: 1.0,
            delta_cosine,
            delta_euclidean,
        };
        assert!(!row(Some(2.2e-16), 4.4e-16).is_contracting());
        assert!(!row(None, SHIFT_TOLERANCE).is_contracting());
        assert!(row(Some(1e-6), 0.0).is_contracting());
        assert!(row(None, 1e-6).is_contracting());
    }

    #[test]
    fn test_identical_periods_have_no_shifts() {
        for n_periods in 3..=8 {
            let mut t = CaseTable::new(["P", "A", "B", "C"]);
            for p in 1..=n_periods {
                let period = format!("p{p}");
                for (a, b, c, n) in [
                    ("a1", "b1", "c1", 5),
                    ("a1", "b2", "c2", 3),
                    ("a2", "b1", "c2", 4),
                    ("a2", "b2", "c1", 2),
                ] {
                    for _ in 0..n {
                        t.push_row([period.as_str(), a, b, c]).unwrap();
                    }
                }
            }
            let obs = normalize(&t, &TableSchema::new("P")).unwrap();
            let vocab = Vocabulary::from_observations(&obs);
            let counter = RecordCounter::new(&obs);
            for mi in [false, true] {
                let config = PatternConfig::new(1, 3).with_mutual_information(mi);
                let graphs = build_period_graphs(&obs, &vocab, &config);
                let embeddings = embed_periods(&graphs, &vocab, &config);
                let shifts = detect_shifts(&embeddings, &vocab, &counter, &config);
                assert_eq!(shifts.close_pairs(), 0, "n_periods={n_periods} mi={mi}");
                assert_eq!(shifts.all_pairs, 12 * n_periods);
            }
        }
    }

    #[test]
    fn test_rows_are_ordered() {
        let config = PatternConfig::new(1, 4);
        let (shifts, vocab) = run(&config);
        for r in &shifts.rows {
            assert!(r.a < r.b);
            assert_ne!(
                vocab.label(vocab.index_of(&r.a).unwrap()),
                vocab.label(vocab.index_of(&r.b).unwrap())
            );
            assert!(r.count >= 1);
        }
    }
}
