use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::counter::RecordCounter;
use crate::algorithms::shift::ShiftTable;
use crate::core::config::PatternConfig;

/// A pattern emitted by the miner for one period, before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedPattern {
    pub period: String,
    /// Sorted typed attribute values.
    pub tavs: Vec<String>,
    /// `support(period, tavs)`.
    pub count: usize,
}

impl MinedPattern {
    pub fn len(&self) -> usize {
        self.tavs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tavs.is_empty()
    }
}

/// Expand the converging pairs of every period into patterns.
///
/// Periods are mined independently and the result keeps natural period
/// order, each period in breadth-first discovery order.
pub fn mine_patterns(
    shifts: &ShiftTable,
    counter: &RecordCounter,
    config: &PatternConfig,
) -> Vec<MinedPattern> {
    let periods = counter.periods();
    let mine = |period: &String| {
        mine_period(
            period,
            &shifts.pairs_in(period),
            counter,
            config.min_pattern_count,
            config.max_pattern_length,
        )
    };

    #[cfg(feature = "parallel")]
    let per_period: Vec<Vec<MinedPattern>> = {
        use rayon::prelude::*;
        periods.par_iter().map(mine).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let per_period: Vec<Vec<MinedPattern>> = periods.iter().map(mine).collect();

    let mined: Vec<MinedPattern> = per_period.into_iter().flatten().collect();
    debug!(mined = mined.len(), "mined patterns");
    mined
}

/// Breadth-first clique expansion over one period's converging pairs.
///
/// Starting from the empty set, each queued set `S` is extended by every
/// converging pair in ascending order: a pair with one member in `S` adds
/// the other, a pair disjoint from a non-empty `S` is skipped, and from the
/// empty set a pair seeds `{a, b}`. A candidate is kept if it has at most
/// `max_len` members, every pair inside it converges, and its support
/// exceeds `min_count`.
pub fn mine_period(
    period: &str,
    pairs: &[(&str, &str)],
    counter: &RecordCounter,
    min_count: usize,
    max_len: usize,
) -> Vec<MinedPattern> {
    let mut sorted_pairs: Vec<(&str, &str)> = pairs
        .iter()
        .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
        .collect();
    sorted_pairs.sort_unstable();
    sorted_pairs.dedup();
    let edges: HashSet<(&str, &str)> = sorted_pairs.iter().copied().collect();
    let is_clique = |set: &[&str]| {
        set.iter()
            .enumerate()
            .all(|(i, a)| set[i + 1..].iter().all(|b| edges.contains(&(*a, *b))))
    };

    let mut queue: VecDeque<Vec<&str>> = VecDeque::from([Vec::new()]);
    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    let mut out = Vec::new();

    while let Some(set) = queue.pop_front() {
        for &(a, b) in &sorted_pairs {
            let has_a = set.contains(&a);
            let has_b = set.contains(&b);
            let candidate: Vec<&str> = match (has_a, has_b) {
                (true, true) => continue,
                (false, false) if !set.is_empty() => continue,
                (false, false) => vec![a, b],
                (true, false) => vec![b],
                (false, true) => vec![a],
            };

            let mut next = set.clone();
            next.extend(candidate);
            next.sort_unstable();
            if next.len() > max_len || seen.contains(&next) {
                continue;
            }
            seen.insert(next.clone());
            if !is_clique(&next) {
                continue;
            }
            let count = counter.support(period, &next);
            if count > min_count {
                out.push(MinedPattern {
                    period: period.to_string(),
                    tavs: next.iter().map(|t| t.to_string()).collect(),
                    count,
                });
                queue.push_back(next);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::normalize::normalize;
    use crate::core::table::{CaseTable, TableSchema};

    /// Period p1: 6 records with A=x, B=y, C=z; 3 with only A=x, B=y.
    fn counter() -> RecordCounter {
        let mut t = CaseTable::new(["P", "A", "B", "C"]);
        for _ in 0..6 {
            t.push_row(["p1", "x", "y", "z"]).unwrap();
        }
        for _ in 0..3 {
            t.push_row(["p1", "x", "y", ""]).unwrap();
        }
        t.push_row(["p2", "x", "", "z"]).unwrap();
        RecordCounter::new(&normalize(&t, &TableSchema::new("P")).unwrap())
    }

    fn tavs(m: &MinedPattern) -> Vec<&str> {
        m.tavs.iter().map(String::as_str).collect()
    }

    const TRIANGLE: [(&str, &str); 3] = [
        ("A==x", "B==y"),
        ("A==x", "C==z"),
        ("B==y", "C==z"),
    ];

    #[test]
    fn test_triangle_expands_to_triple() {
        let c = counter();
        let mined = mine_period("p1", &TRIANGLE, &c, 1, 3);
        let sets: Vec<Vec<&str>> = mined.iter().map(tavs).collect();
        assert_eq!(
            sets,
            vec![
                vec!["A==x", "B==y"],
                vec!["A==x", "C==z"],
                vec!["B==y", "C==z"],
                vec!["A==x", "B==y", "C==z"],
            ]
        );
        assert_eq!(mined[0].count, 9);
        assert_eq!(mined[3].count, 6);
        assert!(mined.iter().all(|m| m.period == "p1"));
    }

    #[test]
    fn test_max_length_caps_expansion() {
        let c = counter();
        let mined = mine_period("p1", &TRIANGLE, &c, 1, 2);
        assert!(mined.iter().all(|m| m.len() <= 2));
        assert_eq!(mined.len(), 3);
    }

    #[test]
    fn test_support_must_exceed_threshold() {
        let c = counter();
        // Triple has support 6: strictly greater is required
        let mined = mine_period("p1", &TRIANGLE, &c, 6, 3);
        let sets: Vec<Vec<&str>> = mined.iter().map(tavs).collect();
        assert_eq!(sets, vec![vec!["A==x", "B==y"]]);
    }

    #[test]
    fn test_missing_edge_blocks_clique() {
        let c = counter();
        let mined = mine_period("p1", &TRIANGLE[..2], &c, 1, 3);
        assert!(mined.iter().all(|m| m.len() == 2));
        assert_eq!(mined.len(), 2);
    }

    #[test]
    fn test_no_pairs_no_patterns() {
        let c = counter();
        assert!(mine_period("p1", &[], &c, 1, 3).is_empty());
    }
}
