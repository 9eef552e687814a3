use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::algorithms::normalize::ObservationSet;
use crate::core::tav::{join_pattern, split_tav, TAV_SEPARATOR};

/// Mean, population standard deviation and maximum of a per-period count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub mean: f64,
    pub sd: f64,
    pub max: usize,
}

/// Support of a pattern in one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub period: String,
    pub pattern: String,
    pub count: usize,
}

/// Exact support counting over the observation relation.
///
/// Keeps the subject set of every typed attribute value and of every period
/// as sorted subject ids. Queries intersect those sets, so a subject seen in
/// several periods counts towards a period's support with every value it
/// carries anywhere in its history. Built once, read-only afterwards, and
/// shared by reference between pipeline stages.
#[derive(Debug, Clone)]
pub struct RecordCounter {
    period_column: String,
    periods: Vec<String>,
    period_index: HashMap<String, usize>,
    /// `subjects(p)`, indexed like `periods`.
    period_subjects: Vec<Vec<u32>>,
    /// `subjects(a)` per typed attribute value.
    tav_subjects: HashMap<String, Vec<u32>>,
    n_subjects: usize,
    n_records: usize,
}

impl RecordCounter {
    /// Index an observation set.
    pub fn new(observations: &ObservationSet) -> Self {
        let periods = observations.periods.clone();
        let period_index: HashMap<String, usize> = periods
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();

        let mut period_subjects: Vec<Vec<u32>> = vec![Vec::new(); periods.len()];
        let mut tav_subjects: HashMap<String, Vec<u32>> = HashMap::new();

        let mut subject_id: u32 = 0;
        let mut n_records = 0;
        let mut last: Option<(&str, &str)> = None;
        // Observations are sorted by (subject, period, tav), so subject ids are
        // assigned in ascending order and every list below stays sorted.
        for obs in &observations.observations {
            let key = (obs.subject.as_str(), obs.period.as_str());
            if last != Some(key) {
                if let Some((prev_subject, _)) = last {
                    if prev_subject != obs.subject {
                        subject_id += 1;
                    }
                }
                n_records += 1;
                if let Some(&p) = period_index.get(&obs.period) {
                    push_unique(&mut period_subjects[p], subject_id);
                }
                last = Some(key);
            }
            push_unique(tav_subjects.entry(obs.tav.clone()).or_default(), subject_id);
        }

        Self {
            period_column: observations.period_column.clone(),
            periods,
            period_index,
            period_subjects,
            tav_subjects,
            n_subjects: if n_records == 0 { 0 } else { subject_id as usize + 1 },
            n_records,
        }
    }

    /// Periods in natural order.
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// Name of the attribute type that selects periods in [`count`](Self::count).
    pub fn period_column(&self) -> &str {
        &self.period_column
    }

    /// Typed attribute value selecting `period`, e.g. `Year==2020`.
    pub fn period_tav(&self, period: &str) -> String {
        format!("{}{TAV_SEPARATOR}{period}", self.period_column)
    }

    /// Number of subjects with at least one observation.
    pub fn n_subjects(&self) -> usize {
        self.n_subjects
    }

    /// Number of distinct `(subject, period)` records.
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Count the subjects matching a conjunction of typed attribute values.
    ///
    /// Values are grouped by attribute type: within a type they form a union
    /// (any of the listed values), across types an intersection. A value of
    /// the period column selects that period and takes part like any other
    /// type. An empty query counts every subject; a string that is not a TAV
    /// matches nothing.
    pub fn count<S: AsRef<str>>(&self, atts: &[S]) -> usize {
        self.count_in(None, atts)
    }

    /// `support(p, S)`: subjects observed in `period` carrying every value of `tavs`.
    pub fn support<S: AsRef<str>>(&self, period: &str, tavs: &[S]) -> usize {
        match self.period_index.get(period) {
            Some(&p) => self.count_in(Some(p), tavs),
            None => 0,
        }
    }

    /// Mean, population standard deviation and max of `support(p, tavs)` over all periods.
    ///
    /// `(0, 0, 0)` when there are no periods.
    pub fn period_mean_sd_max<S: AsRef<str>>(&self, tavs: &[S]) -> PeriodStats {
        if self.periods.is_empty() {
            return PeriodStats::default();
        }
        let counts: Vec<usize> = (0..self.periods.len())
            .map(|p| self.count_in(Some(p), tavs))
            .collect();
        let n = counts.len() as f64;
        let mean = counts.iter().sum::<usize>() as f64 / n;
        let var = counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        PeriodStats {
            mean,
            sd: var.sqrt(),
            max: counts.iter().copied().max().unwrap_or(0),
        }
    }

    /// Support of `tavs` in every period, in natural period order.
    pub fn time_series<S: AsRef<str>>(&self, tavs: &[S]) -> Vec<TimeSeriesPoint> {
        let pattern = join_pattern(tavs);
        self.periods
            .iter()
            .enumerate()
            .map(|(p, period)| TimeSeriesPoint {
                period: period.clone(),
                pattern: pattern.clone(),
                count: self.count_in(Some(p), tavs),
            })
            .collect()
    }

    fn count_in<S: AsRef<str>>(&self, period: Option<usize>, atts: &[S]) -> usize {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for att in atts {
            match split_tav(att.as_ref()) {
                Some((attribute, value)) => groups.entry(attribute).or_default().push(value),
                None => return 0,
            }
        }

        let mut unions: Vec<Cow<'_, [u32]>> = Vec::with_capacity(groups.len() + 1);
        if let Some(p) = period {
            unions.push(Cow::Borrowed(&self.period_subjects[p]));
        }
        for (attribute, values) in &groups {
            let union = self.group_union(attribute, values);
            if union.is_empty() {
                return 0;
            }
            unions.push(union);
        }

        if unions.is_empty() {
            return self.n_subjects;
        }

        // Smallest first so the running intersection shrinks fastest
        unions.sort_by_key(|u| u.len());
        let mut acc: Vec<u32> = unions[0].to_vec();
        for other in &unions[1..] {
            if acc.is_empty() {
                return 0;
            }
            acc = intersect_sorted(&acc, other);
        }
        acc.len()
    }

    /// Subjects carrying any of `values` for `attribute`.
    fn group_union<'a>(&'a self, attribute: &str, values: &[&str]) -> Cow<'a, [u32]> {
        let lists: Vec<&'a [u32]> = if attribute == self.period_column {
            values
                .iter()
                .filter_map(|v| self.period_index.get(*v))
                .map(|&p| self.period_subjects[p].as_slice())
                .collect()
        } else {
            values
                .iter()
                .filter_map(|v| {
                    self.tav_subjects
                        .get(&format!("{attribute}{TAV_SEPARATOR}{v}"))
                })
                .map(Vec::as_slice)
                .collect()
        };
        match lists.len() {
            0 => Cow::Owned(Vec::new()),
            1 => Cow::Borrowed(lists[0]),
            _ => Cow::Owned(lists.iter().fold(Vec::new(), |acc, l| union_sorted(&acc, l))),
        }
    }
}

fn push_unique(ids: &mut Vec<u32>, id: u32) {
    if ids.last() != Some(&id) {
        ids.push(id);
    }
}

/// Intersection of two sorted, deduplicated id lists.
pub(crate) fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Union of two sorted, deduplicated id lists.
pub(crate) fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
