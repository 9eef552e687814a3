use std::collections::{BTreeMap, HashMap};

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::normalize::ObservationSet;
use crate::core::config::PatternConfig;
use crate::core::tav::tav_type;

/// The global node set: every typed attribute value in ascending string
/// order, labelled with the index of its attribute type.
///
/// Fixed before any period is processed, so node indices and the label
/// vector are identical for every period graph and every embedding.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tavs: Vec<String>,
    index: HashMap<String, usize>,
    types: Vec<String>,
    labels: Vec<usize>,
}

impl Vocabulary {
    pub fn from_observations(observations: &ObservationSet) -> Self {
        Self::from_tavs(observations.tavs())
    }

    /// Build from an arbitrary list of typed attribute values (sorted and deduplicated here).
    pub fn from_tavs(mut tavs: Vec<String>) -> Self {
        tavs.sort_unstable();
        tavs.dedup();
        let mut types: Vec<String> = tavs.iter().map(|t| tav_type(t).to_string()).collect();
        types.sort_unstable();
        types.dedup();
        let type_index: HashMap<&str, usize> = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();
        let labels = tavs.iter().map(|t| type_index[tav_type(t)]).collect();
        let index = tavs.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self {
            tavs,
            index,
            types,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.tavs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tavs.is_empty()
    }

    pub fn tav(&self, node: usize) -> &str {
        &self.tavs[node]
    }

    pub fn tavs(&self) -> &[String] {
        &self.tavs
    }

    pub fn index_of(&self, tav: &str) -> Option<usize> {
        self.index.get(tav).copied()
    }

    /// Attribute type index of every node.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn label(&self, node: usize) -> usize {
        self.labels[node]
    }

    /// Distinct attribute types, sorted. Their count is the embedding width.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn n_types(&self) -> usize {
        self.types.len()
    }
}

/// An undirected weighted edge with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// The complete weighted co-occurrence graph of one period.
#[derive(Debug, Clone)]
pub struct PeriodGraph {
    pub period: String,
    pub n_nodes: usize,
    /// Every unordered node pair exactly once, ordered by `(source, target)`.
    pub edges: Vec<WeightedEdge>,
    /// Number of edges backed by at least one co-occurrence.
    pub observed_edges: usize,
    /// Records carrying two or more attribute values.
    pub multi_attribute_records: usize,
    /// Nodes of the largest connected component over observed edges, sorted.
    pub lcc: Vec<usize>,
}

impl PeriodGraph {
    /// A period with no co-occurrence carries no signal; its graph is floor-only.
    pub fn is_empty_signal(&self) -> bool {
        self.observed_edges == 0
    }
}

/// Build the graph of one period from its records.
///
/// `records` holds, per `(subject, period)` record, the sorted node indices
/// observed for it. Edge weights are co-occurrence counts, or
/// `p_ab * log2(p_ab / (p_a * p_b))` with mutual information enabled,
/// min-max normalized into `[floor, 1]`. Every unobserved pair gets
/// `missing_edge_weight`, which is strictly below the floor.
pub fn build_period_graph(
    period: &str,
    records: &[Vec<usize>],
    n_nodes: usize,
    config: &PatternConfig,
) -> PeriodGraph {
    let mut edge_counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut node_counts = vec![0usize; n_nodes];
    let mut multi_attribute_records = 0;

    for nodes in records {
        if nodes.len() >= 2 {
            multi_attribute_records += 1;
        }
        for (i, &a) in nodes.iter().enumerate() {
            node_counts[a] += 1;
            for &b in &nodes[i + 1..] {
                *edge_counts.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
    }

    let raw = raw_weights(&edge_counts, &node_counts, config.mutual_information);
    let observed = normalize_weights(&raw, config.floor_weight());
    let lcc = largest_component(n_nodes, observed.keys().copied());

    let missing = config.missing_edge_weight();
    let mut edges = Vec::with_capacity(n_nodes * n_nodes.saturating_sub(1) / 2);
    for source in 0..n_nodes {
        for target in source + 1..n_nodes {
            let weight = observed.get(&(source, target)).copied().unwrap_or(missing);
            edges.push(WeightedEdge {
                source,
                target,
                weight,
            });
        }
    }

    debug!(
        period,
        records = records.len(),
        multi_attribute_records,
        observed_edges = observed.len(),
        lcc = lcc.len(),
        "built period graph"
    );

    PeriodGraph {
        period: period.to_string(),
        n_nodes,
        edges,
        observed_edges: observed.len(),
        multi_attribute_records,
        lcc,
    }
}

/// Build one graph per period, in natural period order.
///
/// Periods are independent once the vocabulary is fixed; with the
/// `parallel` feature they are built on the rayon pool.
pub fn build_period_graphs(
    observations: &ObservationSet,
    vocab: &Vocabulary,
    config: &PatternConfig,
) -> Vec<PeriodGraph> {
    let records = group_records(observations, vocab);
    let n = vocab.len();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        observations
            .periods
            .par_iter()
            .zip(records.par_iter())
            .map(|(period, recs)| build_period_graph(period, recs, n, config))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        observations
            .periods
            .iter()
            .zip(records.iter())
            .map(|(period, recs)| build_period_graph(period, recs, n, config))
            .collect()
    }
}

/// Nodes present in the LCC of every period, sorted.
pub fn dynamic_lcc(graphs: &[PeriodGraph]) -> Vec<usize> {
    let Some((first, rest)) = graphs.split_first() else {
        return Vec::new();
    };
    rest.iter().fold(first.lcc.clone(), |acc, g| {
        acc.into_iter()
            .filter(|n| g.lcc.binary_search(n).is_ok())
            .collect()
    })
}

/// Per period (in `observations.periods` order), the node lists of its records.
fn group_records(observations: &ObservationSet, vocab: &Vocabulary) -> Vec<Vec<Vec<usize>>> {
    let period_pos: HashMap<&str, usize> = observations
        .periods
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    let mut out: Vec<Vec<Vec<usize>>> = vec![Vec::new(); observations.periods.len()];

    let mut current: Option<(&str, &str)> = None;
    for obs in &observations.observations {
        let Some(node) = vocab.index_of(&obs.tav) else {
            continue;
        };
        let Some(&p) = period_pos.get(obs.period.as_str()) else {
            continue;
        };
        let key = (obs.subject.as_str(), obs.period.as_str());
        if current != Some(key) {
            out[p].push(Vec::new());
            current = Some(key);
        }
        if let Some(record) = out[p].last_mut() {
            record.push(node);
        }
    }
    out
}

fn raw_weights(
    edge_counts: &BTreeMap<(usize, usize), usize>,
    node_counts: &[usize],
    mutual_information: bool,
) -> BTreeMap<(usize, usize), f64> {
    if !mutual_information {
        return edge_counts
            .iter()
            .map(|(&edge, &c)| (edge, c as f64))
            .collect();
    }

    let edge_total: usize = edge_counts.values().sum();
    let node_total: usize = node_counts.iter().sum();
    if edge_total == 0 || node_total == 0 {
        return BTreeMap::new();
    }
    let edge_total = edge_total as f64;
    let node_total = node_total as f64;

    edge_counts
        .iter()
        .filter_map(|(&(a, b), &c)| {
            let p_ab = c as f64 / edge_total;
            let p_a = node_counts[a] as f64 / node_total;
            let p_b = node_counts[b] as f64 / node_total;
            let ratio = p_ab / (p_a * p_b);
            // log2(0) has no finite weight
            (ratio > 0.0 && ratio.is_finite()).then(|| ((a, b), p_ab * ratio.log2()))
        })
        .collect()
}

/// Min-max scale raw weights into `[floor, 1]`.
///
/// When every raw weight is equal they all map to 1.
fn normalize_weights(
    raw: &BTreeMap<(usize, usize), f64>,
    floor: f64,
) -> BTreeMap<(usize, usize), f64> {
    let (min, max) = raw
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
            (lo.min(w), hi.max(w))
        });
    let span = max - min;
    raw.iter()
        .map(|(&edge, &w)| {
            let scaled = if span > 0.0 {
                floor + (w - min) / span * (1.0 - floor)
            } else {
                1.0
            };
            (edge, scaled)
        })
        .collect()
}

/// Sorted node set of the largest connected component.
///
/// Ties go to the component holding the smallest node index.
fn largest_component(n_nodes: usize, edges: impl Iterator<Item = (usize, usize)>) -> Vec<usize> {
    if n_nodes == 0 {
        return Vec::new();
    }
    let mut uf = UnionFind::<usize>::new(n_nodes);
    for (a, b) in edges {
        uf.union(a, b);
    }
    let labels = uf.into_labeling();

    // label → (size, smallest member)
    let mut components: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (node, &label) in labels.iter().enumerate() {
        let entry = components.entry(label).or_insert((0, node));
        entry.0 += 1;
    }
    let best = components
        .iter()
        .max_by(|(_, (sa, fa)), (_, (sb, fb))| sa.cmp(sb).then(fb.cmp(fa)))
        .map(|(&label, _)| label);

    match best {
        Some(best) => (0..n_nodes).filter(|&n| labels[n] == best).collect(),
        None => Vec::new(),
    }
}
