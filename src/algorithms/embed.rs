use tracing::debug;

use crate::algorithms::graph::{PeriodGraph, Vocabulary};
use crate::core::config::PatternConfig;
use crate::core::embedding::Embedding;
use crate::core::sparse::SparseMatrix;

/// Switches applied to the adjacency before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Add the identity to the adjacency.
    pub add_self_loops: bool,
    /// Replace the adjacency by `D^{-1/2} X D^{-1/2}`.
    pub laplacian: bool,
    /// Scale every embedding row to unit L2 norm.
    pub row_normalize: bool,
}

impl From<&PatternConfig> for EncoderOptions {
    fn from(config: &PatternConfig) -> Self {
        Self {
            add_self_loops: config.add_self_loops,
            laplacian: config.laplacian_normalize,
            row_normalize: config.row_normalize_embedding,
        }
    }
}

/// Graph encoder embedding: `Z = X * W` with `W[i][c] = 1 / n_c` when node
/// `i` carries label `c`, where `n_c` is the size of class `c`.
///
/// Unlabelled nodes contribute nothing to any column. The projection is
/// fixed by the label vector, so the same encoder embeds every period into
/// one shared space.
#[derive(Debug, Clone)]
pub struct GraphEncoder {
    labels: Vec<Option<usize>>,
    class_weight: Vec<f64>,
    options: EncoderOptions,
}

impl GraphEncoder {
    pub fn new(labels: Vec<Option<usize>>, n_classes: usize, options: EncoderOptions) -> Self {
        let mut class_size = vec![0usize; n_classes];
        for &c in labels.iter().flatten() {
            class_size[c] += 1;
        }
        let class_weight = class_size
            .into_iter()
            .map(|n| if n > 0 { 1.0 / n as f64 } else { 0.0 })
            .collect();
        Self {
            labels,
            class_weight,
            options,
        }
    }

    /// Encoder labelling every node with its attribute type.
    pub fn from_vocabulary(vocab: &Vocabulary, options: EncoderOptions) -> Self {
        let labels = vocab.labels().iter().map(|&l| Some(l)).collect();
        Self::new(labels, vocab.n_types(), options)
    }

    pub fn n_nodes(&self) -> usize {
        self.labels.len()
    }

    pub fn n_classes(&self) -> usize {
        self.class_weight.len()
    }

    /// Embed one undirected weighted graph over this encoder's nodes.
    pub fn encode<I>(&self, edges: I) -> Embedding
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let n = self.n_nodes();
        let mut adjacency = SparseMatrix::from_undirected_edges(n, edges, self.options.add_self_loops);
        if self.options.laplacian {
            adjacency.symmetric_normalize();
        }

        let mut z = Embedding::zeros(n, self.n_classes());
        for i in 0..n {
            let row = z.row_mut(i);
            for (j, x) in adjacency.row(i) {
                if let Some(c) = self.labels[j] {
                    row[c] += x * self.class_weight[c];
                }
            }
        }
        if self.options.row_normalize {
            z.normalize_rows();
        }
        z
    }

    pub fn encode_graph(&self, graph: &PeriodGraph) -> Embedding {
        self.encode(graph.edges.iter().map(|e| (e.source, e.target, e.weight)))
    }
}

/// Per-period embeddings sharing one node order and column space.
#[derive(Debug, Clone)]
pub struct PeriodEmbeddings {
    pub periods: Vec<String>,
    pub embeddings: Vec<Embedding>,
    /// Element-wise mean of every period embedding.
    pub centroid: Embedding,
}

impl PeriodEmbeddings {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, period: &str) -> Option<&Embedding> {
        self.periods
            .iter()
            .position(|p| p == period)
            .map(|i| &self.embeddings[i])
    }
}

/// Embed every period graph and the centroid over all periods.
pub fn embed_periods(
    graphs: &[PeriodGraph],
    vocab: &Vocabulary,
    config: &PatternConfig,
) -> PeriodEmbeddings {
    let encoder = GraphEncoder::from_vocabulary(vocab, EncoderOptions::from(config));

    #[cfg(feature = "parallel")]
    let embeddings: Vec<Embedding> = {
        use rayon::prelude::*;
        graphs.par_iter().map(|g| encoder.encode_graph(g)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let embeddings: Vec<Embedding> = graphs.iter().map(|g| encoder.encode_graph(g)).collect();

    let centroid = Embedding::mean(&embeddings)
        .unwrap_or_else(|| Embedding::zeros(vocab.len(), vocab.n_types()));

    debug!(
        periods = embeddings.len(),
        nodes = vocab.len(),
        width = vocab.n_types(),
        "embedded period graphs"
    );

    PeriodEmbeddings {
        periods: graphs.iter().map(|g| g.period.clone()).collect(),
        embeddings,
        centroid,
    }
}
