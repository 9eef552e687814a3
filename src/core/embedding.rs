/// Dense `n x k` node embedding in row-major order.
///
/// Row `i` is the vector of node `i`; column `c` is the mean-weighted edge
/// mass node `i` sends to attribute type `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    n: usize,
    k: usize,
    data: Vec<f64>,
}

impl Embedding {
    pub fn zeros(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            data: vec![0.0; n * k],
        }
    }

    /// Wrap row-major data. Returns `None` if `data.len() != n * k`.
    #[cfg(test)]
    pub(crate) fn from_rows(n: usize, k: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == n * k).then_some(Self { n, k, data })
    }

    /// Number of rows (nodes).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Embedding width (attribute types).
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.k..(i + 1) * self.k]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.k..(i + 1) * self.k]
    }

    /// Euclidean norm of row `i`.
    pub fn norm(&self, i: usize) -> f64 {
        self.row(i).iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Scale every non-zero row to unit L2 norm. Zero rows stay zero.
    pub fn normalize_rows(&mut self) {
        for i in 0..self.n {
            let norm = self.norm(i);
            if norm > 0.0 {
                for x in self.row_mut(i) {
                    *x /= norm;
                }
            }
        }
    }

    /// Add another embedding of the same shape element-wise.
    pub fn accumulate(&mut self, other: &Embedding) {
        debug_assert_eq!((self.n, self.k), (other.n, other.k));
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// Element-wise mean of `embeddings`, or `None` when the slice is empty.
    pub fn mean(embeddings: &[Embedding]) -> Option<Self> {
        let (first, rest) = embeddings.split_first()?;
        let mut sum = first.clone();
        for e in rest {
            sum.accumulate(e);
        }
        let count = embeddings.len() as f64;
        for x in &mut sum.data {
            *x /= count;
        }
        Some(sum)
    }
}
