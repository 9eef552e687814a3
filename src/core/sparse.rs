/// Square sparse matrix in compressed sparse row (CSR) layout.
///
/// Column indices within a row are strictly increasing; duplicate entries
/// supplied at construction are summed.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Build a symmetric matrix from undirected weighted edges.
    ///
    /// Each `(i, j, w)` with `i != j` is stored at both `(i, j)` and `(j, i)`;
    /// a self-loop `(i, i, w)` is stored once. With `add_identity`, 1 is added
    /// to every diagonal entry.
    pub fn from_undirected_edges<I>(n: usize, edges: I, add_identity: bool) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (i, j, w) in edges {
            debug_assert!(i < n && j < n, "edge ({i}, {j}) out of bounds for n={n}");
            rows[i].push((j, w));
            if i != j {
                rows[j].push((i, w));
            }
        }
        if add_identity {
            for (i, row) in rows.iter_mut().enumerate() {
                row.push((i, 1.0));
            }
        }

        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for mut row in rows {
            row.sort_by_key(|&(col, _)| col);
            for (col, w) in row {
                if indices.len() > *indptr.last().unwrap_or(&0) && indices.last() == Some(&col) {
                    if let Some(last) = data.last_mut() {
                        *last += w;
                    }
                } else {
                    indices.push(col);
                    data.push(w);
                }
            }
            indptr.push(indices.len());
        }

        Self {
            n,
            indptr,
            indices,
            data,
        }
    }

    /// Number of rows (and columns).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored entries.
    #[cfg(test)]
    pub(crate) fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored `(column, value)` entries of row `i`, in column order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.indptr[i]..self.indptr[i + 1];
        self.indices[range.clone()]
            .iter()
            .copied()
            .zip(self.data[range].iter().copied())
    }

    /// Value at `(i, j)`, zero if not stored.
    #[cfg(test)]
    pub(crate) fn get(&self, i: usize, j: usize) -> f64 {
        let range = self.indptr[i]..self.indptr[i + 1];
        match self.indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.data[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Sum of every row (the weighted degree vector).
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.row(i).map(|(_, w)| w).sum()).collect()
    }

    /// Symmetric normalization `X ← D^{-1/2} X D^{-1/2}`.
    ///
    /// Rows with zero degree have no inverse; their entries become zero.
    pub fn symmetric_normalize(&mut self) {
        let inv_sqrt: Vec<f64> = self
            .row_sums()
            .into_iter()
            .map(|d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
            .collect();
        for i in 0..self.n {
            for k in self.indptr[i]..self.indptr[i + 1] {
                self.data[k] *= inv_sqrt[i] * inv_sqrt[self.indices[k]];
            }
        }
    }
}
