// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use super::CooMatrix;

/// A compressed sparse row matrix of observed ratings.
///
/// Absent entries are missing, not zero. Column indices within each row are
/// sorted ascending (construction invariant relied on by the similarity
/// merge-joins).
#[derive(Clone, Debug)]
pub struct CsrMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    row_ptrs: Vec<usize>,
    col_inds: Vec<i32>,
    values: Vec<f32>,
}

impl CsrMatrix {
    /// Build a CSR matrix from coordinate arrays with a counting sort over
    /// rows, then order each row by column index.
    pub fn from_coo(coo: &CooMatrix, n_rows: usize, n_cols: usize) -> CsrMatrix {
        let nnz = coo.nnz();
        let mut row_ptrs = vec![0usize; n_rows + 1];

        // step 1: count row values, placing counts in row_ptrs[r+1].
        for r in &coo.row {
            row_ptrs[*r as usize + 1] += 1;
        }

        // step 2: convert row counts into row offsets
        for i in 1..=n_rows {
            row_ptrs[i] += row_ptrs[i - 1];
        }

        // step 3: scatter columns and values into place
        let mut col_inds = vec![0i32; nnz];
        let mut values = vec![0.0f32; nnz];
        let mut cursor = row_ptrs.clone();
        for i in 0..nnz {
            let r = coo.row[i] as usize;
            let pos = cursor[r];
            col_inds[pos] = coo.col[i];
            values[pos] = coo.val[i];
            cursor[r] += 1;
        }

        let mut csr = CsrMatrix {
            n_rows,
            n_cols,
            row_ptrs,
            col_inds,
            values,
        };
        csr.sort_rows();
        csr
    }

    /// Get the number of observed values in the matrix.
    pub fn nnz(&self) -> usize {
        self.row_ptrs[self.n_rows]
    }

    /// Get the extent in the underlying arrays for a row in the matrix.
    pub fn extent(&self, row: usize) -> (usize, usize) {
        (self.row_ptrs[row], self.row_ptrs[row + 1])
    }

    /// Get the column indices for a row in the matrix.
    pub fn row_cols(&self, row: usize) -> &[i32] {
        let (start, end) = self.extent(row);
        &self.col_inds[start..end]
    }

    /// Get the values for a row in the matrix.
    pub fn row_vals(&self, row: usize) -> &[f32] {
        let (start, end) = self.extent(row);
        &self.values[start..end]
    }

    /// Iterate a row's observed (column, value) pairs.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.row_cols(row)
            .iter()
            .copied()
            .zip(self.row_vals(row).iter().copied())
    }

    /// Mean of the stored values; 0 for an empty matrix.
    pub fn value_mean(&self) -> f32 {
        if self.values.is_empty() {
            0.0
        } else {
            let sum: f64 = self.values.iter().map(|v| *v as f64).sum();
            (sum / self.values.len() as f64) as f32
        }
    }

    /// Transpose the matrix in a single O(nnz) counting pass.
    ///
    /// The result holds the same triple set compressed by column, giving
    /// contiguous access to each column's observed entries.
    pub fn transpose(&self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptrs = vec![0usize; self.n_cols + 1];

        for c in &self.col_inds {
            row_ptrs[*c as usize + 1] += 1;
        }
        for i in 1..=self.n_cols {
            row_ptrs[i] += row_ptrs[i - 1];
        }

        let mut col_inds = vec![0i32; nnz];
        let mut values = vec![0.0f32; nnz];
        let mut cursor = row_ptrs.clone();
        for row in 0..self.n_rows {
            let (start, end) = self.extent(row);
            for i in start..end {
                let c = self.col_inds[i] as usize;
                let pos = cursor[c];
                col_inds[pos] = row as i32;
                values[pos] = self.values[i];
                cursor[c] += 1;
            }
        }

        // source rows are scanned in order, so each output row is already
        // sorted by column index
        CsrMatrix {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            row_ptrs,
            col_inds,
            values,
        }
    }

    fn sort_rows(&mut self) {
        for row in 0..self.n_rows {
            let (start, end) = self.extent(row);
            if end - start < 2 {
                continue;
            }
            let mut entries: Vec<(i32, f32)> = self.col_inds[start..end]
                .iter()
                .copied()
                .zip(self.values[start..end].iter().copied())
                .collect();
            entries.sort_unstable_by_key(|(c, _)| *c);
            for (offset, (c, v)) in entries.into_iter().enumerate() {
                self.col_inds[start + offset] = c;
                self.values[start + offset] = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CooMatrixBuilder;

    fn sample() -> CsrMatrix {
        let mut bld = CooMatrixBuilder::with_capacity(5);
        bld.add_entry(0, 2, 3.0);
        bld.add_entry(0, 0, 1.0);
        bld.add_entry(2, 1, 4.0);
        bld.add_entry(2, 3, 2.0);
        bld.add_entry(3, 0, 5.0);
        CsrMatrix::from_coo(&bld.finish(), 4, 4)
    }

    #[test]
    fn from_coo_sorts_rows() {
        let m = sample();
        assert_eq!(m.nnz(), 5);
        assert_eq!(m.row_cols(0), &[0, 2]);
        assert_eq!(m.row_vals(0), &[1.0, 3.0]);
        assert_eq!(m.row_cols(1), &[] as &[i32]);
        assert_eq!(m.row_cols(2), &[1, 3]);
        assert_eq!(m.row_cols(3), &[0]);
    }

    #[test]
    fn transpose_preserves_triples() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.n_rows, m.n_cols);
        assert_eq!(t.n_cols, m.n_rows);
        assert_eq!(t.nnz(), m.nnz());

        let mut triples = Vec::new();
        for row in 0..m.n_rows {
            for (c, v) in m.row_entries(row) {
                triples.push((row as i32, c, v));
            }
        }
        let mut transposed = Vec::new();
        for col in 0..t.n_rows {
            for (r, v) in t.row_entries(col) {
                transposed.push((r, col as i32, v));
            }
        }
        triples.sort_by(|a, b| a.partial_cmp(b).unwrap());
        transposed.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(triples, transposed);
    }

    #[test]
    fn value_mean() {
        let m = sample();
        assert_eq!(m.value_mean(), 3.0);

        let empty = CsrMatrix::from_coo(&CooMatrixBuilder::new().finish(), 2, 2);
        assert_eq!(empty.value_mean(), 0.0);
    }
}
