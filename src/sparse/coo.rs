// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse coordinate arrays.

/// A sparse matrix as parallel coordinate arrays.
///
/// Used as the staging format during ingestion; convert to [`CsrMatrix`] for
/// training and scoring.
///
/// [`CsrMatrix`]: super::CsrMatrix
pub struct CooMatrix {
    pub row: Vec<i32>,
    pub col: Vec<i32>,
    pub val: Vec<f32>,
}

/// Builder accumulating coordinate entries.
pub struct CooMatrixBuilder {
    row: Vec<i32>,
    col: Vec<i32>,
    val: Vec<f32>,
}

impl CooMatrixBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Initialize a builder with a specified capacity.
    pub fn with_capacity(cap: usize) -> Self {
        CooMatrixBuilder {
            row: Vec::with_capacity(cap),
            col: Vec::with_capacity(cap),
            val: Vec::with_capacity(cap),
        }
    }

    pub fn add_entry(&mut self, row: i32, col: i32, val: f32) {
        self.row.push(row);
        self.col.push(col);
        self.val.push(val);
    }

    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Build the final COO matrix from this builder.
    pub fn finish(self) -> CooMatrix {
        CooMatrix {
            row: self.row,
            col: self.col,
            val: self.val,
        }
    }
}

impl Default for CooMatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CooMatrix {
    pub fn nnz(&self) -> usize {
        self.row.len()
    }
}
