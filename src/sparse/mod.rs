// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Sparse matrix support.
//!
//! Ratings are stored compressed by row ([`CsrMatrix`]); a one-time
//! [`CsrMatrix::transpose`] produces the column-compressed view used for item
//! updates. Both views always describe the same set of observed
//! (row, column, value) triples.

mod coo;
mod csr;

pub use coo::{CooMatrix, CooMatrixBuilder};
pub use csr::CsrMatrix;
