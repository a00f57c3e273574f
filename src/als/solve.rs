// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use ndarray::{Array1, Array2};
use nshare::{IntoNalgebra, IntoNdarray1};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("matrix is not positive definite")]
    NotPositive,
}

/// Solve a symmetric positive-definite system `A x = b` by Cholesky
/// factorization.
///
/// `A` must be square and symmetric; only its upper triangle needs to be
/// exact. Fails with [`SolveError::NotPositive`] when the factorization
/// breaks down, which for the regularized Gram matrices built by the trainers
/// can only happen with zero regularization and rank-deficient data.
pub fn solve_spd(a: Array2<f32>, b: Array1<f32>) -> Result<Array1<f32>, SolveError> {
    debug_assert_eq!(a.nrows(), a.ncols());
    debug_assert_eq!(a.nrows(), b.len());

    let a = a.into_nalgebra();
    let b = b.into_nalgebra();
    let chol = a.cholesky().ok_or(SolveError::NotPositive)?;
    Ok(chol.solve(&b).into_ndarray1())
}
