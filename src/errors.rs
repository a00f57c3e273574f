// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Error taxonomy for the toolkit.

use thiserror::Error;

use crate::als::SolveError;

/// Errors surfaced by training, scoring, and data loading.
///
/// All failures are deterministic functions of the input, so none of them are
/// retryable.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input: bad shapes, zero feature count, negative
    /// regularization, mismatched warm-start dimensions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A regularized Gram matrix was not positive definite. Training aborts
    /// on the first affected row; callers are expected to use a positive
    /// regularization term, which makes this unreachable in normal use.
    #[error("numerical failure: {0}")]
    Numerical(#[from] SolveError),

    /// A record in an input file did not have the expected layout.
    #[error("malformed data: {0}")]
    Data(String),

    /// File access and parse failures from the rating and metadata readers;
    /// csv wraps the underlying I/O error.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
