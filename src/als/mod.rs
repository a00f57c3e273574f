// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Alternating least squares training for explicit-feedback ratings.
//!
//! Two variants are provided: [`train_explicit`] fits plain latent factors on
//! a (typically mean-centered) rating matrix, and [`train_biased`] fits the
//! bias-augmented model `r = mu + bu + bi + x . y` on raw ratings, computing
//! the global mean internally. Both run a fixed number of Gauss-Seidel outer
//! iterations with no early stopping; within a pass, row solves are
//! independent and run in parallel, with the pass boundary as the barrier.

mod biased;
mod explicit;
mod solve;

pub use biased::{train_biased, BiasedAlsModel, BiasedWarmStart};
pub use explicit::{train_explicit, ExplicitAlsModel, WarmStart};
pub use solve::{solve_spd, SolveError};

use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Scale applied to the standard-normal initial factors, so that initial
/// predictions are near zero and do not blow up the first regularized solve.
const INIT_SCALE: f32 = 0.01;

/// Hyperparameters for the plain explicit-feedback trainer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlsConfig {
    /// Latent embedding dimension (must be at least 1).
    pub n_features: usize,
    /// Regularization applied to the factor matrices.
    pub reg: f32,
    /// Number of outer iterations; each runs a user pass then an item pass.
    pub n_iters: usize,
    /// Seed for reproducible factor initialization.
    pub seed: u64,
}

impl Default for AlsConfig {
    fn default() -> Self {
        AlsConfig {
            n_features: 20,
            reg: 0.1,
            n_iters: 10,
            seed: 0,
        }
    }
}

/// Hyperparameters for the bias-augmented trainer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BiasedAlsConfig {
    pub n_features: usize,
    /// Regularization applied to the factor matrices.
    pub reg: f32,
    /// Regularization applied to the bias vectors, acting like a virtual
    /// extra zero-residual observation.
    pub bias_reg: f32,
    pub n_iters: usize,
    pub seed: u64,
}

impl Default for BiasedAlsConfig {
    fn default() -> Self {
        BiasedAlsConfig {
            n_features: 20,
            reg: 0.1,
            bias_reg: 0.1,
            n_iters: 10,
            seed: 0,
        }
    }
}

/// Inclusive clipping bounds for predicted ratings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f32,
    pub max: f32,
}

impl Default for RatingRange {
    /// The 1-5 star scale of the reference data sets.
    fn default() -> Self {
        RatingRange { min: 1.0, max: 5.0 }
    }
}

impl RatingRange {
    pub fn clip(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Draw a small-magnitude standard-normal factor matrix.
pub(crate) fn init_features(rng: &mut Pcg64, n_rows: usize, n_features: usize) -> Array2<f32> {
    Array2::from_shape_simple_fn((n_rows, n_features), || {
        INIT_SCALE * rng.sample::<f32, _>(StandardNormal)
    })
}

/// Validate the hyperparameters shared by both trainers.
pub(crate) fn check_hyperparameters(n_features: usize, reg: f32) -> Result<()> {
    if n_features < 1 {
        return Err(Error::InvalidArgument(
            "feature count must be at least 1".into(),
        ));
    }
    if reg < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "regularization must be non-negative, got {}",
            reg
        )));
    }
    Ok(())
}

/// Validate a warm-start matrix against the expected shape.
pub(crate) fn check_warm_shape(
    name: &str,
    features: &Array2<f32>,
    n_rows: usize,
    n_features: usize,
) -> Result<()> {
    if features.dim() != (n_rows, n_features) {
        return Err(Error::InvalidArgument(format!(
            "warm-start {} features have shape {:?}, expected ({}, {})",
            name,
            features.dim(),
            n_rows,
            n_features
        )));
    }
    Ok(())
}
