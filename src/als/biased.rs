// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

use ndarray::{
    Array1, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut2, Axis, Ix1, ViewRepr, Zip,
};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;

use log::*;

use crate::als::solve::{solve_spd, SolveError};
use crate::als::{
    check_hyperparameters, check_warm_shape, init_features, BiasedAlsConfig, RatingRange,
};
use crate::errors::{Error, Result};
use crate::sparse::CsrMatrix;

/// Optional caller-supplied starting state for [`train_biased`].
///
/// Biases default to zero vectors when not supplied.
#[derive(Clone, Debug, Default)]
pub struct BiasedWarmStart {
    pub user_features: Option<Array2<f32>>,
    pub item_features: Option<Array2<f32>>,
    pub user_bias: Option<Array1<f32>>,
    pub item_bias: Option<Array1<f32>>,
}

/// Parameters of the bias-augmented model `r = mean + bu + bi + x . y`.
#[derive(Clone, Debug)]
pub struct BiasedAlsModel {
    /// Global mean of the observed training ratings, computed internally.
    pub mean: f32,
    pub user_bias: Array1<f32>,
    pub item_bias: Array1<f32>,
    pub user_features: Array2<f32>,
    pub item_features: Array2<f32>,
}

impl BiasedAlsModel {
    pub fn n_users(&self) -> usize {
        self.user_features.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.item_features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.user_features.ncols()
    }

    /// Unclipped model score for a (user, item) pair.
    pub fn score(&self, user: usize, item: usize) -> f32 {
        self.mean
            + self.user_bias[user]
            + self.item_bias[item]
            + self
                .user_features
                .row(user)
                .dot(&self.item_features.row(item))
    }

    /// Predict a rating, clipped to the rating scale.
    pub fn predict(&self, user: usize, item: usize, range: RatingRange) -> f32 {
        range.clip(self.score(user, item))
    }
}

/// Train the bias-augmented explicit-feedback model.
///
/// The global mean is taken from the stored rating values, so `ratings` must
/// be raw (not mean-centered). Each outer iteration runs four passes in fixed
/// order (user bias, item bias, user factors, item factors), every pass using
/// the values written by the passes before it. Users and items with no
/// observed ratings are skipped in every pass that would touch them.
pub fn train_biased(
    ratings: &CsrMatrix,
    config: &BiasedAlsConfig,
    warm: BiasedWarmStart,
) -> Result<BiasedAlsModel> {
    check_hyperparameters(config.n_features, config.reg)?;
    if config.bias_reg < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "bias regularization must be non-negative, got {}",
            config.bias_reg
        )));
    }

    let (m, n) = (ratings.n_rows, ratings.n_cols);
    let mut rng = Pcg64::seed_from_u64(config.seed);

    let mut users = match warm.user_features {
        Some(features) => {
            check_warm_shape("user", &features, m, config.n_features)?;
            features
        }
        None => init_features(&mut rng, m, config.n_features),
    };
    let mut items = match warm.item_features {
        Some(features) => {
            check_warm_shape("item", &features, n, config.n_features)?;
            features
        }
        None => init_features(&mut rng, n, config.n_features),
    };
    let mut user_bias = check_warm_bias("user", warm.user_bias, m)?;
    let mut item_bias = check_warm_bias("item", warm.item_bias, n)?;

    let mean = ratings.value_mean();
    let transposed = ratings.transpose();
    info!(
        "training {}x{} biased ALS model with {} features, mean rating {:.3}",
        m,
        n,
        config.n_features,
        mean
    );

    for iter in 0..config.n_iters {
        bias_half(
            ratings,
            &mut user_bias,
            item_bias.view(),
            users.view(),
            items.view(),
            mean,
            config.bias_reg,
        );
        bias_half(
            &transposed,
            &mut item_bias,
            user_bias.view(),
            items.view(),
            users.view(),
            mean,
            config.bias_reg,
        );
        let du = train_half(
            ratings,
            users.view_mut(),
            items.view(),
            user_bias.view(),
            item_bias.view(),
            mean,
            config.reg,
        )?;
        let di = train_half(
            &transposed,
            items.view_mut(),
            users.view(),
            item_bias.view(),
            user_bias.view(),
            mean,
            config.reg,
        )?;
        debug!(
            "finished iteration {}: |ΔX| = {:.6}, |ΔY| = {:.6}",
            iter + 1,
            du,
            di
        );
    }

    Ok(BiasedAlsModel {
        mean,
        user_bias,
        item_bias,
        user_features: users,
        item_features: items,
    })
}

fn check_warm_bias(name: &str, bias: Option<Array1<f32>>, len: usize) -> Result<Array1<f32>> {
    match bias {
        Some(bias) if bias.len() != len => Err(Error::InvalidArgument(format!(
            "warm-start {} bias has length {}, expected {}",
            name,
            bias.len(),
            len
        ))),
        Some(bias) => Ok(bias),
        None => Ok(Array1::zeros(len)),
    }
}

/// Closed-form regularized update of one bias vector, holding the factors and
/// the opposite bias fixed. Rows with no data keep their previous bias.
fn bias_half(
    matrix: &CsrMatrix,
    this_bias: &mut Array1<f32>,
    other_bias: ArrayView1<f32>,
    this_features: ArrayView2<f32>,
    other_features: ArrayView2<f32>,
    mean: f32,
    bias_reg: f32,
) {
    Zip::indexed(this_bias).par_for_each(|row, bias| {
        let cols = matrix.row_cols(row);
        if cols.is_empty() {
            return;
        }
        let vals = matrix.row_vals(row);
        let features = this_features.row(row);

        let mut acc = 0.0f32;
        for (c, r) in cols.iter().zip(vals) {
            let c = *c as usize;
            acc += r - mean - other_bias[c] - features.dot(&other_features.row(c));
        }
        *bias = acc / (cols.len() as f32 + bias_reg);
    });
}

/// One factor half-step against bias-adjusted residuals. Returns the
/// Frobenius norm of the update delta.
fn train_half(
    matrix: &CsrMatrix,
    mut this: ArrayViewMut2<f32>,
    other: ArrayView2<f32>,
    this_bias: ArrayView1<f32>,
    other_bias: ArrayView1<f32>,
    mean: f32,
    reg: f32,
) -> Result<f32> {
    debug!(
        "beginning biased ALS training half with {} rows",
        this.nrows()
    );
    let frob: f32 = this
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .map(|(i, row)| {
            train_row_solve(matrix, i, row, &other, this_bias[i], &other_bias, mean, reg)
        })
        .try_reduce(|| 0.0, |a, b| Ok(a + b))?;

    Ok(frob.sqrt())
}

#[allow(clippy::too_many_arguments)]
fn train_row_solve(
    matrix: &CsrMatrix,
    row_num: usize,
    mut row_data: ArrayBase<ViewRepr<&mut f32>, Ix1>,
    other: &ArrayView2<f32>,
    row_bias: f32,
    other_bias: &ArrayView1<f32>,
    mean: f32,
    reg: f32,
) -> std::result::Result<f32, SolveError> {
    let cols = matrix.row_cols(row_num);
    if cols.is_empty() {
        return Ok(0.0);
    }
    let vals = matrix.row_vals(row_num);

    let cols: Vec<_> = cols.iter().map(|c| *c as usize).collect();
    // bias-adjusted residuals for this row's observed entries
    let resid: Array1<f32> = cols
        .iter()
        .zip(vals)
        .map(|(c, r)| r - mean - row_bias - other_bias[*c])
        .collect();

    let nd = row_data.len();

    let o_picked = other.select(Axis(0), &cols);

    let mt = o_picked.t();
    let mut mtm = mt.dot(&o_picked);
    for i in 0..nd {
        mtm[[i, i]] += reg;
    }

    let v = mt.dot(&resid);

    let soln = solve_spd(mtm, v)?;

    let deltas = &soln - &row_data;
    row_data.assign(&soln);

    Ok(deltas.dot(&deltas))
}
