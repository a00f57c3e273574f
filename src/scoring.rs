// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Dense score matrices and top-k recommendation lists.
//!
//! Scores for already-observed training items are excluded from the
//! recommendation lists. Top-k ordering is fully deterministic: descending
//! score, ties broken toward the lower item index.

use std::cmp::Reverse;

use ndarray::{Array2, Axis};
use ordered_float::NotNan;
use rayon::prelude::*;

use crate::als::{BiasedAlsModel, ExplicitAlsModel};
use crate::errors::{Error, Result};
use crate::sparse::CsrMatrix;

/// Dense collaborative-filtering scores `mean + bu + bi + X Yᵗ`.
pub fn cf_score_matrix(model: &BiasedAlsModel) -> Array2<f32> {
    let mut scores = model.user_features.dot(&model.item_features.t());
    scores += model.mean;
    scores += &model.user_bias.view().insert_axis(Axis(1));
    scores += &model.item_bias;
    scores
}

/// Dense factor scores `mean + X Yᵗ` for the plain model; `mean` is the
/// value the training matrix was centered with (0 for raw ratings).
pub fn factor_score_matrix(model: &ExplicitAlsModel, mean: f32) -> Array2<f32> {
    let mut scores = model.user_features.dot(&model.item_features.t());
    scores += mean;
    scores
}

/// Blend collaborative and content scores: `alpha * cf + (1 - alpha) * content`.
pub fn blend(cf: &Array2<f32>, content: &Array2<f32>, alpha: f32) -> Result<Array2<f32>> {
    if cf.dim() != content.dim() {
        return Err(Error::InvalidArgument(format!(
            "score shapes differ: {:?} vs {:?}",
            cf.dim(),
            content.dim()
        )));
    }
    Ok(alpha * cf + (1.0 - alpha) * content)
}

/// Per-user top-k item indices by descending score, skipping the user's
/// observed training items. Lists are shorter than `k` when fewer than `k`
/// unseen items exist.
pub fn top_k(scores: &Array2<f32>, seen: &CsrMatrix, k: usize) -> Result<Vec<Vec<i32>>> {
    if scores.dim() != (seen.n_rows, seen.n_cols) {
        return Err(Error::InvalidArgument(format!(
            "score matrix is {:?} but training matrix is ({}, {})",
            scores.dim(),
            seen.n_rows,
            seen.n_cols
        )));
    }

    let rows: Vec<Vec<i32>> = scores
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(user, row)| {
            let mut mask = vec![false; seen.n_cols];
            for c in seen.row_cols(user) {
                mask[*c as usize] = true;
            }

            let mut ranked: Vec<(Reverse<NotNan<f32>>, i32)> = row
                .iter()
                .enumerate()
                .filter(|(i, _)| !mask[*i])
                .filter_map(|(i, s)| NotNan::new(*s).ok().map(|s| (Reverse(s), i as i32)))
                .collect();
            ranked.sort_unstable();
            ranked.truncate(k);
            ranked.into_iter().map(|(_, i)| i).collect()
        })
        .collect();

    Ok(rows)
}
