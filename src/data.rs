// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! MovieLens-style flat-file ingestion.
//!
//! Rating files are headerless tab-separated `user item rating timestamp`
//! records with 1-based identifiers; item metadata is pipe-delimited with the
//! genre flags in the trailing columns. Files may carry latin-1 text in the
//! fields this loader does not touch, so item metadata is read at the byte
//! level.

use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use log::*;

use crate::errors::{Error, Result};
use crate::sparse::{CooMatrixBuilder, CsrMatrix};

/// One rating record from a tab-separated interaction file.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RatingRecord {
    pub user: u32,
    pub item: u32,
    pub rating: f32,
    pub timestamp: i64,
}

/// A train/test pair over a common (user, item) index space.
pub struct DataSplit {
    pub train: CsrMatrix,
    pub test: CsrMatrix,
    pub n_users: usize,
    pub n_items: usize,
    /// Training-set global mean, present when the split was mean-centered.
    pub mean: Option<f32>,
}

/// Read a tab-separated rating file.
pub fn read_ratings(path: impl AsRef<Path>) -> Result<Vec<RatingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(path.as_ref())?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    debug!(
        "read {} ratings from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

/// Load a train/test split into CSR matrices over the union shape.
///
/// With `mean_centered`, the training-set global mean is subtracted from both
/// splits and returned, for use with the plain factor model; the biased model
/// wants raw values and computes its own mean.
pub fn load_split(
    train_path: impl AsRef<Path>,
    test_path: impl AsRef<Path>,
    mean_centered: bool,
) -> Result<DataSplit> {
    let train = read_ratings(train_path)?;
    let test = read_ratings(test_path)?;

    let max_id = |records: &[RatingRecord]| {
        records.iter().fold((0u32, 0u32), |(u, i), r| {
            (u.max(r.user), i.max(r.item))
        })
    };
    let (train_u, train_i) = max_id(&train);
    let (test_u, test_i) = max_id(&test);
    let n_users = train_u.max(test_u) as usize;
    let n_items = train_i.max(test_i) as usize;

    let mean = if mean_centered {
        if train.is_empty() {
            return Err(Error::Data("cannot center an empty training split".into()));
        }
        let sum: f64 = train.iter().map(|r| r.rating as f64).sum();
        Some((sum / train.len() as f64) as f32)
    } else {
        None
    };
    let shift = mean.unwrap_or(0.0);

    let to_csr = |records: &[RatingRecord]| -> Result<CsrMatrix> {
        let mut bld = CooMatrixBuilder::with_capacity(records.len());
        for r in records {
            if r.user == 0 || r.item == 0 {
                return Err(Error::Data(format!(
                    "identifiers are 1-based, got user {} item {}",
                    r.user, r.item
                )));
            }
            bld.add_entry(r.user as i32 - 1, r.item as i32 - 1, r.rating - shift);
        }
        Ok(CsrMatrix::from_coo(&bld.finish(), n_users, n_items))
    };

    info!(
        "loaded split: {} users, {} items, {} train / {} test ratings",
        n_users,
        n_items,
        train.len(),
        test.len()
    );
    Ok(DataSplit {
        train: to_csr(&train)?,
        test: to_csr(&test)?,
        n_users,
        n_items,
        mean,
    })
}

/// Read the trailing genre-flag columns of a pipe-delimited item metadata
/// file into an (items, genres) 0/1 matrix. Rows are placed by the 1-based
/// item identifier in the first column.
pub fn read_genre_flags(path: impl AsRef<Path>, n_genres: usize) -> Result<Array2<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut rows: Vec<(usize, Vec<f32>)> = Vec::new();
    let mut max_id = 0usize;
    for record in reader.byte_records() {
        let record = record?;
        if record.len() < n_genres + 1 {
            return Err(Error::Data(format!(
                "item record has {} fields, needs an id and {} genre flags",
                record.len(),
                n_genres
            )));
        }
        let id = parse_field(record.get(0), "item id")?;
        if id < 1 {
            return Err(Error::Data(format!("item ids are 1-based, got {}", id)));
        }

        let start = record.len() - n_genres;
        let mut flags = Vec::with_capacity(n_genres);
        for field in (start..record.len()).map(|i| record.get(i)) {
            let flag: u8 = parse_field(field, "genre flag")?;
            flags.push(flag as f32);
        }
        max_id = max_id.max(id);
        rows.push((id, flags));
    }

    let mut genres = Array2::<f32>::zeros((max_id, n_genres));
    for (id, flags) in rows {
        for (g, flag) in flags.into_iter().enumerate() {
            genres[[id - 1, g]] = flag;
        }
    }
    debug!("read genre flags for {} items", genres.nrows());
    Ok(genres)
}

fn parse_field<T: std::str::FromStr>(field: Option<&[u8]>, what: &str) -> Result<T> {
    let bytes = field.ok_or_else(|| Error::Data(format!("missing {}", what)))?;
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::Data(format!("non-ASCII {}", what)))?;
    text.trim()
        .parse()
        .map_err(|_| Error::Data(format!("unparseable {}: {:?}", what, text)))
}
