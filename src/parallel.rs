// This file is part of Recslab.
// Licensed under the MIT license, see LICENSE.md for details.
// SPDX-License-Identifier: MIT

//! Thread-pool configuration for the parallel training passes.

use log::*;
use rayon::{current_num_threads, ThreadPoolBuilder};

use crate::errors::Result;

/// Initialize the global worker pool with a fixed thread count.
///
/// Training works without this; rayon then sizes the pool from the available
/// parallelism. Fails if a global pool has already been built.
pub fn init_pool(n_threads: usize) -> Result<()> {
    debug!("initializing thread pool with {} threads", n_threads);
    ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()?;
    Ok(())
}

/// Number of threads in the current worker pool.
pub fn thread_count() -> usize {
    current_num_threads()
}
