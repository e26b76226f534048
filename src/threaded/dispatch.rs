//! Parallel dispatch of the core kernel over disjoint output blocks.

use log::trace;
use rayon::ThreadPool;
use rayon::prelude::*;

use super::partition;
use crate::blocked::core_kernel::{AccInit, CoreFn};
use crate::config::{Strategy, TileConfig};
use crate::matrix::view::{ColMajor, RowMajor, RowMajorMut};

/// Runs one full product on `pool`.
///
/// Each parallel iteration owns one [`ColumnBlockMut`]; the blocks come from
/// a single `split_columns` call, so no two iterations can write the same
/// element. The reduction-blocked strategy keeps its reduction loop
/// sequential: pass `n + 1` starts only after every block of pass `n` has
/// been stored.
///
/// # Safety
///
/// `kernel` must have been selected for `config` and `config` validated
/// (so its instruction set is available), and the dimensions of `a`, `w`,
/// `res` must satisfy `Dims::check` for `config`.
///
/// [`ColumnBlockMut`]: crate::matrix::view::ColumnBlockMut
pub(crate) unsafe fn dispatch(
    pool: &ThreadPool,
    kernel: CoreFn,
    config: &TileConfig,
    a: ColMajor<'_>,
    w: RowMajor<'_>,
    res: &mut RowMajorMut<'_>,
) {
    let input = a.cols();
    let output = w.cols();
    let i_cache = config.i_cache;

    pool.install(|| match config.strategy {
        Strategy::OutputPartition => {
            let ranges = partition::per_worker(output, config.threads);
            trace!(
                "output-partition: {} slices of {} columns",
                ranges.len(),
                output / config.threads
            );

            res.split_columns(&ranges).into_par_iter().for_each(|mut block| {
                // SAFETY: upheld by the caller.
                unsafe { kernel(a, w, &mut block, 0..input, i_cache, AccInit::Zero) };
            });
        }
        Strategy::ReductionBlocked => {
            let ranges = partition::per_block(output, config.o_cache);

            for (n, i0) in (0..input).step_by(i_cache).enumerate() {
                let init = if n == 0 { AccInit::Zero } else { AccInit::Load };
                trace!(
                    "reduction block {}..{} over {} output blocks",
                    i0,
                    i0 + i_cache,
                    ranges.len()
                );

                res.split_columns(&ranges).into_par_iter().for_each(|mut block| {
                    // SAFETY: upheld by the caller.
                    unsafe { kernel(a, w, &mut block, i0..i0 + i_cache, i_cache, init) };
                });
            }
        }
    });
}
