//! Random matrix initialization for benchmarks and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::aligned::AlignedBuf;
use crate::error::Result;

/// Distribution to draw matrix entries from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Init {
    /// Uniform magnitude in `[0, 1)` with a random sign.
    #[default]
    SignedUniform,
    /// Mean 0, standard deviation 1.
    StandardNormal,
}

pub fn fill<R: Rng + ?Sized>(buf: &mut [f32], init: Init, rng: &mut R) {
    match init {
        Init::SignedUniform => {
            for x in buf.iter_mut() {
                let v: f32 = rng.gen_range(0.0..1.0);
                *x = if rng.gen_bool(0.5) { v } else { -v };
            }
        }
        Init::StandardNormal => {
            for x in buf.iter_mut() {
                *x = rng.sample(rand_distr::StandardNormal);
            }
        }
    }
}

/// Aligned buffer of `len` values drawn from `init`, reproducible by `seed`.
pub fn random_matrix(len: usize, init: Init, seed: u64) -> Result<AlignedBuf> {
    let mut buf = AlignedBuf::zeroed(len)?;
    let mut rng = StdRng::seed_from_u64(seed);
    fill(&mut buf, init, &mut rng);
    Ok(buf)
}
