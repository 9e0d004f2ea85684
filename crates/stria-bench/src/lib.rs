//! Deterministic workloads for benchmarking Stria containers.
//!
//! - [`particle_rows`]: plain-data rows usable in both standard and raw mode
//! - [`tagged_rows`]: rows with a heap-owning field, standard mode only
//! - [`filled_particles`]: a populated container ready for read benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stria_arena::{Admits, StoragePolicy};
use stria_vec::MultiVec;

/// Position, velocity magnitude, and id of one particle.
pub type Particle = (f32, f32, f32, u32);

/// Generate `n` particles from `seed`. Same seed, same rows.
pub fn particle_rows(n: usize, seed: u64) -> Vec<Particle> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            (
                rng.random_range(-100.0f32..100.0),
                rng.random_range(-100.0f32..100.0),
                rng.random::<f32>(),
                i as u32,
            )
        })
        .collect()
}

/// Generate `n` id/label rows from `seed`. Labels are 4 to 16 lowercase
/// letters.
pub fn tagged_rows(n: usize, seed: u64) -> Vec<(u32, String)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let len = rng.random_range(4..=16);
            let label = (0..len)
                .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
                .collect();
            (i as u32, label)
        })
        .collect()
}

/// A container holding [`particle_rows`]`(n, seed)`.
pub fn filled_particles<P>(n: usize, seed: u64) -> MultiVec<Particle, P>
where
    P: StoragePolicy<Size = usize>,
    Particle: Admits<P::Init>,
{
    particle_rows(n, seed).into_iter().collect()
}
