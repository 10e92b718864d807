use crate::constants::{RNG_DERIVATION_PRIME, RNG_STEP_PRIME};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive the RNG an agent draws from during one step.
///
/// Streams depend only on `(base_seed, step, agent_id)`, never on evaluation
/// order or thread scheduling, so parallel and sequential updates draw the
/// same numbers.
pub fn derive_agent_rng(base_seed: u64, step: usize, agent_id: u32) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed
            .wrapping_add((step as u64).wrapping_mul(RNG_STEP_PRIME))
            .wrapping_add(agent_id as u64 * RNG_DERIVATION_PRIME),
    )
}
