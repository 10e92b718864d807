/// Largest valid world extent (world units) per axis.
pub const MAX_WORLD_SIZE: f64 = 1.0e6;

/// Upper bound on agents in one run. The compute phase is O(n²) with the
/// linear index, so this mostly guards accidental configs.
pub const MAX_POPULATION: usize = 100_000;

/// Upper bound on the configured step budget.
pub const MAX_STEPS: usize = 10_000_000;

/// Prime multiplier used to derive per-agent RNG streams from a base seed.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Prime multiplier mixing the step index into derived RNG streams, so the
/// same agent gets an independent stream every step.
pub const RNG_STEP_PRIME: u64 = 104_729;

/// Maximum number of snapshot frames a single run may collect.
pub const MAX_SNAPSHOT_FRAMES: usize = 10_000;
