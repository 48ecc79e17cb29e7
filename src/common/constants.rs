/// Probe steps a plain probing table takes before giving up on an insert.
pub(crate) const DEFAULT_MAX_PROBING_STEPS: usize = 500;

/// Displacements a cuckoo insert may trigger before the table is marked failed.
pub(crate) const DEFAULT_MAX_KICK_CYCLE_LENGTH: usize = 50_000;

/// Seed of the kicking policies' victim selection RNG.
pub(crate) const DEFAULT_KICKING_SEED: u64 = 0x5eed_c0c0_5eed_c0c0;
