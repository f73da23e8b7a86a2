use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_u64(s: &str) -> u64 {
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

/// Maps an id to [0, 1) so per-entity variations (fallback hues, launch angles)
/// stay the same across runs.
pub fn stable_unit(s: &str) -> f32 {
    // top 24 bits fit an f32 mantissa exactly
    (stable_u64(s) >> 40) as f32 / (1u32 << 24) as f32
}
