//! Deterministic bucketing
//!
//! Maps a (user, experiment) pair to one of 1000 buckets via a stable
//! 64-bit FNV-1a hash, then walks the variation table's cumulative weight
//! boundaries to pick the slot. The same inputs always land in the same
//! bucket, across processes and restarts, as long as the weight table is
//! unchanged - that is the whole determinism contract of the engine.

use crate::experiment::Variation;
use fnv::FnvHasher;
use std::hash::Hasher;

/// Number of buckets the hash space folds into.
///
/// 1000 buckets give 0.1% allocation granularity against integer weights
/// in `0..=100` (each weight point spans exactly 10 buckets).
pub const BUCKET_COUNT: u64 = 1000;

/// Fold `userId:experimentId` into a bucket in `[0, 1000)`.
///
/// FNV-1a over the composite key. Stable across platforms and releases;
/// changing this function reshuffles every uncached user.
#[must_use]
pub fn stable_bucket(user_id: &str, experiment_id: &str) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(user_id.as_bytes());
    hasher.write(b":");
    hasher.write(experiment_id.as_bytes());
    #[allow(clippy::cast_possible_truncation)]
    let bucket = (hasher.finish() % BUCKET_COUNT) as u32;
    bucket
}

/// Pick the variation owning the given bucket.
///
/// Walks variations in their defined order, accumulating `weight x 10` as a
/// cumulative boundary; the first variation whose boundary exceeds the
/// bucket wins. The last variation is the rounding fallback, so a non-empty
/// table always yields exactly one variation. Returns `None` only for an
/// empty table.
#[must_use]
pub fn pick_variation(variations: &[Variation], bucket: u32) -> Option<&Variation> {
    let mut boundary = 0u32;
    for variation in variations {
        boundary += variation.weight() * 10;
        if bucket < boundary {
            return Some(variation);
        }
    }
    variations.last()
}
