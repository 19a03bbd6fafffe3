//! Pause/Jitter Scheduler: the randomized inter-phase pause that prevents
//! synchronized bursts when many exchanges start at once.

use std::time::Duration;

use rand::Rng;

/// Draws a pause uniformly from `[T, 2T]` milliseconds where
/// `T = base_ms / 2`, yielding a mean of `1.5T` (i.e. `0.75 * base_ms`).
pub fn jittered_pause(base_ms: u64, rng: &mut impl Rng) -> Duration {
    let half = base_ms / 2;
    let lo = half;
    let hi = half.saturating_mul(2).max(lo);
    let millis = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
    Duration::from_millis(millis)
}
