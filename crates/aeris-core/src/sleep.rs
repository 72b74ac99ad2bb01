//! Sleep scheduling between wake cycles.
//!
//! Nodes deployed together would otherwise wake and transmit in lockstep and
//! collide on the channel, so every sleep gets a bounded random offset.

use embassy_time::Duration;
use log::debug;
use rand_core::RngCore;

/// Platform deep sleep primitive.
///
/// Deep sleep is equivalent to a reset: on wake execution restarts from boot
/// and no RAM state survives.
pub trait DeepSleep {
    fn sleep_for(&mut self, duration: Duration) -> !;
}

/// `base` plus a uniformly random whole number of seconds in
/// `0..=max_jitter_secs`, saturating at [`Duration::MAX`].
pub fn compute_sleep_duration<R: RngCore>(
    base: Duration,
    max_jitter_secs: u32,
    rng: &mut R,
) -> Duration {
    let jitter = match max_jitter_secs.checked_add(1) {
        Some(span) => rng.next_u32() % span,
        None => rng.next_u32(),
    };
    let jitter = Duration::from_secs(jitter as u64);
    Duration::from_ticks(base.as_ticks().saturating_add(jitter.as_ticks()))
}

/// Hand off to the platform deep sleep. Never returns.
pub fn enter_sleep<P: DeepSleep>(platform: &mut P, duration: Duration) -> ! {
    debug!("Entering deep sleep for {} ms", duration.as_millis());
    platform.sleep_for(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    const BASE: Duration = Duration::from_secs(900);

    #[test]
    fn test_sleep_duration_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            let secs = compute_sleep_duration(BASE, 127, &mut rng).as_secs();
            assert!(secs >= 900, "slept less than base: {secs}");
            assert!(secs <= 900 + 127, "jitter out of bounds: {secs}");
        }
    }

    #[test]
    fn test_sleep_duration_spread() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = [false; 128];

        for _ in 0..2000 {
            let secs = compute_sleep_duration(BASE, 127, &mut rng).as_secs();
            seen[(secs - 900) as usize] = true;
        }

        let distinct = seen.iter().filter(|&&s| s).count();
        assert!(distinct > 100, "only {distinct} distinct sleep lengths");
        assert!(seen[0] || seen[1], "low end of the jitter range never drawn");
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(compute_sleep_duration(BASE, 0, &mut rng), BASE);
    }

    #[test]
    fn test_full_range_jitter_does_not_overflow() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let duration = compute_sleep_duration(BASE, u32::MAX, &mut rng);
        assert!(duration >= BASE);
    }

    #[test]
    fn test_sleep_duration_saturates() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let near_max = Duration::from_ticks(u64::MAX - 1);

        assert_eq!(
            compute_sleep_duration(Duration::MAX, 127, &mut rng),
            Duration::MAX
        );
        assert_eq!(
            compute_sleep_duration(near_max, u32::MAX, &mut rng),
            Duration::MAX
        );
    }
}
