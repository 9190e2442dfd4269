// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `backoff.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::backoff::{BackoffPolicy, BackoffTracker};
    use std::time::Duration;

    fn no_jitter() -> BackoffPolicy {
        BackoffPolicy {
            randomization_factor: 0.0,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.max_interval, Duration::from_secs(300));
        #[allow(clippy::float_cmp)]
        {
            assert_eq!(policy.multiplier, 2.0);
            assert_eq!(policy.randomization_factor, 0.1);
        }
    }

    #[test]
    fn test_base_delay_doubles() {
        let policy = no_jitter();
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay(2), Duration::from_secs(4));
        assert_eq!(policy.base_delay(5), Duration::from_secs(32));
    }

    #[test]
    fn test_base_delay_is_capped() {
        let policy = no_jitter();
        assert_eq!(policy.base_delay(9), Duration::from_secs(300));
        assert_eq!(policy.base_delay(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = BackoffPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay(2).as_secs_f64();
            assert!((3.6..=4.4).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn test_tracker_grows_per_key() {
        let tracker = BackoffTracker::new(no_jitter());
        assert_eq!(tracker.next_delay("App/ns/a"), Duration::from_secs(1));
        assert_eq!(tracker.next_delay("App/ns/a"), Duration::from_secs(2));
        assert_eq!(tracker.next_delay("App/ns/b"), Duration::from_secs(1));
        assert_eq!(tracker.attempts("App/ns/a"), 2);
    }

    #[test]
    fn test_tracker_reset() {
        let tracker = BackoffTracker::new(no_jitter());
        tracker.next_delay("Project/web");
        tracker.next_delay("Project/web");
        tracker.reset("Project/web");
        assert_eq!(tracker.attempts("Project/web"), 0);
        assert_eq!(tracker.next_delay("Project/web"), Duration::from_secs(1));
    }
}
