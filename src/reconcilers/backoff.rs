// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-object exponential backoff for failed reconciles.
//!
//! Each failed reconcile of the same object doubles its requeue delay, with
//! ±10% jitter, up to a cap. A successful reconcile resets the object's
//! attempt counter. A requeue requested by a successful reconcile (for
//! example an App waiting for its rollout) never touches the counter.
//!
//! # Retry Schedule
//!
//! With the default policy, consecutive failures requeue after about:
//!
//! 1. 1s
//! 2. 2s
//! 3. 4s
//! 4. 8s
//! 5. ...doubling up to 5 minutes

use crate::constants::{BACKOFF_INITIAL, BACKOFF_JITTER, BACKOFF_MAX, BACKOFF_MULTIPLIER};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Shape of the backoff curve.
#[derive(Clone, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure
    pub initial_interval: Duration,
    /// Upper bound of any delay
    pub max_interval: Duration,
    /// Growth factor between consecutive failures
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: BACKOFF_INITIAL,
            max_interval: BACKOFF_MAX,
            multiplier: BACKOFF_MULTIPLIER,
            randomization_factor: BACKOFF_JITTER,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based), without jitter.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        let max = self.max_interval.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            return self.max_interval;
        }
        Duration::from_secs_f64(secs)
    }

    /// Delay before retry number `attempt`, with jitter applied.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.apply_jitter(self.base_delay(attempt))
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::rng().random_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Failure counters keyed by object.
#[derive(Debug, Default)]
pub struct BackoffTracker {
    policy: BackoffPolicy,
    attempts: Mutex<HashMap<String, u32>>,
}

impl BackoffTracker {
    #[must_use]
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure of `key` and return its requeue delay.
    pub fn next_delay(&self, key: &str) -> Duration {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
            let counter = attempts.entry(key.to_string()).or_insert(0);
            let attempt = *counter;
            *counter = counter.saturating_add(1);
            attempt
        };
        let delay = self.policy.delay(attempt);
        debug!(key, attempt, delay_ms = delay.as_millis(), "Backing off");
        delay
    }

    /// Forget the failures of `key`.
    pub fn reset(&self, key: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Consecutive failures recorded for `key`.
    #[must_use]
    pub fn attempts(&self, key: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }
}
