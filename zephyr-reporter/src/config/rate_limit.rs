// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Deserialize;
use std::time::Duration;

/// How requests are retried while the server responds with `429 Too Many Requests`.
///
/// The wait before attempt `n + 1` is `base_delay * 2^(n - 1)`, optionally capped by
/// `max_delay`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "RateLimitPolicyDeserialize")]
pub struct RateLimitPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Option<Duration>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: None,
        }
    }
}

impl RateLimitPolicy {
    /// The default number of attempts, including the first one.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// The default wait after the first rate-limited attempt.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Creates a new policy, validating its parameters.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Option<Duration>,
    ) -> Result<Self, &'static str> {
        // Count can't be zero.
        if max_attempts == 0 {
            return Err("`max_attempts` cannot be zero");
        }
        // Delay can't be zero.
        if base_delay.is_zero() {
            return Err("`base_delay` cannot be zero");
        }
        // Max delay can't be less than delay.
        if max_delay.is_some_and(|max_delay| max_delay < base_delay) {
            return Err("`max_delay` cannot be less than `base_delay`");
        }

        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
        })
    }

    /// The total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The wait after the first rate-limited attempt.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The upper bound on a single wait, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RateLimitPolicyDeserialize {
    max_attempts: u32,
    #[serde(with = "humantime_serde")]
    base_delay: Duration,
    #[serde(default, with = "humantime_serde")]
    max_delay: Option<Duration>,
}

impl TryFrom<RateLimitPolicyDeserialize> for RateLimitPolicy {
    type Error = &'static str;

    fn try_from(value: RateLimitPolicyDeserialize) -> Result<Self, Self::Error> {
        Self::new(value.max_attempts, value.base_delay, value.max_delay)
    }
}
