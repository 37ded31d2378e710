// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::{config::RateLimitPolicy, errors::RequestError};
use std::time::Duration;
use tracing::{debug, warn};

/// Waits between retries.
///
/// Production code blocks the current thread; tests record the requested durations instead.
pub trait Sleep {
    /// Blocks for `duration`.
    fn sleep(&self, duration: Duration);
}

/// A [`Sleep`] implementation that calls [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleep + ?Sized> Sleep for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// The delays between successive attempts of a rate-limited request.
///
/// Yields one delay fewer than the number of attempts allowed: there is nothing to wait for after
/// the last attempt.
#[derive(Debug)]
pub(crate) struct BackoffIter {
    policy: RateLimitPolicy,
    current_factor: f64,
    remaining_waits: u32,
}

impl BackoffIter {
    const BACKOFF_EXPONENT: f64 = 2.;

    pub(crate) fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            current_factor: 1.,
            remaining_waits: policy.max_attempts().saturating_sub(1),
        }
    }

    fn next_delay(&mut self) -> Duration {
        // Saturates rather than overflowing for very long retry sequences.
        let secs = self.policy.base_delay().as_secs_f64() * self.current_factor;
        let exp_delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        // Stop multiplying the exponential factor if delay is greater than max_delay.
        if let Some(max_delay) = self.policy.max_delay() {
            if exp_delay > max_delay {
                return max_delay;
            }
        }

        self.current_factor *= Self::BACKOFF_EXPONENT;
        exp_delay
    }
}

impl Iterator for BackoffIter {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining_waits > 0 {
            self.remaining_waits -= 1;
            Some(self.next_delay())
        } else {
            None
        }
    }
}

/// Sends requests through an [`HttpTransport`], retrying with exponential backoff while the
/// server responds with `429 Too Many Requests`.
#[derive(Debug)]
pub struct RetryingSender<T, S = ThreadSleep> {
    transport: T,
    policy: RateLimitPolicy,
    sleeper: S,
}

impl<T: HttpTransport> RetryingSender<T> {
    /// Creates a new sender that blocks the current thread between retries.
    pub fn new(transport: T, policy: RateLimitPolicy) -> Self {
        Self::with_sleeper(transport, policy, ThreadSleep)
    }
}

impl<T: HttpTransport, S: Sleep> RetryingSender<T, S> {
    /// Creates a new sender with a custom way to wait between retries.
    pub fn with_sleeper(transport: T, policy: RateLimitPolicy, sleeper: S) -> Self {
        Self {
            transport,
            policy,
            sleeper,
        }
    }

    /// Returns the rate-limit policy in use.
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Sends a request, returning the first successful response.
    ///
    /// Fails with [`RequestError::RateLimitExceeded`] once the policy's attempts are used up,
    /// and immediately with [`RequestError::Http`] for any other non-success status.
    pub fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, RequestError> {
        let request = HttpRequest { method, url, body };
        let mut backoff = BackoffIter::new(self.policy);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(%method, url, attempt, "sending request");

            let response =
                self.transport
                    .send(&request)
                    .map_err(|err| RequestError::Transport {
                        method,
                        url: url.to_owned(),
                        err,
                    })?;

            if response.is_rate_limited() {
                let Some(delay) = backoff.next() else {
                    warn!(%method, url, attempt, "rate limit still exceeded, giving up");
                    return Err(RequestError::RateLimitExceeded {
                        method,
                        url: url.to_owned(),
                        attempts: attempt,
                    });
                };
                warn!(
                    %method,
                    url,
                    attempt,
                    "rate limit exceeded, waiting {:?} before retrying",
                    delay
                );
                self.sleeper.sleep(delay);
                continue;
            }

            if !response.is_success() {
                return Err(RequestError::Http {
                    method,
                    url: url.to_owned(),
                    status: response.status,
                    body: response.body,
                });
            }

            return Ok(response);
        }
    }
}
