use std::time::Duration;

use anyhow::{Error, Result};
use log::warn;

const BASE_WAIT: Duration = Duration::from_secs(60);
const MAX_WAIT: Duration = Duration::from_secs(900);
const MAX_ESCALATIONS: u32 = 5;

// The helper program surfaces whatever the API told it, so throttling is
// recognized by text rather than by a structured code.
const RATE_LIMIT_MARKERS: [&str; 7] = [
    "429",
    "too many requests",
    "rate limit",
    "rate_limit",
    "exceeded",
    "quota",
    "limit exceeded",
];

pub fn is_rate_limited(err: &Error) -> bool {
    let text = format!("{err:#}").to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| text.contains(marker))
}

// Something that can pause the current thread. Waits go through the stop
// signal so a pending interrupt cuts them short; wait() reports false when
// that happened.
pub trait Waiter {
    fn wait(&self, duration: Duration) -> bool;
}

// Retry policy shared by all requests of one removal phase. Each failed
// execution escalates the rate limit wait (60s, 120s, 240s, ... capped at
// 15 minutes) and any success resets it.
pub struct Backoff<'a> {
    request_delay: Duration,
    retries: u32,
    waiter: &'a dyn Waiter,
}

impl<'a> Backoff<'a> {
    pub fn new(request_delay: Duration, waiter: &'a dyn Waiter) -> Self {
        Backoff {
            request_delay,
            retries: 0,
            waiter,
        }
    }

    pub fn execute<T>(&mut self, label: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        match op() {
            Ok(value) => {
                self.retries = 0;
                Ok(value)
            }
            Err(err) => {
                let wait = if is_rate_limited(&err) {
                    let wait = self.rate_limit_wait();
                    warn!(
                        "Rate limited while trying to {label} (attempt {}); waiting {}s",
                        self.retries + 1,
                        wait.as_secs()
                    );
                    self.retries += 1;
                    wait
                } else {
                    let wait = self.request_delay.saturating_mul(3);
                    warn!(
                        "Could not {label} ({err:#}); retrying in {}s",
                        wait.as_secs()
                    );
                    wait
                };

                if !self.waiter.wait(wait) {
                    return Err(err);
                }

                match op() {
                    Ok(value) => {
                        self.retries = 0;
                        Ok(value)
                    }
                    Err(err) => Err(err.context(format!("Could not {label} after 2 attempts"))),
                }
            }
        }
    }

    fn rate_limit_wait(&self) -> Duration {
        let exponent = self.retries.min(MAX_ESCALATIONS);
        BASE_WAIT.saturating_mul(1 << exponent).min(MAX_WAIT)
    }
}
