//! Transfer rate estimation
//!
//! While a transfer runs, the reported rate is held for one sample window
//! and then recomputed from the bytes that arrived during that window. The
//! very first sample and every sample taken after the transfer stopped use
//! the lifetime average instead, with elapsed time floored at one window.
//! A short first window or a final sample after the bytes stopped moving
//! would otherwise report absurd spikes.

use crate::clock::span;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default sampling window
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateEstimator {
    window: Duration,
    bytes_at_last_sample: u64,
    /// `None` until the first sample has been anchored at the start time
    time_of_last_sample: Option<DateTime<Utc>>,
    bytes_per_sec: u64,
}

/// Inputs the estimator needs from its record
#[derive(Debug, Clone, Copy)]
pub struct RateInput {
    pub bytes_read: u64,
    pub start_time: DateTime<Utc>,
    pub time_elapsed: Duration,
    pub terminal: bool,
    pub now: DateTime<Utc>,
}

impl RateEstimator {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            bytes_at_last_sample: 0,
            time_of_last_sample: None,
            bytes_per_sec: 0,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sample the transfer and return the current estimate in bytes/second
    pub fn sample(&mut self, input: RateInput) -> u64 {
        let last = *self.time_of_last_sample.get_or_insert(input.start_time);
        let since_last = span(last, input.now);

        let first_window = last == input.start_time && since_last < self.window;
        if input.terminal || first_window {
            return lifetime_average(input.bytes_read, input.time_elapsed, self.window);
        }

        if since_last >= self.window {
            let delta = input.bytes_read.saturating_sub(self.bytes_at_last_sample);
            self.bytes_per_sec = per_second(delta, since_last);
            self.bytes_at_last_sample = input.bytes_read;
            self.time_of_last_sample = Some(input.now);
        }
        self.bytes_per_sec
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW)
    }
}

fn lifetime_average(bytes_read: u64, elapsed: Duration, floor: Duration) -> u64 {
    per_second(bytes_read, elapsed.max(floor))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn per_second(bytes: u64, over: Duration) -> u64 {
    let secs = over.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (bytes as f64 / secs).round() as u64
}
