//! Exponential back-off
use hifitime::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_initial() -> Duration {
    Duration::from_seconds(1.0)
}

const fn default_exponent() -> f64 {
    1.5
}

fn default_maximum() -> Duration {
    Duration::from_seconds(30.0)
}

/// [ExponentialBackOff] delays retries after consecutive failures.
/// The delay is `initial · exponent^count`, capped to `maximum`.
/// It is up to the user to [ExponentialBackOff::advance] it after a failure,
/// and [ExponentialBackOff::reset] it after a success.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExponentialBackOff {
    /// Delay after the first failure
    #[cfg_attr(feature = "serde", serde(default = "default_initial"))]
    pub initial: Duration,
    /// Growth factor
    #[cfg_attr(feature = "serde", serde(default = "default_exponent"))]
    pub exponent: f64,
    /// Maximal delay
    #[cfg_attr(feature = "serde", serde(default = "default_maximum"))]
    pub maximum: Duration,
    #[cfg_attr(feature = "serde", serde(skip))]
    count: i32,
    #[cfg_attr(feature = "serde", serde(skip))]
    current: Option<Duration>,
}

impl Default for ExponentialBackOff {
    fn default() -> Self {
        Self::new(default_initial(), default_exponent(), default_maximum())
    }
}

impl ExponentialBackOff {
    pub fn new(initial: Duration, exponent: f64, maximum: Duration) -> Self {
        Self {
            initial,
            exponent,
            maximum,
            count: 0,
            current: None,
        }
    }

    /// Current delay
    pub fn current(&self) -> Duration {
        self.current.unwrap_or(self.initial)
    }

    /// Grows the delay, until it reaches the maximum
    pub fn advance(&mut self) {
        if self.current() < self.maximum {
            self.count += 1;
            let delay = self.initial.to_seconds() * self.exponent.powi(self.count);
            let delay = Duration::from_seconds(delay);
            self.current = Some(if delay > self.maximum {
                self.maximum
            } else {
                delay
            });
        }
    }

    /// Resets the delay to its initial value
    pub fn reset(&mut self) {
        self.count = 0;
        self.current = None;
    }
}
