//! Politeness pacing
//!
//! A randomized pause is taken after every listing expansion and every detail
//! fetch so requests never arrive in bursts.

use crate::config::DelayConfig;
use rand::Rng;
use std::time::Duration;

/// Random delay source bounded by `[min, max]`
#[derive(Debug, Clone)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &DelayConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_ms),
            Duration::from_millis(config.max_ms),
        )
    }

    /// A pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Picks the next delay
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(millis as u64)
    }

    /// Sleeps for a random delay
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!("Pausing {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
