//! Exponential backoff between step attempts.
//!
//! The delay after failed attempt `n` (1-based) is `base * 2^(n-1)`, capped
//! at `max`. With the defaults this is 1s, 2s, 4s, 8s, 10s, 10s, ...

use std::time::Duration;

use hookflow_types::config::EngineConfig;

/// Backoff schedule for step retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
    max_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.retry_base_delay_ms, config.retry_max_delay_ms)
    }

    /// Delay to wait after `attempt` (1-based) failed, before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2u64.checked_pow(exponent).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_ms.saturating_mul(factor).min(self.max_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_doubles_then_caps() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u64> = (1..=6)
            .map(|a| policy.delay_after(a).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 10_000, 10_000]);
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let policy = BackoffPolicy::new(1_000, 10_000);
        assert_eq!(policy.delay_after(200), Duration::from_millis(10_000));
    }

    #[test]
    fn test_custom_policy() {
        let policy = BackoffPolicy::new(10, 25);
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        assert_eq!(policy.delay_after(3), Duration::from_millis(25));
    }
}
