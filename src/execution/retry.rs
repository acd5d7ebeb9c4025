// src/execution/retry.rs
use tokio::time::Duration;

/// Hard upper bound on slippage tolerance (10%).
pub const MAX_SLIPPAGE_BPS: u16 = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after `failed_attempt` (1-based) before the next one.
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let factor = self.backoff_factor.max(1.0).powi(exponent);
        let scaled = self.initial_delay.as_secs_f64() * factor;

        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlippagePolicy {
    pub step_bps: u16,
    pub ceiling_bps: u16,
}

impl Default for SlippagePolicy {
    fn default() -> Self {
        Self {
            step_bps: 200,
            ceiling_bps: MAX_SLIPPAGE_BPS,
        }
    }
}

impl SlippagePolicy {
    pub fn escalate(&self, current_bps: u16) -> u16 {
        let ceiling = self.ceiling_bps.min(MAX_SLIPPAGE_BPS);
        current_bps.max(current_bps.saturating_add(self.step_bps).min(ceiling))
    }
}
