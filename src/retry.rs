use std::time::Duration;

/// Base delay for exponential backoff.
pub const BASE_DELAY: Duration = Duration::from_millis(1_000);
/// Upper bound for any single backoff delay.
pub const MAX_DELAY: Duration = Duration::from_millis(30_000);
/// HTTP status codes that are retried while the budget allows.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry budget and backoff schedule for one client.
///
/// Only `max_retries` is configurable; the delays are fixed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    max_retries: usize,
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Total attempts for one logical call, initial attempt included.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUS_CODES.contains(&status)
    }

    /// Computes the wait before the retry following attempt `attempt` (0-indexed).
    ///
    /// A positive `retry_after_secs` is honored exactly, capped at [`MAX_DELAY`].
    /// Otherwise the delay is drawn uniformly from
    /// `[0, min(BASE_DELAY * 2^attempt, MAX_DELAY)]` (full jitter).
    pub fn delay(
        &self,
        attempt: usize,
        retry_after_secs: Option<u64>,
        rng: &mut fastrand::Rng,
    ) -> Duration {
        let max_ms = MAX_DELAY.as_millis() as u64;

        if let Some(secs) = retry_after_secs.filter(|secs| *secs > 0) {
            return Duration::from_millis(secs.saturating_mul(1_000).min(max_ms));
        }

        let exp = attempt.min(16) as u32;
        let multiplier = 1u64 << exp;
        let capped_ms = (BASE_DELAY.as_millis() as u64)
            .saturating_mul(multiplier)
            .min(max_ms);

        Duration::from_millis(rng.u64(0..=capped_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
