//! Retry policy for the streamed reply.
//!
//! Stateless: the generator tracks the attempt count and asks the policy
//! whether to go again and how long to wait first.

use std::time::Duration;

use moneykeeper_types::config::RetrySettings;
use moneykeeper_types::llm::{GenerationFailure, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first stream.
    pub max_retries: u32,
    pub base: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    /// Whether another stream attempt is allowed after `error` on attempt
    /// `attempt` (1-based). Safety blocks and fatal errors never retry.
    pub fn should_retry(&self, attempt: u32, error: &LlmError) -> bool {
        error.failure_kind() == GenerationFailure::Transient && attempt <= self.max_retries
    }

    /// Wait before retry number `retry` (1-based): `min(base * 2^retry, max)`.
    ///
    /// A rate-limit hint from the provider wins when it is longer, still capped at `max`.
    pub fn backoff(&self, retry: u32, error: &LlmError) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        let exponential = self.base.saturating_mul(factor).min(self.max);
        match error {
            LlmError::RateLimited {
                retry_after_ms: Some(ms),
            } => exponential.max(Duration::from_millis(*ms)).min(self.max),
            _ => exponential,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_stream_retries,
            base: Duration::from_millis(settings.base_backoff_ms),
            max: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> LlmError {
        LlmError::Stream("connection reset".to_string())
    }

    #[test]
    fn test_default_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1, &transient()), Duration::from_secs(1));
        assert_eq!(policy.backoff(2, &transient()), Duration::from_secs(2));
        assert_eq!(policy.backoff(3, &transient()), Duration::from_secs(4));
        assert_eq!(policy.backoff(4, &transient()), Duration::from_secs(5));
        assert_eq!(policy.backoff(40, &transient()), Duration::from_secs(5));
    }

    #[test]
    fn test_should_retry_respects_limit() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, &transient()));
        assert!(policy.should_retry(2, &transient()));
        assert!(!policy.should_retry(3, &transient()));
    }

    #[test]
    fn test_safety_block_and_fatal_never_retry() {
        let policy = RetryPolicy::default();
        let blocked = LlmError::SafetyBlocked {
            reason: "SAFETY".to_string(),
        };
        assert!(!policy.should_retry(1, &blocked));
        assert!(!policy.should_retry(1, &LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_rate_limit_hint_is_capped() {
        let policy = RetryPolicy::default();
        let limited = LlmError::RateLimited {
            retry_after_ms: Some(3_000),
        };
        assert_eq!(policy.backoff(1, &limited), Duration::from_secs(3));
        let long = LlmError::RateLimited {
            retry_after_ms: Some(60_000),
        };
        assert_eq!(policy.backoff(1, &long), Duration::from_secs(5));
    }
}
