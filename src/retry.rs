//! Retry policies: pure decision logic for resending failed operations.
//!
//! A policy is built once, immutable, and shared across operations; the
//! attempt counter lives in the retry-loop driver, which calls
//! [`RetryPolicy::decide`] with the failed error and the attempt number and
//! owns the actual re-invocation and scheduling.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Outcome of a retry decision. The evaluator never errors; exhaustion is
/// reported to callers by the driver, not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Resend after waiting the given delay.
    Retry(Duration),
    /// Propagate the failure.
    Stop,
}

type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Which error kinds a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Only the listed kinds retry.
    Only,
    /// Every kind except the listed ones retries.
    AllExcept,
}

#[derive(Debug, Clone)]
struct ErrorFilter {
    kinds: HashSet<ErrorKind>,
    mode: FilterMode,
}

impl ErrorFilter {
    fn allows(&self, kind: ErrorKind) -> bool {
        match self.mode {
            FilterMode::Only => self.kinds.contains(&kind),
            FilterMode::AllExcept => !self.kinds.contains(&kind),
        }
    }
}

/// Immutable retry rule: attempt ceiling, delay schedule, error filter.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: DelayFn,
    filter: Option<ErrorFilter>,
}

impl RetryPolicy {
    /// Decide whether the operation that failed with `error` on attempt
    /// `attempt` (1-based) should be resent.
    ///
    /// Checks in order: attempt ceiling, then error filter, then retry with
    /// the scheduled delay.
    pub fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "retry attempts exhausted");
            return RetryDecision::Stop;
        }
        if let Some(filter) = &self.filter {
            if !filter.allows(error.kind()) {
                debug!(kind = ?error.kind(), "error kind excluded from retry");
                return RetryDecision::Stop;
            }
        }
        RetryDecision::Retry((self.delay)(attempt))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Default delay between attempts when none is configured.
const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Builder for [`RetryPolicy`].
pub struct RetryBuilder {
    max_attempts: u32,
    delay: DelayFn,
    filter: Option<ErrorFilter>,
}

impl RetryBuilder {
    /// Allow a single resend.
    pub fn retry_once() -> Self {
        Self::retry_max(2)
    }

    /// Allow up to `max_attempts` attempts in total; the last attempt is
    /// never followed by a retry.
    pub fn retry_max(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Arc::new(|_| DEFAULT_DELAY),
            filter: None,
        }
    }

    /// Retry only when the error kind is one of `kinds`.
    pub fn only_when(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.filter = Some(ErrorFilter {
            kinds: kinds.into_iter().collect(),
            mode: FilterMode::Only,
        });
        self
    }

    /// Retry on every error kind except `kinds`.
    pub fn only_when_not(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.filter = Some(ErrorFilter {
            kinds: kinds.into_iter().collect(),
            mode: FilterMode::AllExcept,
        });
        self
    }

    /// Use a custom delay schedule (pure function of the attempt number).
    pub fn with_delay(mut self, delay: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    /// Wait the same delay before every resend.
    pub fn with_fixed_delay(self, delay: Duration) -> Self {
        self.with_delay(move |_| delay)
    }

    /// Double the base delay per attempt, bounded by `cap`.
    pub fn with_exponential_delay(self, base: Duration, cap: Duration) -> Self {
        self.with_delay(move |attempt| {
            let exp = attempt.saturating_sub(1).min(31);
            base.saturating_mul(1u32 << exp).min(cap)
        })
    }

    pub fn build(self) -> Result<RetryPolicy> {
        if self.max_attempts < 1 {
            return Err(Error::InvalidArgument(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            delay: self.delay,
            filter: self.filter,
        })
    }
}
