//! Retry policy for status polls using Validation.

use crate::retry::context::PollContext;
use crate::retry::violations::RetryViolation;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// How a status request is polled and when it is given up.
///
/// Each attempt sends one status request and then checks for the reply
/// `polls_per_attempt` times, `poll_interval` apart. Attempts repeat until
/// one of the limits is violated. Without limits the poll never gives up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub(crate) max_attempts: Option<usize>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) poll_interval: Duration,
    pub(crate) polls_per_attempt: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(3),
            timeout: Some(Duration::from_secs(5)),
            poll_interval: Duration::from_millis(100),
            polls_per_attempt: 10,
        }
    }
}

impl RetryPolicy {
    /// Check every limit, accumulating ALL violations.
    /// Returns Validation::Success(()) if another attempt may be made.
    pub fn enforce(&self, context: &PollContext) -> Validation<(), NonEmptyVec<RetryViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<RetryViolation>>> = Vec::new();

        if let Some(max) = self.max_attempts {
            let check = if context.attempt > max {
                Validation::fail(RetryViolation::MaxAttemptsExceeded {
                    max,
                    current: context.attempt,
                })
            } else {
                Validation::success(())
            };
            checks.push(check);
        }

        if let Some(timeout) = self.timeout {
            let elapsed = context.elapsed();
            let check = if elapsed > timeout {
                Validation::fail(RetryViolation::TimeoutExceeded { timeout, elapsed })
            } else {
                Validation::success(())
            };
            checks.push(check);
        }

        Validation::all_vec(checks).map(|_| ())
    }

    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn polls_per_attempt(&self) -> usize {
        self.polls_per_attempt
    }

    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some() || self.timeout.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::builder::RetryPolicyBuilder;
    use std::time::Instant;

    fn context(attempt: usize, elapsed: Duration) -> PollContext {
        let started_at = Instant::now();
        PollContext {
            attempt,
            started_at,
            now: started_at + elapsed,
        }
    }

    #[test]
    fn enforcement_accumulates_all_violations() {
        let policy = RetryPolicyBuilder::new()
            .max_attempts(3)
            .timeout(Duration::from_secs(5))
            .build();

        match policy.enforce(&context(5, Duration::from_secs(10))) {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, RetryViolation::MaxAttemptsExceeded { .. })));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, RetryViolation::TimeoutExceeded { .. })));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn enforcement_succeeds_within_limits() {
        let policy = RetryPolicy::default();
        assert!(policy.enforce(&context(1, Duration::ZERO)).is_success());
        assert!(policy.enforce(&context(3, Duration::from_secs(4))).is_success());
    }

    #[test]
    fn max_attempts_enforcement() {
        let policy = RetryPolicyBuilder::new().max_attempts(3).unbounded_time().build();

        assert!(policy.enforce(&context(3, Duration::ZERO)).is_success());

        let result = policy.enforce(&context(4, Duration::ZERO));
        assert!(result.is_failure());
        if let Validation::Failure(errors) = result {
            assert!(errors.iter().any(|e| matches!(
                e,
                RetryViolation::MaxAttemptsExceeded { max: 3, current: 4 }
            )));
        }
    }

    #[test]
    fn timeout_enforcement() {
        let policy = RetryPolicyBuilder::new()
            .unbounded_attempts()
            .timeout(Duration::from_secs(1))
            .build();

        assert!(policy.enforce(&context(100, Duration::from_millis(500))).is_success());

        let result = policy.enforce(&context(1, Duration::from_secs(2)));
        assert!(result.is_failure());
        if let Validation::Failure(errors) = result {
            assert!(errors
                .iter()
                .any(|e| matches!(e, RetryViolation::TimeoutExceeded { .. })));
        }
    }

    #[test]
    fn unbounded_policy_never_gives_up() {
        let policy = RetryPolicy::unbounded();
        assert!(!policy.is_bounded());
        assert!(policy
            .enforce(&context(usize::MAX, Duration::from_secs(3600)))
            .is_success());
    }
}
