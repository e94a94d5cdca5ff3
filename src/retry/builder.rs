//! Builder API for creating retry policies.

use crate::retry::policy::RetryPolicy;
use std::time::Duration;

/// Builder for creating retry policies, starting from the defaults.
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
        }
    }

    /// Set maximum status requests per poll
    pub fn max_attempts(mut self, n: usize) -> Self {
        self.policy.max_attempts = Some(n);
        self
    }

    /// Keep re-issuing the request regardless of the attempt count
    pub fn unbounded_attempts(mut self) -> Self {
        self.policy.max_attempts = None;
        self
    }

    /// Set overall timeout across attempts
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.policy.timeout = Some(duration);
        self
    }

    /// Keep re-issuing the request regardless of elapsed time
    pub fn unbounded_time(mut self) -> Self {
        self.policy.timeout = None;
        self
    }

    /// Set the wait between two checks for a reply
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.policy.poll_interval = interval;
        self
    }

    /// Set how many checks are made before a request is re-issued
    pub fn polls_per_attempt(mut self, polls: usize) -> Self {
        self.policy.polls_per_attempt = polls;
        self
    }

    /// Build the retry policy
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Policy that re-issues the status request forever.
    pub fn unbounded() -> Self {
        RetryPolicyBuilder::new()
            .unbounded_attempts()
            .unbounded_time()
            .build()
    }
}
