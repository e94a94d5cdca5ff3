//! Bounded retry for status polls.
//!
//! A status request that gets no reply is re-issued, but only while the
//! [`RetryPolicy`] allows it. The policy is checked with Stillwater's
//! `Validation` so that a give-up reports every limit that was hit, not
//! just the first one.
//!
//! # Example
//!
//! ```rust
//! use ict104::retry::RetryPolicyBuilder;
//! use std::time::Duration;
//!
//! let policy = RetryPolicyBuilder::new()
//!     .max_attempts(5)
//!     .timeout(Duration::from_secs(10))
//!     .poll_interval(Duration::from_millis(50))
//!     .build();
//! assert!(policy.is_bounded());
//! ```

pub mod builder;
pub mod context;
pub mod policy;
pub mod violations;

pub use builder::RetryPolicyBuilder;
pub use context::PollContext;
pub use policy::RetryPolicy;
pub use violations::RetryViolation;
