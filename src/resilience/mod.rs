//! # Resilience Module
//!
//! Bounded retry used while establishing bus connections and while sending on
//! the managed bus.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use order_dispatch::resilience::{AttemptError, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new(3, Duration::from_secs(5));
//!
//! let value = policy
//!     .run("connect", |attempt| async move {
//!         if attempt < 2 {
//!             Err(AttemptError::Retryable(format!("attempt {attempt} refused")))
//!         } else {
//!             Ok(attempt)
//!         }
//!     })
//!     .await?;
//! # let _ = value;
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{AttemptError, RetryPolicy};
