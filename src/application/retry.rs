//! Bounded retry of optimistic read-modify-commit cycles.

use std::future::Future;

use tracing::warn;

use crate::error::{Error, ErrorCategory, Result};

/// Retry policy for version conflicts.
#[derive(Debug, Clone, Copy)]
pub struct ConflictRetry {
    /// Extra attempts after the first one.
    pub max_retries: u32,
}

impl Default for ConflictRetry {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl ConflictRetry {
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Run `attempt` until it succeeds, fails with a non-conflict error, or
    /// the retry budget is spent.
    ///
    /// Each attempt must re-read whatever it modifies; the closure is called
    /// afresh every time.
    ///
    /// # Errors
    /// The last conflict once retries are exhausted, or the first
    /// non-conflict error.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut tries = 0;
        loop {
            match attempt().await {
                Err(err) if is_conflict(&err) && tries < self.max_retries => {
                    tries += 1;
                    warn!(operation, attempt = tries, error = %err, "Version conflict, retrying");
                    tokio::task::yield_now().await;
                }
                other => return other,
            }
        }
    }
}

fn is_conflict(err: &Error) -> bool {
    err.category() == ErrorCategory::ConcurrencyConflict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Entity;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_conflicts() {
        let calls = AtomicU32::new(0);
        let result = ConflictRetry::new(3)
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::conflict(Entity::Trade, "t1"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = ConflictRetry::new(2)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::conflict(Entity::Trade, "t1"))
            })
            .await;

        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = ConflictRetry::default()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::not_found(Entity::Trade, "t1"))
            })
            .await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
