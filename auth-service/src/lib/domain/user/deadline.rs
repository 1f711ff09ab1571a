use std::future::Future;
use std::time::Duration;

use crate::user::errors::AuthError;

/// Upper bound applied to every store round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDeadline(Duration);

impl StoreDeadline {
    pub fn new(limit: Duration) -> Self {
        Self(limit)
    }

    pub fn limit(&self) -> Duration {
        self.0
    }

    /// Run `operation`, failing with `Timeout` once the limit elapses.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.0, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(limit = ?self.0, "Store operation timed out");
                Err(AuthError::Timeout(self.0))
            }
        }
    }
}

impl Default for StoreDeadline {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_limit() {
        let deadline = StoreDeadline::new(Duration::from_secs(1));
        let value = deadline.run(async { Ok::<_, AuthError>(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_slow_operation_times_out() {
        let deadline = StoreDeadline::new(Duration::from_millis(10));
        let result = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AuthError>(())
            })
            .await;

        assert!(matches!(result, Err(AuthError::Timeout(_))));
    }
}
