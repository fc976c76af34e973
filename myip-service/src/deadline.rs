//! Deadline propagation for downstream calls.

use std::future::Future;

use tokio::time::Instant;

use myip_core::error::{MyipError, Result};

/// Runs `fut` until `deadline`.
///
/// An elapsed deadline drops the future and yields
/// [`MyipError::DeadlineExceeded`] naming `operation`. No retry is attempted.
pub async fn within<T, F>(deadline: Instant, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(MyipError::DeadlineExceeded { operation }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_before_deadline() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let value = within(deadline, "incr", async { Ok::<_, MyipError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let err = within(deadline, "get", async {
            Err::<(), _>(MyipError::BackendUnavailable("down".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, MyipError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_elapsed_deadline() {
        let deadline = Instant::now() + Duration::from_millis(20);
        let err = within(deadline, "registry lookup", std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MyipError::DeadlineExceeded { operation: "registry lookup" }
        ));
    }
}
