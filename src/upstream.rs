//! Guarded calls into external collaborators.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::{Error, UpstreamError};

/// Await `call`, racing it against `cancel` and an optional deadline.
///
/// Cancellation drops the in-flight future and yields `Error::Cancelled`.
/// A collaborator failure or an elapsed deadline yields
/// `Error::UpstreamUnavailable` tagged with `service`.
pub(crate) async fn guarded<T, F>(
    service: &'static str,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                UpstreamError::new(format!("timed out after {}ms", limit.as_millis()))
            })?,
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!(service, "upstream call cancelled");
            Err(Error::Cancelled)
        }
        result = bounded => result.map_err(|e| {
            tracing::warn!(service, error = %e, "upstream call failed");
            Error::UpstreamUnavailable {
                service,
                reason: e.to_string(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_success() {
        let cancel = CancellationToken::new();
        let value = guarded("test", &cancel, None, async { Ok::<_, UpstreamError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_failure_becomes_upstream_unavailable() {
        let cancel = CancellationToken::new();
        let result: Result<(), Error> = guarded("embedding", &cancel, None, async {
            Err(UpstreamError::new("quota exceeded"))
        })
        .await;
        assert!(matches!(
            result,
            Err(Error::UpstreamUnavailable {
                service: "embedding",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_deadline_becomes_upstream_unavailable() {
        let cancel = CancellationToken::new();
        let result: Result<(), Error> = guarded(
            "generation",
            &cancel,
            Some(Duration::from_millis(10)),
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            },
        )
        .await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_pending_call() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<(), Error> = guarded("generation", &cancel, None, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_token_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = guarded("embedding", &cancel, None, async { Ok::<_, UpstreamError>(1) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
