use crate::config::RetrySettings;
use crate::errors::LlembaError;
use crate::model::RawAnswer;
use crate::providers::{CompletionBackend, CompletionRequest};
use std::collections::HashSet;

/// Calls the backend until it answers.
///
/// Transport failures are retried after a fixed delay, forever unless
/// `max_transport_attempts` is set. Any other error is returned immediately.
pub(crate) async fn call_with_retry(
    backend: &dyn CompletionBackend,
    request: &CompletionRequest,
    retry: &RetrySettings,
) -> Result<Vec<RawAnswer>, LlembaError> {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match backend.complete(request).await {
            Ok(answers) => return Ok(answers),
            Err(e) if e.is_retryable() => {
                if let Some(max) = retry.max_transport_attempts {
                    if attempt >= max {
                        tracing::error!(
                            provider = backend.provider_name(),
                            attempts = attempt,
                            error = %e,
                            "giving up after transport failures"
                        );
                        return Err(e);
                    }
                }
                tracing::warn!(
                    provider = backend.provider_name(),
                    attempt,
                    error = %e,
                    "request failed, retrying"
                );
                tokio::time::sleep(retry.delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Drops exact duplicates (same text and finish reason), keeping first-seen order.
pub fn dedup_answers(mut answers: Vec<RawAnswer>) -> Vec<RawAnswer> {
    let mut seen = HashSet::new();
    answers.retain(|a| seen.insert(a.clone()));
    answers
}
