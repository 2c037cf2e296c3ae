//! Bounded retry combinator.

use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times, waiting `wait` between attempts.
///
/// Returns the first success, or the last error once attempts are
/// exhausted. The wait is only taken between attempts, so total sleep for
/// `n` attempts is `(n - 1) * wait`.
///
/// # Errors
///
/// Returns the error from the final attempt.
pub async fn retry_bounded<T, E, F, Fut>(
    attempts: u32,
    wait: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, max = attempts, error = %e, "Attempt failed, retrying");
                attempt += 1;
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                tracing::warn!(attempts, error = %e, "Max retries exceeded");
                return Err(e);
            }
        }
    }
}
