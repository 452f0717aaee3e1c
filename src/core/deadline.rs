use crate::core::error::QuoteError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default budget for the call to the quoting provider.
pub const FETCH_BUDGET: Duration = Duration::from_millis(200);

/// Default budget for a single store operation.
pub const STORE_BUDGET: Duration = Duration::from_millis(10);

/// Runs an async operation under a deadline
///
/// # Parameters
/// - `operation`: Name reported in the `Timeout` error and in the log
/// - `budget`: Time the operation may take
/// - `future`: The operation itself
///
/// # Returns
/// The operation's own result, or `QuoteError::Timeout` once the budget is
/// spent. On expiry the future is dropped, which releases whatever it held.
pub async fn with_deadline<F, T>(
    operation: &'static str,
    budget: Duration,
    future: F,
) -> Result<T, QuoteError>
where
    F: Future<Output = Result<T, QuoteError>>,
{
    match tokio::time::timeout(budget, future).await {
        Ok(result) => result,
        Err(_) => {
            debug!(
                operation,
                budget_ms = budget.as_millis() as u64,
                "Deadline exceeded"
            );
            Err(QuoteError::Timeout { operation, budget })
        }
    }
}
