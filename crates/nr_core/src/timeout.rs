use std::future::Future;
use std::time::Duration;
use crate::{Error, Result};

/// Bound an external call. An elapsed deadline becomes `Error::Timeout`
/// naming `what`, so callers handle it like any other failure.
pub async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} did not finish within {:?}",
            what, limit
        ))),
    }
}
