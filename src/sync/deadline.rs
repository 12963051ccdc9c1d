//! Timeout Race: wait for a future up to a bound, then stop waiting.
//!
//! The raced future is dropped on expiry, not aborted on the wire; whatever
//! it would have produced is discarded.

use std::future::Future;
use std::time::Duration;

use crate::remote::{RemoteError, RemoteResult, bound_ms};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bounded<T> {
    Completed(T),
    TimedOut,
}

impl<T> Bounded<T> {
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

impl<T> Bounded<RemoteResult<T>> {
    /// Fold expiry into the remote error taxonomy.
    pub fn into_remote(self, limit: Duration) -> RemoteResult<T> {
        match self {
            Self::Completed(result) => result,
            Self::TimedOut => Err(RemoteError::timeout(bound_ms(limit))),
        }
    }
}

pub async fn bounded<F>(limit: Duration, fut: F) -> Bounded<F::Output>
where
    F: Future,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => Bounded::Completed(value),
        Err(_elapsed) => Bounded::TimedOut,
    }
}
