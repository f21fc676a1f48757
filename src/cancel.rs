//! Cancellation token shared by the tasks of one pipeline run.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// A cloneable cancellation signal with an optional deadline.
///
/// Clones share one signal. A [`child`](Self::child) observes its parent's
/// cancellation, but cancelling the child never reaches the parent, so a run
/// can stop its own tasks without touching the caller's token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// True once this token or an ancestor was cancelled, or the deadline
    /// passed.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// A token that fires with this one but can be cancelled on its own.
    /// The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
            deadline: self.deadline,
        }
    }

    /// A token sharing this token's signal that also fires at `deadline`.
    ///
    /// An earlier existing deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            inner: self.inner.clone(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
