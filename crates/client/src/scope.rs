//! Request currency for views.
//!
//! A view owns a [`RequestScope`] for as long as it is shown. Responses
//! that resolve after the scope was cancelled come back as
//! [`Currency::Stale`] and must not be applied to the store.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Outcome of a request run inside a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Currency<T> {
    Current(T),
    Stale,
}

impl<T> Currency<T> {
    pub fn current(self) -> Option<T> {
        match self {
            Self::Current(value) => Some(value),
            Self::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }
}

/// Cancellation scope of one mounted view. Dropping it cancels it.
#[derive(Debug)]
pub struct RequestScope {
    view: &'static str,
    cancel: CancellationToken,
}

impl RequestScope {
    pub fn new(view: &'static str) -> Self {
        Self {
            view,
            cancel: CancellationToken::new(),
        }
    }

    /// A nested scope, cancelled together with this one.
    pub fn child(&self, view: &'static str) -> Self {
        Self {
            view,
            cancel: self.cancel.child_token(),
        }
    }

    /// Mark the view unmounted. In-flight requests resolve as stale.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await `fut` unless the scope is cancelled first. A future that
    /// finishes after cancellation is also reported stale.
    pub async fn run<F: Future>(&self, fut: F) -> Currency<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(view = self.view, "Scope cancelled, dropping response");
                Currency::Stale
            }
            output = fut => {
                if self.cancel.is_cancelled() {
                    tracing::debug!(view = self.view, "Response arrived after unmount, dropping");
                    Currency::Stale
                } else {
                    Currency::Current(output)
                }
            }
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
