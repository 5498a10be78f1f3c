//! Cancellation scope carried through a unit of work.
//!
//! A [`Scope`] stands in for the request context: the unit of work derives a
//! child scope for every transaction and cancels it on every exit path.
//! Repositories run their I/O through [`Scope::run`] so cancelled calls fail
//! with [`StorageError::Cancelled`] instead of hanging.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StorageError;

/// Hierarchical cancellation handle. Cancelling a scope cancels every scope
/// derived from it.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: watch::Sender<bool>,
    parent: Option<Scope>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Creates a root scope.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Scope>) -> Self {
        let (cancelled, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner { cancelled, parent }),
        }
    }

    /// Derives a child scope that is cancelled together with `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    /// Cancels this scope and all of its descendants.
    pub fn cancel(&self) {
        self.inner.cancelled.send_replace(true);
    }

    /// Returns a guard that cancels this scope when dropped.
    #[must_use = "the scope is cancelled as soon as the guard is dropped"]
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }

    /// Returns `true` if this scope or any ancestor was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.borrow()
            || self.inner.parent.as_ref().is_some_and(Scope::is_cancelled)
    }

    /// Fails fast when the scope is already cancelled.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Cancelled` if the scope was cancelled.
    pub fn ensure_active(&self) -> Result<(), StorageError> {
        if self.is_cancelled() {
            Err(StorageError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once this scope or an ancestor is cancelled.
    pub fn cancelled(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let mut own = self.inner.cancelled.subscribe();
            match &self.inner.parent {
                None => wait_until_set(&mut own).await,
                Some(parent) => {
                    tokio::select! {
                        () = wait_until_set(&mut own) => {}
                        () = parent.cancelled() => {}
                    }
                }
            }
        })
    }

    /// Drives `fut` to completion unless the scope is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Cancelled` if the scope is cancelled before
    /// `fut` completes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = T>,
    {
        self.ensure_active()?;
        tokio::select! {
            biased;
            () = self.cancelled() => Err(StorageError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

async fn wait_until_set(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // The sender lives as long as the scope; this is unreachable in
            // practice but must not spin.
            std::future::pending::<()>().await;
        }
    }
}

/// Cancels the wrapped scope on drop, including during unwinding.
#[derive(Debug)]
pub struct CancelOnDrop(Scope);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
