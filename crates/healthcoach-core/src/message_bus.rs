//! In-process message bus for post-commit event dispatch.
//!
//! Handlers are registered on a [`HandlerRegistry`] before the bus starts;
//! once started the routing table is immutable. Every published event becomes
//! one job per handler registered for its exact type. Jobs run on a bounded
//! pool of worker tasks, so `publish_events` waits for queue capacity but
//! never for a handler to finish.
//!
//! Delivery is best-effort: jobs live only in memory, failing handlers are
//! logged and not retried.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::event::SharedEvent;
use crate::unit_of_work::EventPublisher;

/// Error returned by an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Wraps any displayable error.
    pub fn new(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// Errors raised while handing events to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The bus no longer accepts events.
    #[error("message bus is closed")]
    Closed,

    /// Queued jobs did not finish within the drain timeout.
    #[error("message bus did not drain in time")]
    DrainTimeout,
}

/// Asynchronous reaction to a domain event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the bus and otherwise ignored.
    async fn handle(&self, event: SharedEvent) -> Result<(), HandlerError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(SharedEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, event: SharedEvent) -> Result<(), HandlerError> {
        (self.0)(event).await
    }
}

/// Routing table from event type to handlers, in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers of `event_type`.
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> &mut Self {
        self.handlers
            .entry(event_type.into())
            .or_default()
            .push(handler);
        self
    }

    /// Registers an async closure as a handler.
    pub fn register_fn<F, Fut>(&mut self, event_type: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(SharedEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register(event_type, Arc::new(FnHandler(handler)))
    }

    /// Number of handlers registered for `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Number of worker tasks running handlers.
    pub workers: usize,
    /// Number of jobs that may wait for a worker.
    pub queue_capacity: usize,
    /// Upper bound on how long `close` waits for queued jobs.
    pub drain_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

struct Dispatch {
    event: SharedEvent,
    handler: Arc<dyn EventHandler>,
}

/// Started message bus.
pub struct MessageBus {
    handlers: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    sender: Mutex<Option<mpsc::Sender<Dispatch>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    drain_timeout: Duration,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("event_types", &self.handlers.len())
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

impl MessageBus {
    /// Freezes `registry` and spawns the worker pool. Must be called from
    /// within a Tokio runtime.
    #[must_use]
    pub fn start(registry: HandlerRegistry, config: BusConfig) -> Self {
        let (sender, receiver) = mpsc::channel::<Dispatch>(config.queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| tokio::spawn(run_worker(worker, Arc::clone(&receiver))))
            .collect();

        info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            "message bus started"
        );

        Self {
            handlers: registry.handlers,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            drain_timeout: config.drain_timeout,
        }
    }

    /// Stops accepting events and waits for queued and running jobs.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::DrainTimeout` if the jobs outlive the drain
    /// timeout. They keep running detached.
    pub async fn close(&self) -> Result<(), PublishError> {
        drop(self.sender.lock().unwrap_or_else(PoisonError::into_inner).take());
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));

        if tokio::time::timeout(self.drain_timeout, join_all(workers))
            .await
            .is_err()
        {
            warn!(timeout = ?self.drain_timeout, "message bus drain timed out");
            return Err(PublishError::DrainTimeout);
        }
        info!("message bus drained");
        Ok(())
    }

    /// Returns `true` once `close` was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[async_trait]
impl EventPublisher for MessageBus {
    async fn publish_events(&self, events: Vec<SharedEvent>) -> Result<(), PublishError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PublishError::Closed)?;

        for event in events {
            let Some(handlers) = self.handlers.get(event.event_type()) else {
                debug!(event_type = event.event_type(), "no handlers registered");
                continue;
            };
            for handler in handlers {
                let job = Dispatch {
                    event: Arc::clone(&event),
                    handler: Arc::clone(handler),
                };
                sender.send(job).await.map_err(|_| PublishError::Closed)?;
            }
        }
        Ok(())
    }
}

async fn run_worker(worker: usize, receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Dispatch>>>) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(Dispatch { event, handler }) = job else {
            debug!(worker, "message bus worker stopping");
            return;
        };

        let event_type = event.event_type();
        match AssertUnwindSafe(handler.handle(Arc::clone(&event)))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => debug!(worker, event_type, "event handled"),
            Ok(Err(err)) => error!(worker, event_type, error = %err, "event handler failed"),
            Err(_) => error!(worker, event_type, error = "panic", "event handler panicked"),
        }
    }
}
