//! Atomic context for the Metric context.

use std::sync::Arc;

use async_trait::async_trait;
use healthcoach_core::error::StorageError;
use healthcoach_core::event::SharedEvent;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, UnitOfWork};

use crate::domain::repository::MetricRepository;

/// Transaction handle plus the metric repository built on it.
pub struct MetricContext {
    scope: Scope,
    tx: Arc<dyn Transaction>,
    metrics: Box<dyn MetricRepository>,
}

/// Unit of work running business functions against a [`MetricContext`].
pub type MetricUnitOfWork<D> = UnitOfWork<D, MetricContext>;

impl MetricContext {
    /// Bundles `tx` with the metric repository.
    pub fn new(scope: Scope, tx: impl Transaction + 'static, metrics: impl MetricRepository + 'static) -> Self {
        Self {
            scope,
            tx: Arc::new(tx),
            metrics: Box::new(metrics),
        }
    }

    /// The metric repository.
    #[must_use]
    pub fn metrics(&self) -> &dyn MetricRepository {
        self.metrics.as_ref()
    }
}

#[async_trait]
impl AtomicContext for MetricContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.tx.commit().await
    }

    async fn close(&self) {
        self.metrics.close().await;
    }

    fn collect_events(&self) -> Vec<SharedEvent> {
        self.metrics.collect_events()
    }
}
