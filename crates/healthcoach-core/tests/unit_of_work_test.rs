//! Lifecycle tests for `UnitOfWork::atomic` against recording doubles.

use std::any::Any;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use healthcoach_core::aggregate::{AggregateRoot, EventOutbox};
use healthcoach_core::error::StorageError;
use healthcoach_core::event::DomainEvent;
use healthcoach_core::message_bus::PublishError;
use healthcoach_core::scope::Scope;
use healthcoach_core::storage::Transaction;
use healthcoach_core::unit_of_work::{AtomicContext, AtomicError, EventPublisher, UnitOfWork};
use healthcoach_test_support::{
    Operation, OperationLog, RecordingContext, RecordingDatabase, RecordingPublisher,
    RecordingTransaction,
};
use thiserror::Error;

#[derive(Debug)]
struct Tallied(u32);

impl DomainEvent for Tallied {
    fn event_type(&self) -> &'static str {
        "tally.incremented"
    }

    fn published_at(&self) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "n": self.0 })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Tally {
    id: &'static str,
    outbox: EventOutbox,
}

impl Tally {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            outbox: EventOutbox::new(),
        }
    }
}

impl AggregateRoot for Tally {
    fn aggregate_id(&self) -> String {
        self.id.to_owned()
    }

    fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}

#[derive(Debug, Error)]
#[error("tally rejected")]
struct Rejected;

struct Fixture {
    log: OperationLog,
    publisher: Arc<RecordingPublisher>,
    uow: UnitOfWork<RecordingDatabase, RecordingContext>,
}

fn fixture_with(db: RecordingDatabase, publisher: RecordingPublisher, log: OperationLog) -> Fixture {
    let publisher = Arc::new(publisher);
    let factory_log = log.clone();
    let uow = UnitOfWork::new(
        db,
        move |scope, tx| Ok(RecordingContext::new(scope, tx, factory_log.clone())),
        publisher.clone(),
    );
    Fixture {
        log,
        publisher,
        uow,
    }
}

fn fixture() -> Fixture {
    let log = OperationLog::new();
    fixture_with(
        RecordingDatabase::new(log.clone()),
        RecordingPublisher::new(log.clone()),
        log,
    )
}

#[tokio::test]
async fn test_commit_precedes_collection_and_dispatch() {
    // Arrange
    let f = fixture();

    // Act
    let result = f
        .uow
        .atomic(&Scope::new(), |ctx| async move {
            let tally = Tally::new("t-1");
            ctx.track(&tally);
            tally.push_event(Tallied(1));
            tally.push_event(Tallied(2));
            ctx.commit().await?;
            Ok::<_, StorageError>(7)
        })
        .await;

    // Assert
    assert_eq!(result.unwrap(), 7);
    assert_eq!(
        f.log.operations(),
        vec![
            Operation::Begin,
            Operation::Commit,
            Operation::CollectEvents,
            Operation::Close,
            Operation::Publish(2),
        ]
    );
    assert_eq!(
        f.publisher.published_types(),
        vec!["tally.incremented", "tally.incremented"]
    );
}

#[tokio::test]
async fn test_business_error_rolls_back_without_dispatch() {
    // Arrange
    let f = fixture();

    // Act
    let result = f
        .uow
        .atomic(&Scope::new(), |ctx| async move {
            let tally = Tally::new("t-1");
            ctx.track(&tally);
            tally.push_event(Tallied(1));
            Err::<(), _>(Rejected)
        })
        .await;

    // Assert
    let err = result.unwrap_err();
    assert!(err.is_rollback());
    assert_eq!(err.to_string(), "state rollback: tally rejected");
    assert!(matches!(err, AtomicError::Business(Rejected)));
    assert_eq!(
        f.log.operations(),
        vec![Operation::Begin, Operation::Rollback, Operation::Close]
    );
    assert!(f.publisher.published().is_empty());
}

#[tokio::test]
async fn test_begin_failure_surfaces_as_storage_error() {
    let log = OperationLog::new();
    let f = fixture_with(
        RecordingDatabase::failing(log.clone()),
        RecordingPublisher::new(log.clone()),
        log,
    );
    let ran = Arc::new(Mutex::new(false));
    let ran_inner = ran.clone();

    let result = f
        .uow
        .atomic(&Scope::new(), |_ctx| async move {
            *ran_inner.lock().unwrap() = true;
            Ok::<_, Rejected>(())
        })
        .await;

    assert!(matches!(result, Err(AtomicError::Storage(StorageError::Backend(_)))));
    assert!(!*ran.lock().unwrap());
    assert!(f.log.operations().is_empty());
}

#[tokio::test]
async fn test_context_construction_failure_rolls_back() {
    // Arrange
    let log = OperationLog::new();
    let publisher = Arc::new(RecordingPublisher::new(log.clone()));
    let uow: UnitOfWork<RecordingDatabase, RecordingContext> = UnitOfWork::new(
        RecordingDatabase::new(log.clone()),
        |_scope, _tx| Err(StorageError::Backend("no repositories".into())),
        publisher,
    );

    // Act
    let result = uow
        .atomic(&Scope::new(), |_ctx| async { Ok::<_, Rejected>(()) })
        .await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Storage(_))));
    assert_eq!(log.operations(), vec![Operation::Begin, Operation::Rollback]);
}

#[tokio::test]
async fn test_panic_rolls_back_closes_and_propagates() {
    // Arrange
    let f = fixture();
    let log = f.log.clone();
    let publisher = f.publisher.clone();

    // Act
    let joined = tokio::spawn(async move {
        f.uow
            .atomic(&Scope::new(), |ctx| async move {
                let tally = Tally::new("t-1");
                ctx.track(&tally);
                tally.push_event(Tallied(1));
                if tally.aggregate_id() == "t-1" {
                    panic!("business logic exploded");
                }
                Ok::<_, Rejected>(())
            })
            .await
    })
    .await;

    // Assert
    let err = joined.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(
        log.operations(),
        vec![Operation::Begin, Operation::Rollback, Operation::Close]
    );
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_success_without_commit_releases_transaction_and_skips_dispatch() {
    let f = fixture();

    let result = f
        .uow
        .atomic(&Scope::new(), |ctx| async move {
            let tally = Tally::new("t-1");
            ctx.track(&tally);
            tally.push_event(Tallied(1));
            Ok::<_, Rejected>("read only")
        })
        .await;

    assert_eq!(result.unwrap(), "read only");
    assert_eq!(
        f.log.operations(),
        vec![Operation::Begin, Operation::Rollback, Operation::Close]
    );
    assert!(f.publisher.published().is_empty());
}

#[tokio::test]
async fn test_publish_failure_keeps_committed_state() {
    // Arrange
    let log = OperationLog::new();
    let f = fixture_with(
        RecordingDatabase::new(log.clone()),
        RecordingPublisher::failing(log.clone()),
        log,
    );

    // Act
    let result = f
        .uow
        .atomic(&Scope::new(), |ctx| async move {
            let tally = Tally::new("t-1");
            ctx.track(&tally);
            tally.push_event(Tallied(1));
            ctx.commit().await?;
            Ok::<_, StorageError>(())
        })
        .await;

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(err, AtomicError::Publish(PublishError::Closed)));
    assert!(!err.is_rollback());
    assert!(f.log.contains(Operation::Commit));
    assert!(!f.log.contains(Operation::Rollback));
}

#[tokio::test]
async fn test_events_of_unsaved_aggregates_are_dispatched() {
    let f = fixture();

    f.uow
        .atomic(&Scope::new(), |ctx| async move {
            let loaded = Tally::new("loaded-only");
            ctx.track(&loaded);
            loaded.push_event(Tallied(42));
            ctx.commit().await?;
            Ok::<_, StorageError>(())
        })
        .await
        .unwrap();

    let published = f.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].downcast_ref::<Tallied>().unwrap().0, 42);
}

#[tokio::test]
async fn test_context_scope_is_cancelled_after_exit() {
    let f = fixture();
    let parent = Scope::new();

    let scope = f
        .uow
        .atomic(&parent, |ctx| async move {
            assert!(!ctx.scope().is_cancelled());
            Ok::<_, Rejected>(ctx.scope().clone())
        })
        .await
        .unwrap();

    assert!(scope.is_cancelled());
    assert!(!parent.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_parent_is_visible_inside_context() {
    let f = fixture();
    let parent = Scope::new();
    parent.cancel();

    let result = f
        .uow
        .atomic(&parent, |ctx| async move {
            ctx.scope().ensure_active()?;
            Ok::<_, StorageError>(())
        })
        .await;

    assert!(matches!(
        result,
        Err(AtomicError::Business(StorageError::Cancelled))
    ));
}

fn nested_uow(
    tx: RecordingTransaction,
    log: &OperationLog,
    publisher: Arc<dyn EventPublisher>,
) -> UnitOfWork<RecordingTransaction, RecordingContext> {
    let inner_log = log.clone();
    UnitOfWork::new(
        tx,
        move |scope, tx| Ok(RecordingContext::new(scope, tx, inner_log.clone())),
        publisher,
    )
}

#[tokio::test]
async fn test_nested_unit_of_work_shares_the_outer_transaction() {
    // Arrange
    let log = OperationLog::new();
    let publisher = Arc::new(RecordingPublisher::new(log.clone()));
    let outer_tx = RecordingTransaction::new(log.clone());
    let nested = nested_uow(outer_tx.clone(), &log, publisher);

    // Act
    let inner_owner = nested
        .atomic(&Scope::new(), |ctx| async move {
            ctx.commit().await?;
            Ok::<_, StorageError>(ctx.transaction().is_owner())
        })
        .await
        .unwrap();

    // Assert
    assert!(!inner_owner);
    assert!(outer_tx.is_active());
    assert!(!log.contains(Operation::Begin));
    assert!(!log.contains(Operation::Commit));
    assert!(!log.contains(Operation::Publish(0)));
    outer_tx.commit().await.unwrap();
    assert!(log.contains(Operation::Commit));
}

#[tokio::test]
async fn test_nested_read_only_call_leaves_outer_transaction_open() {
    let log = OperationLog::new();
    let publisher = Arc::new(RecordingPublisher::new(log.clone()));
    let outer_tx = RecordingTransaction::new(log.clone());
    let nested = nested_uow(outer_tx.clone(), &log, publisher);

    let result = nested
        .atomic(&Scope::new(), |_ctx| async move { Ok::<_, Rejected>(7) })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert!(outer_tx.is_active());
    assert!(!log.contains(Operation::Rollback));
    assert_eq!(outer_tx.commit().await, Ok(()));
}

#[tokio::test]
async fn test_nested_business_error_leaves_outer_transaction_open() {
    // Arrange
    let log = OperationLog::new();
    let publisher = Arc::new(RecordingPublisher::new(log.clone()));
    let outer_tx = RecordingTransaction::new(log.clone());
    let nested = nested_uow(outer_tx.clone(), &log, publisher);

    // Act
    let result = nested
        .atomic(&Scope::new(), |_ctx| async move { Err::<(), _>(Rejected) })
        .await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Business(Rejected))));
    assert!(outer_tx.is_active());
    assert!(!log.contains(Operation::Rollback));
    assert_eq!(outer_tx.commit().await, Ok(()));
}

#[tokio::test]
async fn test_nested_events_are_published_with_the_owner_commit() {
    // Arrange
    let f = fixture();
    let sink: Arc<dyn EventPublisher> = f.publisher.clone();
    let log = f.log.clone();

    // Act
    f.uow
        .atomic(&Scope::new(), |ctx| async move {
            let nested = nested_uow(ctx.transaction().clone(), &log, sink);
            nested
                .atomic(ctx.scope(), |inner| async move {
                    let joined = Tally::new("inner");
                    inner.track(&joined);
                    joined.push_event(Tallied(1));
                    inner.commit().await?;
                    Ok::<_, StorageError>(())
                })
                .await
                .map_err(|_| StorageError::TransactionClosed)?;
            assert!(log.operations().iter().all(|op| !matches!(op, Operation::Publish(_))));

            let outer = Tally::new("outer");
            ctx.track(&outer);
            outer.push_event(Tallied(2));
            ctx.commit().await?;
            Ok::<_, StorageError>(())
        })
        .await
        .unwrap();

    // Assert
    let published: Vec<u32> = f
        .publisher
        .published()
        .iter()
        .map(|e| e.downcast_ref::<Tallied>().unwrap().0)
        .collect();
    assert_eq!(published, vec![2, 1]);
    assert!(f.log.contains(Operation::Publish(2)));
}

#[tokio::test]
async fn test_owner_rollback_drops_nested_events() {
    // Arrange
    let f = fixture();
    let sink: Arc<dyn EventPublisher> = f.publisher.clone();
    let log = f.log.clone();

    // Act
    let result = f
        .uow
        .atomic(&Scope::new(), |ctx| async move {
            let nested = nested_uow(ctx.transaction().clone(), &log, sink);
            nested
                .atomic(ctx.scope(), |inner| async move {
                    let joined = Tally::new("inner");
                    inner.track(&joined);
                    joined.push_event(Tallied(1));
                    inner.commit().await?;
                    Ok::<_, StorageError>(())
                })
                .await
                .map_err(|_| Rejected)?;
            Err::<(), _>(Rejected)
        })
        .await;

    // Assert
    assert!(matches!(result, Err(AtomicError::Business(Rejected))));
    assert!(f.log.contains(Operation::Rollback));
    assert!(f.publisher.published().is_empty());
}
