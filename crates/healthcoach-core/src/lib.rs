//! Health Coach Core: shared domain abstractions and the transactional core.
//!
//! This crate defines the aggregate/event base every bounded context builds
//! on, the storage transaction contract, the generic [`UnitOfWork`] and the
//! [`MessageBus`] used for post-commit event dispatch. It contains no
//! storage adapter code.
//!
//! [`UnitOfWork`]: unit_of_work::UnitOfWork
//! [`MessageBus`]: message_bus::MessageBus

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod message_bus;
pub mod rng;
pub mod scope;
pub mod storage;
pub mod tracking;
pub mod unit_of_work;
