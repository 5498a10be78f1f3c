//! Health Coach storage adapters.
//!
//! Two backends implement the storage transaction primitive and every
//! repository contract:
//!
//! * [`postgres`] runs each unit of work in a `PostgreSQL` transaction.
//! * [`memory`] keeps all state in process and serialises transactions; it
//!   backs the test suites and local runs without a database.
//!
//! [`StorageBackend`] ties a backend to the per-context atomic context
//! factories used to build units of work.

pub mod backend;
pub mod memory;
pub mod postgres;

pub use backend::StorageBackend;
pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;
