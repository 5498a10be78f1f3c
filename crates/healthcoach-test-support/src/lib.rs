//! Shared test doubles and utilities for the Health Coach backend.

mod clock;
mod recording;
mod rng;

pub use clock::{FixedClock, ManualClock};
pub use recording::{
    Operation, OperationLog, RecordingContext, RecordingDatabase, RecordingPublisher,
    RecordingTransaction,
};
pub use rng::SequenceTokens;
