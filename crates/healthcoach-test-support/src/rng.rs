//! Test token generators: deterministic `TokenGenerator` implementations.

use std::collections::VecDeque;
use std::sync::Mutex;

use healthcoach_core::rng::TokenGenerator;

/// A token generator that first hands out a predetermined sequence of tokens
/// and then falls back to a zero-padded hex counter of the requested width.
#[derive(Debug, Default)]
pub struct SequenceTokens {
    scripted: Mutex<VecDeque<String>>,
    counter: Mutex<u64>,
}

impl SequenceTokens {
    /// Creates a generator that only counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that returns `values` in order before counting.
    #[must_use]
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scripted: Mutex::new(values.into_iter().map(Into::into).collect()),
            counter: Mutex::new(0),
        }
    }
}

impl TokenGenerator for SequenceTokens {
    fn hex_token(&self, len: usize) -> String {
        if let Some(next) = self.scripted.lock().unwrap().pop_front() {
            return next;
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        format!("{:0width$x}", *counter, width = len * 2)
    }
}
