//! Random token generation.
//!
//! Session identifiers, refresh secrets and invite secrets are opaque random
//! values. Production code draws them from the thread RNG; tests inject a
//! scripted implementation so identifiers are predictable.

use rand::RngCore;

/// Abstraction over the source of opaque random tokens.
pub trait TokenGenerator: Send + Sync {
    /// Returns `len` random bytes, hex-encoded.
    fn hex_token(&self, len: usize) -> String;
}

/// Token generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn hex_token(&self, len: usize) -> String {
        let mut bytes = vec![0_u8; len];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
