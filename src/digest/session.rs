//! Per-device digest session state.

/// Nonce-count state for one device.
///
/// Owned by exactly one driver. The counter only ever increases: every
/// authenticated attempt consumes a value, whether or not it succeeds.
#[derive(Debug, Default)]
pub struct DigestSession {
    nonce_count: u64,
}

impl DigestSession {
    /// Create a session with the counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of authenticated attempts made so far.
    pub fn nonce_count(&self) -> u64 {
        self.nonce_count
    }

    /// Advance the counter and return it formatted as `nc` (8 digits, zero padded).
    pub fn next_nc(&mut self) -> String {
        self.nonce_count += 1;
        format!("{:08}", self.nonce_count)
    }
}
