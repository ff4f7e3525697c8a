//! Encrypted media plug-in point.
//!
//! The key-session machinery itself lives outside this crate; the player
//! only needs a seam to hand protected frames to whatever implementation the
//! host attached. At most one implementation is active at a time; see
//! `MediaPlayer::set_eme_implementation`.

use crate::error::Result;

/// A decryption implementation for one key system.
///
/// Implementations must be internally thread-safe; the player calls them
/// from engine threads.
pub trait EmeImplementation: Send + Sync {
    /// Decrypts one protected frame payload.
    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Whether the key with the given ID is currently usable. Engines use
    /// this to decide between decoding and reporting a missing key.
    fn has_key(&self, key_id: &[u8]) -> bool {
        let _ = key_id;
        false
    }
}
