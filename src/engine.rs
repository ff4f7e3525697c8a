//! The playback engine seam.
//!
//! A [`PlaybackEngine`] handles decryption, decoding, and rendering; the
//! player orchestrates it. The engine for a player is chosen once, at
//! construction, behind this trait; there is no runtime engine switching or
//! type inspection. An engine is not required to support both playback
//! modes: returning `false` from the respective attach method declines that
//! mode.
//!
//! Engine methods are invoked while the player's internal lock is held, so
//! an engine must not call back into the player from inside them. Progress
//! the engine discovers on its own threads (data arrival, time advancing,
//! errors) is fed back through the player's `report_*` methods.

use std::sync::Arc;

use crate::capabilities::{MediaCapabilitiesInfo, MediaDecodingConfiguration};
use crate::eme::EmeImplementation;
use crate::states::VideoPlaybackQuality;
use crate::stream::{BufferedRange, ElementaryStream};

#[allow(unused_variables)]
pub trait PlaybackEngine: Send + Sync {
    /// Answers whether the given content can be decoded. Must be pure with
    /// respect to playback and consistent for the same configuration across
    /// all engine instances, since capability filtering happens before an
    /// engine is selected.
    fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo;

    /// Starts playback from a src= URL. Returns `false` for an invalid URL
    /// or if src= playback isn't supported.
    fn attach_source(&self, url: &str) -> bool {
        false
    }

    /// Starts MSE-based playback; buffers arrive later through
    /// [`PlaybackEngine::add_mse_buffer`]. Returns `false` if MSE playback
    /// isn't supported.
    fn attach_mse(&self) -> bool {
        false
    }

    /// Accepts an elementary stream to pull encoded frames from. A
    /// multiplexed source registers two buffers against the same underlying
    /// stream, one per media type. Returns `false` on error or unsupported
    /// MIME type.
    fn add_mse_buffer(&self, mime: &str, is_video: bool, stream: &Arc<ElementaryStream>) -> bool {
        false
    }

    /// Installs or clears the decryption implementation. Returns `false` on
    /// error or unsupported key system.
    fn set_eme(&self, key_system: &str, implementation: Option<&Arc<dyn EmeImplementation>>) -> bool {
        true
    }

    /// Buffered ranges for src= playback, where the engine handles
    /// buffering internally. MSE buffering is derived from the registered
    /// elementary streams instead.
    fn buffered(&self) -> Vec<BufferedRange> {
        Vec::new()
    }

    /// Current frame counters.
    fn video_playback_quality(&self) -> VideoPlaybackQuality {
        VideoPlaybackQuality::default()
    }

    /// Stops using the current streams and halts playback.
    fn detach(&self) {}
}
