//! Playback state definitions.
//!
//! Two orthogonal axes describe playback: [`ReadyState`] says how much
//! content is available around the playhead, [`PlaybackState`] says why the
//! playhead is or is not advancing. Listeners read them together but they
//! change independently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much content is loaded around the current playhead time.
///
/// The numeric values are meaningful and totally ordered: a higher value
/// means strictly more content is available at the current position.
/// `NotAttached` is negative so it sorts below every attached state while the
/// attached states keep their conventional HTML `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum ReadyState {
    /// No playback instance is attached.
    NotAttached = -1,
    /// Playback is attached but nothing has been loaded yet.
    HaveNothing = 0,
    /// The stream metadata (duration, dimensions) has been loaded.
    HaveMetadata = 1,
    /// There is media data at the current time.
    HaveCurrentData = 2,
    /// There is media data at the current time and a short way ahead.
    HaveFutureData = 3,
    /// There is enough data ahead that playback should not stall.
    HaveEnoughData = 4,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttached => write!(f, "not_attached"),
            Self::HaveNothing => write!(f, "have_nothing"),
            Self::HaveMetadata => write!(f, "have_metadata"),
            Self::HaveCurrentData => write!(f, "have_current_data"),
            Self::HaveFutureData => write!(f, "have_future_data"),
            Self::HaveEnoughData => write!(f, "have_enough_data"),
        }
    }
}

/// Why the playhead is or is not moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No playback instance is attached.
    Detached,
    /// Attached and waiting for the initial segment data.
    Initializing,
    /// Paused by host action.
    Paused,
    /// Seeking to another time; stays here until content is available at the
    /// new position.
    Seeking,
    /// Waiting for new content; with content available this would be
    /// `Playing`.
    Buffering,
    /// Waiting for a decryption key; with the key available this would be
    /// `Playing`.
    WaitingForKey,
    /// Moving forward and playing content.
    Playing,
    /// The playhead reached the content duration. Exhausting the buffered
    /// range yields `Buffering` instead.
    Ended,
    /// A fatal playback error. Terminal until a detach/reattach cycle.
    Errored,
}

impl PlaybackState {
    /// Whether no further transitions can happen without a detach.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Errored)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => write!(f, "detached"),
            Self::Initializing => write!(f, "initializing"),
            Self::Paused => write!(f, "paused"),
            Self::Seeking => write!(f, "seeking"),
            Self::Buffering => write!(f, "buffering"),
            Self::WaitingForKey => write!(f, "waiting_for_key"),
            Self::Playing => write!(f, "playing"),
            Self::Ended => write!(f, "ended"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Counters describing video playback quality, as reported by the engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPlaybackQuality {
    /// Total number of video frames played.
    pub total_video_frames: u32,
    /// Number of video frames dropped.
    pub dropped_video_frames: u32,
    /// Number of video frames corrupted.
    pub corrupted_video_frames: u32,
}
