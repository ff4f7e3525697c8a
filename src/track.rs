//! Audio and video track descriptions.
//!
//! Tracks are shared between the player's registry and any listener that
//! retains a handle; they are reference counted and live until the last
//! holder drops them, even after removal from the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// The role of an audio/video track within the presentation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaTrackKind {
    #[default]
    Unknown,
    /// An alternative to the main track, e.g. a different take or angle.
    Alternative,
    /// A main video variant with captions burnt in (legacy content).
    Captions,
    /// An audio description of a video track.
    Descriptions,
    /// The primary audio or video track.
    Main,
    /// The primary audio track mixed with audio descriptions.
    MainDesc,
    /// A sign-language interpretation of an audio track.
    Sign,
    /// A main video variant with subtitles burnt in (legacy content).
    Subtitles,
    /// A translated version of the main audio track.
    Translation,
    /// Commentary on the primary track.
    Commentary,
}

impl fmt::Display for MediaTrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Alternative => "alternative",
            Self::Captions => "captions",
            Self::Descriptions => "descriptions",
            Self::Main => "main",
            Self::MainDesc => "main_desc",
            Self::Sign => "sign",
            Self::Subtitles => "subtitles",
            Self::Translation => "translation",
            Self::Commentary => "commentary",
        };
        write!(f, "{name}")
    }
}

/// An audio or video track. Identity is the `id` string; the descriptive
/// fields are immutable for the life of the track.
#[derive(Debug)]
pub struct MediaTrack {
    /// The id string of the track.
    pub id: String,
    /// The kind of the track.
    pub kind: MediaTrackKind,
    /// The label string of the track.
    pub label: String,
    /// The language string of the track.
    pub language: String,
    enabled: AtomicBool,
}

impl MediaTrack {
    pub fn new(
        kind: MediaTrackKind,
        label: impl Into<String>,
        language: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            language: language.into(),
            enabled: AtomicBool::new(false),
        }
    }

    /// Whether the track is currently selected for playback.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Changes whether the track is selected for playback.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}
