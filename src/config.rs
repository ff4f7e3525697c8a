//! Initial player configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use emberplay_geometry::VideoFillMode;

/// Defaults applied to a player at construction. Every field can also be
/// changed later through the corresponding setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume, in `[0, 1]`.
    pub volume: f64,
    /// Whether audio starts muted.
    pub muted: bool,
    /// Initial playback rate.
    pub playback_rate: f64,
    /// How video frames fill the drawing region.
    pub fill_mode: VideoFillMode,
    /// Whether playback should start as soon as content is available,
    /// without an explicit play call.
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            fill_mode: VideoFillMode::default(),
            autoplay: false,
        }
    }
}

impl PlayerConfig {
    /// Parses a configuration from a JSON document. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
