//! Decoding capability queries.
//!
//! Modeled on the Media Capabilities API: the host describes the content it
//! wants to play and the engine answers whether that configuration is
//! supported and how well. Capability checks are pure with respect to
//! playback and must answer consistently across engine instances for the
//! same configuration.

use serde::{Deserialize, Serialize};
use std::ops::BitAnd;

/// The playback mode a capability query is about.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaDecodingType {
    /// Direct playback of a file through src=.
    #[default]
    File,
    /// Playback through MSE buffers.
    MediaSource,
}

/// The video half of a decoding query. `content_type` empty means the query
/// is audio-only and this block is ignored.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfiguration {
    /// Full MIME type being queried.
    pub content_type: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Average bitrate in bits per second.
    pub bitrate: u64,
    /// Framerate in frames per second.
    pub framerate: f64,
}

/// The audio half of a decoding query. `content_type` empty means the query
/// is video-only and this block is ignored.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfiguration {
    /// Full MIME type being queried.
    pub content_type: String,
    /// Number of channels.
    pub channels: u16,
    /// Average bitrate in bits per second.
    pub bitrate: u64,
    /// Sample rate in Hz.
    pub samplerate: u32,
}

/// Key-system requirements for protected content. An empty `key_system`
/// means the content is clear.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySystemConfiguration {
    /// The EME key system ID, e.g. `org.w3.clearkey`.
    pub key_system: String,
}

/// A complete decoder configuration to query support for.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDecodingConfiguration {
    pub decoding_type: MediaDecodingType,
    pub video: VideoConfiguration,
    pub audio: AudioConfiguration,
    pub key_system_configuration: KeySystemConfiguration,
}

/// The result of a capability check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilitiesInfo {
    /// Whether the configuration is supported at all.
    pub supported: bool,
    /// Whether playback is expected to be smooth.
    pub smooth: bool,
    /// Whether playback is expected to be power efficient.
    pub power_efficient: bool,
}

impl MediaCapabilitiesInfo {
    /// An unconditional "yes" answer.
    pub fn supported() -> Self {
        Self {
            supported: true,
            smooth: true,
            power_efficient: true,
        }
    }

    /// An unconditional "no" answer.
    pub fn unsupported() -> Self {
        Self::default()
    }
}

impl BitAnd for MediaCapabilitiesInfo {
    type Output = Self;

    /// Combines two answers; an unsupported side masks out the other side's
    /// quality bits.
    fn bitand(self, other: Self) -> Self {
        Self {
            supported: self.supported & other.supported,
            smooth: self.supported & other.supported & self.smooth & other.smooth,
            power_efficient: self.supported
                & other.supported
                & self.power_efficient
                & other.power_efficient,
        }
    }
}
