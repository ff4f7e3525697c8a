//! emberplay - a thread-safe media player core.
//!
//! This crate provides the contract between a playback engine, the host
//! application embedding it, and the listeners observing playback:
//!
//! - [`MediaPlayer`]: the façade composing the state machine, client
//!   broadcast, and track/buffer registry over a [`PlaybackEngine`].
//! - [`MediaPlayerClient`] and [`ClientList`]: ordered, idempotent event
//!   broadcast.
//! - [`ReadyState`] and [`PlaybackState`]: the two observable state axes.
//! - [`ElementaryStream`] and [`BufferedRange`]: demuxed frame windows and
//!   the buffered ranges derived from them.
//! - [`SupportCheckRegistry`]: routing capability queries without a player
//!   in hand.
//! - [`emberplay_geometry`] (re-exported): exact-rational video fitting.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod eme;
pub mod engine;
pub mod error;
pub mod player;
pub mod states;
pub mod stream;
pub mod support;
pub mod text;
pub mod track;

pub use capabilities::{
    AudioConfiguration, KeySystemConfiguration, MediaCapabilitiesInfo, MediaDecodingConfiguration,
    MediaDecodingType, VideoConfiguration,
};
pub use client::{ClientList, MediaPlayerClient};
pub use config::PlayerConfig;
pub use eme::EmeImplementation;
pub use engine::PlaybackEngine;
pub use error::{Error, Result};
pub use player::MediaPlayer;
pub use states::{PlaybackState, ReadyState, VideoPlaybackQuality};
pub use stream::{intersect_ranges, BufferedRange, ElementaryStream, MAX_GAP_SIZE};
pub use support::SupportCheckRegistry;
pub use text::{Cue, TextTrack, TextTrackClient, TextTrackKind, TextTrackMode};
pub use track::{MediaTrack, MediaTrackKind};

pub use emberplay_geometry::{fit_video_to_region, Rational, Rect, VideoFillMode};
