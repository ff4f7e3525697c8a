//! The media player façade.
//!
//! [`MediaPlayer`] composes the playback state machine, the client broadcast
//! list, and the track/buffer registry behind one thread-safe surface. The
//! host drives it through lifecycle and command methods; the engine feeds
//! progress back through the `report_*` methods; listeners observe every
//! transition through [`MediaPlayerClient`] callbacks.
//!
//! # Locking and reentrancy
//!
//! All state reads and writes are serialized on one internal lock, so the
//! player can be called concurrently from multiple threads without external
//! locking. Client notifications are delivered synchronously while that lock
//! is held: a listener callback must not call back into the player. Same-
//! thread reentrancy is detected and panics immediately instead of
//! deadlocking; cross-thread reentrancy from a callback still deadlocks and
//! remains a caller contract violation.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

use crate::capabilities::{MediaCapabilitiesInfo, MediaDecodingConfiguration};
use crate::client::{ClientList, MediaPlayerClient};
use crate::config::PlayerConfig;
use crate::eme::EmeImplementation;
use crate::engine::PlaybackEngine;
use crate::states::{PlaybackState, ReadyState, VideoPlaybackQuality};
use crate::stream::{intersect_ranges, BufferedRange, ElementaryStream};
use crate::text::{TextTrack, TextTrackKind};
use crate::track::MediaTrack;
use emberplay_geometry::VideoFillMode;

/// What the player is currently attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attachment {
    None,
    Source(String),
    Mse,
}

struct EmeAttachment {
    key_system: String,
    implementation: Arc<dyn EmeImplementation>,
}

struct PlayerState {
    attachment: Attachment,
    ready: ReadyState,
    playback: PlaybackState,
    current_time: f64,
    duration: f64,
    playback_rate: f64,
    volume: f64,
    muted: bool,
    fill_mode: VideoFillMode,
    frame_width: u32,
    frame_height: u32,
    autoplay: bool,
    play_requested: bool,
    seeking: bool,
    waiting_for_key: bool,
    errored: bool,
    metadata_loaded: bool,
    mse_ended: bool,
    audio_tracks: Vec<Arc<MediaTrack>>,
    video_tracks: Vec<Arc<MediaTrack>>,
    text_tracks: Vec<Arc<TextTrack>>,
    mse_streams: Vec<Arc<ElementaryStream>>,
    eme: Option<EmeAttachment>,
    text_track_seq: u32,
}

impl PlayerState {
    fn new(config: &PlayerConfig) -> Self {
        Self {
            attachment: Attachment::None,
            ready: ReadyState::NotAttached,
            playback: PlaybackState::Detached,
            current_time: 0.0,
            duration: f64::INFINITY,
            playback_rate: config.playback_rate,
            volume: config.volume.clamp(0.0, 1.0),
            muted: config.muted,
            fill_mode: config.fill_mode,
            frame_width: 0,
            frame_height: 0,
            autoplay: config.autoplay,
            play_requested: false,
            seeking: false,
            waiting_for_key: false,
            errored: false,
            metadata_loaded: false,
            mse_ended: false,
            audio_tracks: Vec::new(),
            video_tracks: Vec::new(),
            text_tracks: Vec::new(),
            mse_streams: Vec::new(),
            eme: None,
            text_track_seq: 0,
        }
    }

    fn is_attached(&self) -> bool {
        self.attachment != Attachment::None
    }

    /// Whether commands that mutate playback should be accepted.
    fn accepts_commands(&self) -> bool {
        self.is_attached() && !self.errored
    }

    /// The playback state implied by the current inputs. Evaluated after
    /// every input change so each axis is derived from one place.
    fn implied_playback(&self) -> PlaybackState {
        if !self.is_attached() {
            return PlaybackState::Detached;
        }
        if self.errored {
            return PlaybackState::Errored;
        }
        if !self.metadata_loaded {
            return PlaybackState::Initializing;
        }
        if self.duration.is_finite() && self.current_time >= self.duration {
            return PlaybackState::Ended;
        }
        if self.seeking {
            return PlaybackState::Seeking;
        }
        if !self.play_requested {
            return PlaybackState::Paused;
        }
        if self.waiting_for_key {
            return PlaybackState::WaitingForKey;
        }
        if self.ready >= ReadyState::HaveFutureData {
            PlaybackState::Playing
        } else {
            PlaybackState::Buffering
        }
    }

    /// Buffered ranges from the registered MSE streams (intersection across
    /// buffers, so a time counts only when every stream has it).
    fn mse_buffered(&self) -> Vec<BufferedRange> {
        let lists: Vec<_> = self
            .mse_streams
            .iter()
            .map(|s| s.buffered_ranges())
            .collect();
        intersect_ranges(&lists)
    }
}

/// A thread-safe media player composing the state machine, broadcast
/// registry, and track/buffer registry over a [`PlaybackEngine`] chosen at
/// construction.
pub struct MediaPlayer {
    engine: Box<dyn PlaybackEngine>,
    clients: ClientList,
    state: Mutex<PlayerState>,
    lock_owner: Mutex<Option<ThreadId>>,
}

/// Clears the lock owner marker when the state lock is released.
struct OwnerReset<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for OwnerReset<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl MediaPlayer {
    /// Creates a player over the given engine with default configuration.
    pub fn new(engine: Box<dyn PlaybackEngine>) -> Arc<Self> {
        Self::with_config(engine, PlayerConfig::default())
    }

    /// Creates a player over the given engine, applying the configuration's
    /// initial volume, rate, fill mode, and autoplay intent.
    pub fn with_config(engine: Box<dyn PlaybackEngine>, config: PlayerConfig) -> Arc<Self> {
        Arc::new(Self {
            engine,
            clients: ClientList::new(),
            state: Mutex::new(PlayerState::new(&config)),
            lock_owner: Mutex::new(None),
        })
    }

    /// Runs `f` with the state lock held, failing fast on same-thread
    /// reentrancy from a client callback.
    fn with_state<R>(&self, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        let current = thread::current().id();
        if *self.lock_owner.lock() == Some(current) {
            panic!("reentrant MediaPlayer call from a client callback");
        }
        let mut state = self.state.lock();
        *self.lock_owner.lock() = Some(current);
        let _reset = OwnerReset(&self.lock_owner);
        f(&mut state)
    }

    fn set_ready_state(&self, state: &mut PlayerState, new: ReadyState) {
        if state.ready == new {
            return;
        }
        let old = state.ready;
        state.ready = new;
        debug!(%old, %new, "ready state changed");
        self.clients.on_ready_state_changed(old, new);
    }

    fn set_playback_state(&self, state: &mut PlayerState, new: PlaybackState) {
        if state.playback == new {
            return;
        }
        let old = state.playback;
        state.playback = new;
        debug!(%old, %new, "playback state changed");
        self.clients.on_playback_state_changed(old, new);
    }

    /// Re-derives the playback state after an input change, notifying only
    /// on an actual transition.
    fn resolve_playback(&self, state: &mut PlayerState) {
        let new = state.implied_playback();
        self.set_playback_state(state, new);
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    /// Registers a listener for player events. Clients are called in
    /// registration order; adding an already-registered client has no
    /// effect.
    pub fn add_client(&self, client: Arc<dyn MediaPlayerClient>) {
        self.clients.add_client(client);
    }

    /// Removes a listener. Removing an unregistered client has no effect.
    pub fn remove_client(&self, client: &Arc<dyn MediaPlayerClient>) {
        self.clients.remove_client(client);
    }

    // ------------------------------------------------------------------
    // Lifecycle (host)
    // ------------------------------------------------------------------

    /// Starts playback from a src= URL. Returns `false`, leaving all state
    /// unchanged, if something is already attached or the engine declines
    /// the URL.
    pub fn attach_source(&self, url: &str) -> bool {
        self.with_state(|state| {
            if state.is_attached() {
                warn!(url, "attach_source rejected: already attached");
                return false;
            }
            if !self.engine.attach_source(url) {
                warn!(url, "attach_source rejected by engine");
                return false;
            }
            debug!(url, "attached src= playback");
            state.attachment = Attachment::Source(url.to_string());
            state.play_requested = state.autoplay;
            self.clients.on_attach_source();
            if state.play_requested {
                self.clients.on_play();
            }
            self.set_ready_state(state, ReadyState::HaveNothing);
            self.resolve_playback(state);
            true
        })
    }

    /// Starts MSE-based playback; buffers arrive later through
    /// [`MediaPlayer::add_mse_buffer`]. Returns `false`, leaving all state
    /// unchanged, if something is already attached or the engine doesn't
    /// support MSE.
    pub fn attach_mse(&self) -> bool {
        self.with_state(|state| {
            if state.is_attached() {
                warn!("attach_mse rejected: already attached");
                return false;
            }
            if !self.engine.attach_mse() {
                warn!("attach_mse rejected by engine");
                return false;
            }
            debug!("attached MSE playback");
            state.attachment = Attachment::Mse;
            state.play_requested = state.autoplay;
            self.clients.on_attach_mse();
            if state.play_requested {
                self.clients.on_play();
            }
            self.set_ready_state(state, ReadyState::HaveNothing);
            self.resolve_playback(state);
            true
        })
    }

    /// Registers an MSE input buffer for one elementary stream. A
    /// multiplexed source calls this twice with the same stream, once per
    /// media type. Returns `false` if MSE playback isn't attached or the
    /// engine rejects the MIME type.
    pub fn add_mse_buffer(
        &self,
        mime: &str,
        is_video: bool,
        stream: Arc<ElementaryStream>,
    ) -> bool {
        self.with_state(|state| {
            if state.attachment != Attachment::Mse || state.errored {
                warn!(mime, "add_mse_buffer rejected: not in MSE playback");
                return false;
            }
            if !self.engine.add_mse_buffer(mime, is_video, &stream) {
                warn!(mime, "add_mse_buffer rejected by engine");
                return false;
            }
            debug!(mime, is_video, "added MSE buffer");
            state.mse_streams.push(stream);
            true
        })
    }

    /// Signals that every expected input buffer has supplied its initial
    /// segment, with the duration estimated from them (infinity if
    /// unknown). Advances the ready state to at least `HaveMetadata` and
    /// moves playback out of `Initializing`.
    pub fn loaded_metadata(&self, duration: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!("loaded_metadata ignored: nothing attached");
                return;
            }
            debug!(duration, "metadata loaded");
            state.metadata_loaded = true;
            state.duration = duration;
            let ready = state.ready.max(ReadyState::HaveMetadata);
            self.set_ready_state(state, ready);
            self.resolve_playback(state);
        })
    }

    /// Marks the current buffered end as the end of the content. If the
    /// duration is still unknown it becomes the buffered end.
    pub fn mse_end_of_stream(&self) {
        self.with_state(|state| {
            if state.attachment != Attachment::Mse || state.errored {
                warn!("mse_end_of_stream ignored: not in MSE playback");
                return;
            }
            state.mse_ended = true;
            if state.duration.is_infinite() {
                if let Some(range) = state.mse_buffered().last() {
                    state.duration = range.end;
                }
            }
            debug!(duration = state.duration, "MSE end of stream");
            self.resolve_playback(state);
        })
    }

    /// Installs the decryption implementation for the given key system, or
    /// clears it when `implementation` is `None`. At most one implementation
    /// is active at a time. Returns `false` if nothing is attached or the
    /// engine rejects the key system.
    pub fn set_eme_implementation(
        &self,
        key_system: &str,
        implementation: Option<Arc<dyn EmeImplementation>>,
    ) -> bool {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(key_system, "set_eme_implementation rejected: nothing attached");
                return false;
            }
            if !self.engine.set_eme(key_system, implementation.as_ref()) {
                warn!(key_system, "set_eme_implementation rejected by engine");
                return false;
            }
            state.eme = implementation.map(|implementation| EmeAttachment {
                key_system: key_system.to_string(),
                implementation,
            });
            debug!(key_system, active = state.eme.is_some(), "EME implementation changed");
            true
        })
    }

    /// The key system of the active EME implementation, if any.
    pub fn eme_key_system(&self) -> Option<String> {
        self.with_state(|state| state.eme.as_ref().map(|e| e.key_system.clone()))
    }

    /// The active EME implementation, if any.
    pub fn eme_implementation(&self) -> Option<Arc<dyn EmeImplementation>> {
        self.with_state(|state| state.eme.as_ref().map(|e| Arc::clone(&e.implementation)))
    }

    /// Stops playback and unloads the content. Safe to call from any state,
    /// including `Errored` and mid-transition; always leaves the player at
    /// `(NotAttached, Detached)`.
    pub fn detach(&self) {
        self.with_state(|state| {
            if !state.is_attached() {
                return;
            }
            debug!("detaching");
            self.engine.detach();

            for track in std::mem::take(&mut state.audio_tracks) {
                self.clients.on_remove_audio_track(&track);
            }
            for track in std::mem::take(&mut state.video_tracks) {
                self.clients.on_remove_video_track(&track);
            }
            for track in std::mem::take(&mut state.text_tracks) {
                self.clients.on_remove_text_track(&track);
            }

            state.attachment = Attachment::None;
            state.current_time = 0.0;
            state.duration = f64::INFINITY;
            state.frame_width = 0;
            state.frame_height = 0;
            state.play_requested = false;
            state.seeking = false;
            state.waiting_for_key = false;
            state.errored = false;
            state.metadata_loaded = false;
            state.mse_ended = false;
            state.mse_streams.clear();
            state.eme = None;

            self.set_ready_state(state, ReadyState::NotAttached);
            self.resolve_playback(state);
            self.clients.on_detach();
        })
    }

    // ------------------------------------------------------------------
    // Playback commands (host)
    // ------------------------------------------------------------------

    /// Requests playback. Before metadata is loaded this records the intent
    /// and playback starts once content is available; afterwards the state
    /// becomes `Playing`, `Buffering`, or `WaitingForKey` depending on data
    /// and key availability. A no-op when nothing is attached.
    pub fn play(&self) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!("play ignored: nothing attached");
                return;
            }
            if !state.play_requested {
                state.play_requested = true;
                self.clients.on_play();
            }
            self.resolve_playback(state);
        })
    }

    /// Pauses playback. The intent also applies before metadata is loaded:
    /// content will not start playing when it arrives. A no-op when nothing
    /// is attached.
    pub fn pause(&self) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!("pause ignored: nothing attached");
                return;
            }
            state.play_requested = false;
            self.resolve_playback(state);
        })
    }

    /// Seeks to a new position. Playback stays `Seeking` until the engine
    /// reports content available at the new position, then reverts to the
    /// state implied by data availability. A no-op when nothing is attached.
    pub fn set_current_time(&self, time: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(time, "seek ignored: nothing attached");
                return;
            }
            debug!(time, "seeking");
            state.current_time = time;
            state.seeking = true;
            self.clients.on_seeking();
            self.resolve_playback(state);
        })
    }

    /// Sets the content duration. A no-op when nothing is attached.
    pub fn set_duration(&self, duration: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(duration, "set_duration ignored: nothing attached");
                return;
            }
            state.duration = duration;
            self.resolve_playback(state);
        })
    }

    /// Sets the playback rate, notifying clients on an actual change. A
    /// no-op when nothing is attached.
    pub fn set_playback_rate(&self, rate: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(rate, "set_playback_rate ignored: nothing attached");
                return;
            }
            if state.playback_rate != rate {
                let old = state.playback_rate;
                state.playback_rate = rate;
                debug!(old, rate, "playback rate changed");
                self.clients.on_playback_rate_changed(old, rate);
            }
        })
    }

    /// Sets the volume, clamped to `[0, 1]`. A no-op when nothing is
    /// attached.
    pub fn set_volume(&self, volume: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(volume, "set_volume ignored: nothing attached");
                return;
            }
            state.volume = volume.clamp(0.0, 1.0);
        })
    }

    /// Sets whether audio is muted. A no-op when nothing is attached.
    pub fn set_muted(&self, muted: bool) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(muted, "set_muted ignored: nothing attached");
                return;
            }
            state.muted = muted;
        })
    }

    /// Sets how video frames fill the drawing region. Returns `false` when
    /// nothing is attached.
    pub fn set_video_fill_mode(&self, mode: VideoFillMode) -> bool {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(%mode, "set_video_fill_mode rejected: nothing attached");
                return false;
            }
            state.fill_mode = mode;
            true
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The current ready state.
    pub fn ready_state(&self) -> ReadyState {
        self.with_state(|state| state.ready)
    }

    /// The current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.with_state(|state| state.playback)
    }

    /// The current playhead time, or 0 when nothing is loaded.
    pub fn current_time(&self) -> f64 {
        self.with_state(|state| state.current_time)
    }

    /// The content duration, or infinity when unknown.
    pub fn duration(&self) -> f64 {
        self.with_state(|state| state.duration)
    }

    /// The current playback rate.
    pub fn playback_rate(&self) -> f64 {
        self.with_state(|state| state.playback_rate)
    }

    /// The current volume in `[0, 1]`.
    pub fn volume(&self) -> f64 {
        self.with_state(|state| state.volume)
    }

    /// Whether audio is muted.
    pub fn muted(&self) -> bool {
        self.with_state(|state| state.muted)
    }

    /// The current video fill mode.
    pub fn video_fill_mode(&self) -> VideoFillMode {
        self.with_state(|state| state.fill_mode)
    }

    /// Width of the current video frames in pixels, 0 before any frame.
    pub fn width(&self) -> u32 {
        self.with_state(|state| state.frame_width)
    }

    /// Height of the current video frames in pixels, 0 before any frame.
    pub fn height(&self) -> u32 {
        self.with_state(|state| state.frame_height)
    }

    /// The ranges of buffered content: from the registered elementary
    /// streams for MSE playback, from the engine for src= playback.
    /// Recomputed on every call.
    pub fn buffered(&self) -> Vec<BufferedRange> {
        self.with_state(|state| match state.attachment {
            Attachment::None => Vec::new(),
            Attachment::Source(_) => self.engine.buffered(),
            Attachment::Mse => state.mse_buffered(),
        })
    }

    /// Current video playback quality counters from the engine.
    pub fn video_playback_quality(&self) -> VideoPlaybackQuality {
        self.engine.video_playback_quality()
    }

    /// Answers whether the given content can be decoded. Pure with respect
    /// to playback; see [`PlaybackEngine::decoding_info`].
    pub fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
        self.engine.decoding_info(config)
    }

    /// The current audio tracks.
    pub fn audio_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.with_state(|state| state.audio_tracks.clone())
    }

    /// The current video tracks.
    pub fn video_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.with_state(|state| state.video_tracks.clone())
    }

    /// The current text tracks.
    pub fn text_tracks(&self) -> Vec<Arc<TextTrack>> {
        self.with_state(|state| state.text_tracks.clone())
    }

    /// Adds a host-created text track, or `None` when nothing is attached.
    pub fn add_text_track(
        &self,
        kind: TextTrackKind,
        label: &str,
        language: &str,
    ) -> Option<Arc<TextTrack>> {
        self.with_state(|state| {
            if !state.accepts_commands() {
                warn!(%kind, "add_text_track rejected: nothing attached");
                return None;
            }
            state.text_track_seq += 1;
            let id = format!("text-{}", state.text_track_seq);
            let track = Arc::new(TextTrack::new(kind, label, language, id));
            state.text_tracks.push(Arc::clone(&track));
            self.clients.on_add_text_track(&track);
            Some(track)
        })
    }

    /// Removes a text track by handle. Fires exactly one removal event; a
    /// no-op for tracks not in the registry.
    pub fn remove_text_track(&self, track: &Arc<TextTrack>) {
        self.with_state(|state| {
            let before = state.text_tracks.len();
            state.text_tracks.retain(|t| !Arc::ptr_eq(t, track));
            if state.text_tracks.len() < before {
                self.clients.on_remove_text_track(track);
            }
        })
    }

    // ------------------------------------------------------------------
    // Engine reports
    // ------------------------------------------------------------------

    /// Reports how much content is available around the playhead. Engines
    /// must not report `NotAttached`; that state is owned by detach.
    pub fn report_ready_state(&self, ready: ReadyState) {
        self.with_state(|state| {
            if !state.accepts_commands() || ready == ReadyState::NotAttached {
                warn!(%ready, "ready state report ignored");
                return;
            }
            if ready >= ReadyState::HaveMetadata {
                state.metadata_loaded = true;
            }
            // A seek is over once the engine reports content available at
            // the new position. Only a report made after the seek started
            // counts; the pre-seek ready state says nothing about the new
            // position.
            if state.seeking && ready >= ReadyState::HaveCurrentData {
                state.seeking = false;
            }
            self.set_ready_state(state, ready);
            self.resolve_playback(state);
        })
    }

    /// Reports playhead progress. Reaching the duration ends playback.
    pub fn report_time(&self, time: f64) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            state.current_time = time;
            self.resolve_playback(state);
        })
    }

    /// Reports the dimensions of decoded video frames.
    pub fn report_frame_size(&self, width: u32, height: u32) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            state.frame_width = width;
            state.frame_height = height;
        })
    }

    /// Reports that playback stopped for lack of a decryption key. Fires
    /// `on_waiting_for_key` on every call: once per missing key, and again
    /// if new keys arrive without the required one.
    pub fn report_waiting_for_key(&self) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            state.waiting_for_key = true;
            self.clients.on_waiting_for_key();
            self.resolve_playback(state);
        })
    }

    /// Reports that the required key became usable (or not), resuming
    /// playback when data is also available.
    pub fn report_key_status(&self, have_key: bool) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            state.waiting_for_key = !have_key;
            self.resolve_playback(state);
        })
    }

    /// Reports an unrecoverable failure. Playback transitions to `Errored`
    /// (terminal until detach) and the error notification fires with the
    /// given message, which may be empty. Repeated reports after the first
    /// are ignored.
    pub fn report_error(&self, error: &str) {
        self.with_state(|state| {
            if !state.is_attached() || state.errored {
                warn!(error, "error report ignored");
                return;
            }
            state.errored = true;
            warn!(error, "playback errored");
            self.resolve_playback(state);
            self.clients.on_error(error);
        })
    }

    /// Adds an audio track reported by the engine. Fires exactly one add
    /// event; re-adding the same handle is a no-op.
    pub fn add_audio_track(&self, track: Arc<MediaTrack>) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            if state.audio_tracks.iter().any(|t| Arc::ptr_eq(t, &track)) {
                return;
            }
            state.audio_tracks.push(Arc::clone(&track));
            self.clients.on_add_audio_track(&track);
        })
    }

    /// Removes an audio track by handle, firing exactly one removal event.
    pub fn remove_audio_track(&self, track: &Arc<MediaTrack>) {
        self.with_state(|state| {
            let before = state.audio_tracks.len();
            state.audio_tracks.retain(|t| !Arc::ptr_eq(t, track));
            if state.audio_tracks.len() < before {
                self.clients.on_remove_audio_track(track);
            }
        })
    }

    /// Adds a video track reported by the engine. Fires exactly one add
    /// event; re-adding the same handle is a no-op.
    pub fn add_video_track(&self, track: Arc<MediaTrack>) {
        self.with_state(|state| {
            if !state.accepts_commands() {
                return;
            }
            if state.video_tracks.iter().any(|t| Arc::ptr_eq(t, &track)) {
                return;
            }
            state.video_tracks.push(Arc::clone(&track));
            self.clients.on_add_video_track(&track);
        })
    }

    /// Removes a video track by handle, firing exactly one removal event.
    pub fn remove_video_track(&self, track: &Arc<MediaTrack>) {
        self.with_state(|state| {
            let before = state.video_tracks.len();
            state.video_tracks.retain(|t| !Arc::ptr_eq(t, track));
            if state.video_tracks.len() < before {
                self.clients.on_remove_video_track(track);
            }
        })
    }

    /// Raises a user-defined event to every client. The open-ended channel
    /// for engine extensions; library listeners ignore unknown names.
    pub fn raise_user_event(&self, name: &str, data: &serde_json::Value) {
        self.with_state(|_| {
            self.clients.on_user_event(name, data);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::MediaTrackKind;
    use serde_json::json;

    /// Engine stub accepting both playback modes and common MIME types.
    struct StubEngine;

    impl PlaybackEngine for StubEngine {
        fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
            if config.video.content_type.starts_with("video/") || config.video.content_type.is_empty()
            {
                MediaCapabilitiesInfo::supported()
            } else {
                MediaCapabilitiesInfo::unsupported()
            }
        }

        fn attach_source(&self, url: &str) -> bool {
            !url.is_empty()
        }

        fn attach_mse(&self) -> bool {
            true
        }

        fn add_mse_buffer(
            &self,
            mime: &str,
            _is_video: bool,
            _stream: &Arc<ElementaryStream>,
        ) -> bool {
            mime.starts_with("video/") || mime.starts_with("audio/")
        }
    }

    /// Engine stub that declines everything.
    struct DeadEngine;

    impl PlaybackEngine for DeadEngine {
        fn decoding_info(&self, _config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
            MediaCapabilitiesInfo::unsupported()
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        log: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut self.log.lock())
        }

        fn push(&self, entry: impl Into<String>) {
            self.log.lock().push(entry.into());
        }
    }

    impl MediaPlayerClient for RecordingClient {
        fn on_ready_state_changed(&self, old: ReadyState, new: ReadyState) {
            self.push(format!("ready:{old}->{new}"));
        }

        fn on_playback_state_changed(&self, old: PlaybackState, new: PlaybackState) {
            self.push(format!("playback:{old}->{new}"));
        }

        fn on_playback_rate_changed(&self, old: f64, new: f64) {
            self.push(format!("rate:{old}->{new}"));
        }

        fn on_error(&self, error: &str) {
            self.push(format!("error:{error}"));
        }

        fn on_attach_mse(&self) {
            self.push("attach_mse");
        }

        fn on_attach_source(&self) {
            self.push("attach_source");
        }

        fn on_detach(&self) {
            self.push("detach");
        }

        fn on_play(&self) {
            self.push("play");
        }

        fn on_seeking(&self) {
            self.push("seeking");
        }

        fn on_waiting_for_key(&self) {
            self.push("waiting_for_key");
        }

        fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {
            self.push(format!("add_audio:{}", track.id));
        }

        fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {
            self.push(format!("remove_audio:{}", track.id));
        }

        fn on_add_video_track(&self, track: &Arc<MediaTrack>) {
            self.push(format!("add_video:{}", track.id));
        }

        fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {
            self.push(format!("remove_video:{}", track.id));
        }

        fn on_add_text_track(&self, track: &Arc<TextTrack>) {
            self.push(format!("add_text:{}", track.id));
        }

        fn on_remove_text_track(&self, track: &Arc<TextTrack>) {
            self.push(format!("remove_text:{}", track.id));
        }

        fn on_user_event(&self, name: &str, _data: &serde_json::Value) {
            self.push(format!("user:{name}"));
        }
    }

    fn player_with_client() -> (Arc<MediaPlayer>, Arc<RecordingClient>) {
        let player = MediaPlayer::new(Box::new(StubEngine));
        let client = Arc::new(RecordingClient::default());
        player.add_client(client.clone());
        (player, client)
    }

    #[test]
    fn test_initial_state() {
        let player = MediaPlayer::new(Box::new(StubEngine));
        assert_eq!(player.ready_state(), ReadyState::NotAttached);
        assert_eq!(player.playback_state(), PlaybackState::Detached);
        assert_eq!(player.current_time(), 0.0);
        assert!(player.duration().is_infinite());
        assert_eq!(player.volume(), 1.0);
    }

    #[test]
    fn test_attach_source_transitions() {
        let (player, client) = player_with_client();
        assert!(player.attach_source("https://example.com/a.mp4"));
        assert_eq!(player.ready_state(), ReadyState::HaveNothing);
        assert_eq!(player.playback_state(), PlaybackState::Initializing);
        assert_eq!(
            client.take(),
            vec![
                "attach_source",
                "ready:not_attached->have_nothing",
                "playback:detached->initializing"
            ]
        );
    }

    #[test]
    fn test_attach_rejected_leaves_state_unchanged() {
        let (player, client) = player_with_client();
        assert!(!player.attach_source(""));
        assert_eq!(player.ready_state(), ReadyState::NotAttached);
        assert_eq!(player.playback_state(), PlaybackState::Detached);
        assert!(client.take().is_empty());

        let dead = MediaPlayer::new(Box::new(DeadEngine));
        assert!(!dead.attach_mse());
        assert_eq!(dead.playback_state(), PlaybackState::Detached);
    }

    #[test]
    fn test_second_attach_rejected() {
        let (player, _client) = player_with_client();
        assert!(player.attach_mse());
        assert!(!player.attach_source("https://example.com/a.mp4"));
        assert!(!player.attach_mse());
    }

    #[test]
    fn test_commands_are_noops_when_detached() {
        let (player, client) = player_with_client();
        player.play();
        player.pause();
        player.set_current_time(5.0);
        player.set_playback_rate(2.0);
        player.set_volume(0.5);
        player.set_muted(true);
        assert!(!player.set_video_fill_mode(VideoFillMode::Zoom));
        assert!(player.add_text_track(TextTrackKind::Subtitles, "", "en").is_none());

        assert_eq!(player.playback_state(), PlaybackState::Detached);
        assert_eq!(player.volume(), 1.0);
        assert!(!player.muted());
        assert!(client.take().is_empty());
    }

    #[test]
    fn test_play_before_data_buffers() {
        let (player, client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        client.take();

        player.play();
        assert_eq!(player.playback_state(), PlaybackState::Buffering);
        assert_eq!(client.take(), vec!["play", "playback:paused->buffering"]);

        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_metadata_moves_out_of_initializing() {
        let (player, client) = player_with_client();
        player.attach_mse();
        client.take();

        player.loaded_metadata(120.0);
        assert_eq!(player.ready_state(), ReadyState::HaveMetadata);
        assert_eq!(player.playback_state(), PlaybackState::Paused);
        assert_eq!(player.duration(), 120.0);
        assert_eq!(
            client.take(),
            vec![
                "ready:have_nothing->have_metadata",
                "playback:initializing->paused"
            ]
        );
    }

    #[test]
    fn test_engine_reported_metadata_also_counts() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.report_ready_state(ReadyState::HaveCurrentData);
        assert_eq!(player.playback_state(), PlaybackState::Paused);
    }

    #[test]
    fn test_seek_flow_resumes_playing() {
        let (player, client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        player.play();
        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        client.take();

        player.set_current_time(30.0);
        // The engine drops availability while it fetches the new position.
        player.report_ready_state(ReadyState::HaveMetadata);
        assert_eq!(player.playback_state(), PlaybackState::Seeking);
        assert_eq!(player.current_time(), 30.0);
        let log = client.take();
        assert_eq!(log[0], "seeking");
        assert!(log.contains(&"playback:playing->seeking".to_string()));

        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_seek_holds_until_fresh_data_report() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        player.play();
        player.report_ready_state(ReadyState::HaveEnoughData);

        // The pre-seek ready state says nothing about the new position, so
        // the seek stays observable until the engine reports again.
        player.set_current_time(30.0);
        assert_eq!(player.playback_state(), PlaybackState::Seeking);
        player.report_ready_state(ReadyState::HaveMetadata);
        assert_eq!(player.playback_state(), PlaybackState::Seeking);
        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);

        // A fresh report at an unchanged ready level also completes a seek.
        player.set_current_time(10.0);
        assert_eq!(player.playback_state(), PlaybackState::Seeking);
        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_seek_while_paused_returns_to_paused() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Paused);

        player.set_current_time(10.0);
        player.report_ready_state(ReadyState::HaveMetadata);
        assert_eq!(player.playback_state(), PlaybackState::Seeking);
        player.report_ready_state(ReadyState::HaveCurrentData);
        assert_eq!(player.playback_state(), PlaybackState::Paused);
    }

    #[test]
    fn test_waiting_for_key() {
        let (player, client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        player.play();
        player.report_ready_state(ReadyState::HaveEnoughData);
        client.take();

        player.report_waiting_for_key();
        assert_eq!(player.playback_state(), PlaybackState::WaitingForKey);
        assert_eq!(
            client.take(),
            vec!["waiting_for_key", "playback:playing->waiting_for_key"]
        );

        player.report_key_status(true);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_reaching_duration_ends() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(10.0);
        player.play();
        player.report_ready_state(ReadyState::HaveEnoughData);

        player.report_time(9.5);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        player.report_time(10.0);
        assert_eq!(player.playback_state(), PlaybackState::Ended);
    }

    #[test]
    fn test_buffer_exhaustion_is_buffering_not_ended() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(100.0);
        player.play();
        player.report_ready_state(ReadyState::HaveEnoughData);

        // Playhead hits the end of the buffered range, far from duration.
        player.report_ready_state(ReadyState::HaveCurrentData);
        assert_eq!(player.playback_state(), PlaybackState::Buffering);
    }

    #[test]
    fn test_error_is_terminal_until_detach() {
        let (player, client) = player_with_client();
        player.attach_mse();
        player.loaded_metadata(60.0);
        client.take();

        player.report_error("decoder exploded");
        assert_eq!(player.playback_state(), PlaybackState::Errored);
        assert_eq!(
            client.take(),
            vec!["playback:paused->errored", "error:decoder exploded"]
        );

        player.play();
        player.set_current_time(3.0);
        player.report_ready_state(ReadyState::HaveEnoughData);
        player.report_error("again");
        assert_eq!(player.playback_state(), PlaybackState::Errored);
        assert!(client.take().is_empty());

        player.detach();
        assert_eq!(player.ready_state(), ReadyState::NotAttached);
        assert_eq!(player.playback_state(), PlaybackState::Detached);
    }

    #[test]
    fn test_detach_resets_from_any_state() {
        for setup in [
            |_p: &MediaPlayer| {},
            |p: &MediaPlayer| {
                p.loaded_metadata(60.0);
                p.play();
                p.report_ready_state(ReadyState::HaveEnoughData);
            },
            |p: &MediaPlayer| {
                p.loaded_metadata(60.0);
                p.set_current_time(30.0);
            },
            |p: &MediaPlayer| {
                p.report_error("boom");
            },
        ] {
            let (player, _client) = player_with_client();
            player.attach_mse();
            setup(&player);
            player.detach();
            assert_eq!(player.ready_state(), ReadyState::NotAttached);
            assert_eq!(player.playback_state(), PlaybackState::Detached);
            assert_eq!(player.current_time(), 0.0);
            assert!(player.duration().is_infinite());
        }
    }

    #[test]
    fn test_detach_when_detached_is_noop() {
        let (player, client) = player_with_client();
        player.detach();
        assert!(client.take().is_empty());
    }

    #[test]
    fn test_playback_rate_fires_once_per_change() {
        let (player, client) = player_with_client();
        player.attach_mse();
        client.take();

        player.set_playback_rate(2.0);
        player.set_playback_rate(2.0);
        assert_eq!(client.take(), vec!["rate:1->2"]);
        assert_eq!(player.playback_rate(), 2.0);
    }

    #[test]
    fn test_volume_clamped() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        player.set_volume(1.5);
        assert_eq!(player.volume(), 1.0);
        player.set_volume(-0.5);
        assert_eq!(player.volume(), 0.0);
    }

    #[test]
    fn test_mse_buffer_registration() {
        let (player, _client) = player_with_client();
        let stream = Arc::new(ElementaryStream::new());
        // Rejected before MSE attach.
        assert!(!player.add_mse_buffer("video/mp4", true, Arc::clone(&stream)));

        player.attach_mse();
        assert!(player.add_mse_buffer("video/mp4", true, Arc::clone(&stream)));
        assert!(!player.add_mse_buffer("application/pdf", false, Arc::clone(&stream)));
    }

    #[test]
    fn test_buffered_intersects_streams() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        let video = Arc::new(ElementaryStream::new());
        let audio = Arc::new(ElementaryStream::new());
        player.add_mse_buffer("video/mp4", true, Arc::clone(&video));
        player.add_mse_buffer("audio/mp4", false, Arc::clone(&audio));

        video.add_frame(0.0, 4.0);
        audio.add_frame(1.0, 6.0);
        assert_eq!(player.buffered(), vec![BufferedRange::new(1.0, 4.0)]);
    }

    #[test]
    fn test_mse_end_of_stream_sets_duration() {
        let (player, _client) = player_with_client();
        player.attach_mse();
        let stream = Arc::new(ElementaryStream::new());
        player.add_mse_buffer("video/mp4", true, Arc::clone(&stream));
        stream.add_frame(0.0, 8.0);

        player.loaded_metadata(f64::INFINITY);
        player.mse_end_of_stream();
        assert_eq!(player.duration(), 8.0);
    }

    #[test]
    fn test_track_lifecycle_events() {
        let (player, client) = player_with_client();
        player.attach_mse();
        client.take();

        let track = Arc::new(MediaTrack::new(MediaTrackKind::Main, "Main", "en", "a1"));
        player.add_audio_track(Arc::clone(&track));
        // Re-adding the same handle is a no-op.
        player.add_audio_track(Arc::clone(&track));
        assert_eq!(player.audio_tracks().len(), 1);

        player.remove_audio_track(&track);
        player.remove_audio_track(&track);
        assert!(player.audio_tracks().is_empty());
        assert_eq!(client.take(), vec!["add_audio:a1", "remove_audio:a1"]);
    }

    #[test]
    fn test_video_track_lifecycle_events() {
        let (player, client) = player_with_client();
        player.attach_mse();
        client.take();

        let track = Arc::new(MediaTrack::new(MediaTrackKind::Main, "Main", "en", "v1"));
        player.add_video_track(Arc::clone(&track));
        player.add_video_track(Arc::clone(&track));
        assert_eq!(player.video_tracks().len(), 1);

        player.remove_video_track(&track);
        player.remove_video_track(&track);
        assert!(player.video_tracks().is_empty());
        assert_eq!(client.take(), vec!["add_video:v1", "remove_video:v1"]);
    }

    #[test]
    fn test_frame_size_report() {
        let (player, _client) = player_with_client();
        // Ignored before attach.
        player.report_frame_size(1920, 1080);
        assert_eq!(player.width(), 0);
        assert_eq!(player.height(), 0);

        player.attach_mse();
        player.report_frame_size(1920, 1080);
        assert_eq!(player.width(), 1920);
        assert_eq!(player.height(), 1080);

        player.detach();
        assert_eq!(player.width(), 0);
        assert_eq!(player.height(), 0);
    }

    #[test]
    fn test_text_track_lifecycle_events() {
        let (player, client) = player_with_client();
        player.attach_mse();
        client.take();

        let track = player
            .add_text_track(TextTrackKind::Subtitles, "English", "en")
            .unwrap();
        assert_eq!(player.text_tracks().len(), 1);
        player.remove_text_track(&track);
        assert!(player.text_tracks().is_empty());
        assert_eq!(client.take(), vec!["add_text:text-1", "remove_text:text-1"]);
        // The handle outlives the registry.
        assert_eq!(track.kind, TextTrackKind::Subtitles);
    }

    #[test]
    fn test_detach_removes_tracks_with_events() {
        let (player, client) = player_with_client();
        player.attach_mse();
        let track = Arc::new(MediaTrack::new(MediaTrackKind::Main, "Main", "en", "a1"));
        player.add_audio_track(track);
        client.take();

        player.detach();
        let log = client.take();
        assert_eq!(log[0], "remove_audio:a1");
        assert_eq!(log.last().unwrap(), "detach");
    }

    #[test]
    fn test_eme_attach_and_clear() {
        struct NoopEme;
        impl EmeImplementation for NoopEme {
            fn decrypt(&self, data: &[u8]) -> crate::error::Result<Vec<u8>> {
                Ok(data.to_vec())
            }
        }

        let (player, _client) = player_with_client();
        assert!(!player.set_eme_implementation("org.w3.clearkey", Some(Arc::new(NoopEme))));

        player.attach_mse();
        assert!(player.set_eme_implementation("org.w3.clearkey", Some(Arc::new(NoopEme))));
        assert_eq!(player.eme_key_system().as_deref(), Some("org.w3.clearkey"));
        assert!(player.eme_implementation().is_some());

        assert!(player.set_eme_implementation("org.w3.clearkey", None));
        assert!(player.eme_key_system().is_none());
    }

    #[test]
    fn test_autoplay_config() {
        let player = MediaPlayer::with_config(
            Box::new(StubEngine),
            PlayerConfig {
                autoplay: true,
                ..Default::default()
            },
        );
        let client = Arc::new(RecordingClient::default());
        player.add_client(client.clone());

        player.attach_mse();
        assert!(client.take().contains(&"play".to_string()));
        player.loaded_metadata(60.0);
        player.report_ready_state(ReadyState::HaveEnoughData);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_user_events_reach_clients() {
        let (player, client) = player_with_client();
        player.raise_user_event("stats", &json!({"fps": 60}));
        assert_eq!(client.take(), vec!["user:stats"]);
    }

    #[test]
    #[should_panic(expected = "reentrant MediaPlayer call")]
    fn test_reentrant_callback_fails_fast() {
        struct Reentrant {
            player: Mutex<Option<Arc<MediaPlayer>>>,
        }

        impl MediaPlayerClient for Reentrant {
            fn on_play(&self) {
                if let Some(player) = self.player.lock().as_ref() {
                    player.pause();
                }
            }
        }

        let player = MediaPlayer::new(Box::new(StubEngine));
        let client = Arc::new(Reentrant {
            player: Mutex::new(Some(Arc::clone(&player))),
        });
        player.add_client(client);
        player.attach_mse();
        player.loaded_metadata(60.0);
        player.play();
    }

    #[test]
    fn test_decoding_info_delegates_to_engine() {
        let player = MediaPlayer::new(Box::new(StubEngine));
        let mut config = MediaDecodingConfiguration::default();
        config.video.content_type = "video/mp4".into();
        assert!(player.decoding_info(&config).supported);
        config.video.content_type = "application/pdf".into();
        assert!(!player.decoding_info(&config).supported);
    }
}
