//! Player event listeners and the broadcast list.
//!
//! [`MediaPlayerClient`] is the listener contract: one callback per state
//! machine transition or registry mutation, each defaulting to a no-op so
//! listeners implement only what they care about. [`ClientList`] is the
//! thread-safe ordered multicast over a set of listeners and itself
//! implements `MediaPlayerClient`, so lists can be nested into a fan-out
//! tree.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::states::{PlaybackState, ReadyState};
use crate::text::TextTrack;
use crate::track::MediaTrack;

/// Listener for media player events.
///
/// Callbacks are invoked synchronously while the player's internal lock is
/// held and can arrive on any thread. A callback must not call back into the
/// player (or anything else that takes the player's lock); doing so is a
/// contract violation that the player fails fast on when it can detect it.
#[allow(unused_variables)]
pub trait MediaPlayerClient: Send + Sync {
    /// Called when an audio track is added to the player.
    fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {}

    /// Called when an audio track is removed from the player.
    fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {}

    /// Called when a video track is added to the player.
    fn on_add_video_track(&self, track: &Arc<MediaTrack>) {}

    /// Called when a video track is removed from the player.
    fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {}

    /// Called when a text track is added to the player.
    fn on_add_text_track(&self, track: &Arc<TextTrack>) {}

    /// Called when a text track is removed from the player.
    fn on_remove_text_track(&self, track: &Arc<TextTrack>) {}

    /// Called once per actual ready-state change.
    fn on_ready_state_changed(&self, old_state: ReadyState, new_state: ReadyState) {}

    /// Called once per actual playback-state change.
    fn on_playback_state_changed(&self, old_state: PlaybackState, new_state: PlaybackState) {}

    /// Called when the playback rate changes.
    fn on_playback_rate_changed(&self, old_rate: f64, new_rate: f64) {}

    /// Called when an unrecoverable error happens during playback. The
    /// message may be empty.
    fn on_error(&self, error: &str) {}

    /// Called when MSE-based playback has been attached. The media is not
    /// loaded yet.
    fn on_attach_mse(&self) {}

    /// Called when src= content has been attached. The content may not be
    /// loaded yet.
    fn on_attach_source(&self) {}

    /// Called when playback has stopped and the content has been unloaded.
    fn on_detach(&self) {}

    /// Called when playback starts after startup or a pause. Distinct from
    /// entering the `Playing` state.
    fn on_play(&self) {}

    /// Called when a seek starts. May fire multiple times while in the
    /// `Seeking` state if there are multiple seeks.
    fn on_seeking(&self) {}

    /// Called when playback stops for lack of a decryption key. Fires once
    /// per missing key, and again if new keys arrive without the required
    /// one.
    fn on_waiting_for_key(&self) {}

    /// Called when a user-defined event is raised. Engines may use this to
    /// pass data to listeners without extending the contract; library
    /// listeners ignore events they don't recognize.
    fn on_user_event(&self, name: &str, data: &serde_json::Value) {}
}

/// A thread-safe, ordered collection of clients that is itself a client.
///
/// Delivery order equals registration order at the time of the event. The
/// list is snapshotted before fan-out: a client removed mid-broadcast may
/// still receive the in-flight event, but receives nothing raised after its
/// removal.
#[derive(Default)]
pub struct ClientList {
    clients: Mutex<Vec<Arc<dyn MediaPlayerClient>>>,
}

impl ClientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client. Adding an already-registered client (same handle)
    /// is a no-op, so a client never receives an event twice.
    pub fn add_client(&self, client: Arc<dyn MediaPlayerClient>) {
        let mut clients = self.clients.lock();
        if !clients.iter().any(|c| Arc::ptr_eq(c, &client)) {
            clients.push(client);
        }
    }

    /// Removes a client. Removing an unregistered client is a no-op.
    pub fn remove_client(&self, client: &Arc<dyn MediaPlayerClient>) {
        self.clients.lock().retain(|c| !Arc::ptr_eq(c, client));
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Delivers an event to every registered client, in registration order.
    fn each(&self, f: impl Fn(&dyn MediaPlayerClient)) {
        let snapshot = self.clients.lock().clone();
        for client in &snapshot {
            f(client.as_ref());
        }
    }
}

impl MediaPlayerClient for ClientList {
    fn on_add_audio_track(&self, track: &Arc<MediaTrack>) {
        self.each(|c| c.on_add_audio_track(track));
    }

    fn on_remove_audio_track(&self, track: &Arc<MediaTrack>) {
        self.each(|c| c.on_remove_audio_track(track));
    }

    fn on_add_video_track(&self, track: &Arc<MediaTrack>) {
        self.each(|c| c.on_add_video_track(track));
    }

    fn on_remove_video_track(&self, track: &Arc<MediaTrack>) {
        self.each(|c| c.on_remove_video_track(track));
    }

    fn on_add_text_track(&self, track: &Arc<TextTrack>) {
        self.each(|c| c.on_add_text_track(track));
    }

    fn on_remove_text_track(&self, track: &Arc<TextTrack>) {
        self.each(|c| c.on_remove_text_track(track));
    }

    fn on_ready_state_changed(&self, old_state: ReadyState, new_state: ReadyState) {
        self.each(|c| c.on_ready_state_changed(old_state, new_state));
    }

    fn on_playback_state_changed(&self, old_state: PlaybackState, new_state: PlaybackState) {
        self.each(|c| c.on_playback_state_changed(old_state, new_state));
    }

    fn on_playback_rate_changed(&self, old_rate: f64, new_rate: f64) {
        self.each(|c| c.on_playback_rate_changed(old_rate, new_rate));
    }

    fn on_error(&self, error: &str) {
        self.each(|c| c.on_error(error));
    }

    fn on_attach_mse(&self) {
        self.each(|c| c.on_attach_mse());
    }

    fn on_attach_source(&self) {
        self.each(|c| c.on_attach_source());
    }

    fn on_detach(&self) {
        self.each(|c| c.on_detach());
    }

    fn on_play(&self) {
        self.each(|c| c.on_play());
    }

    fn on_seeking(&self) {
        self.each(|c| c.on_seeking());
    }

    fn on_waiting_for_key(&self) {
        self.each(|c| c.on_waiting_for_key());
    }

    fn on_user_event(&self, name: &str, data: &serde_json::Value) {
        self.each(|c| c.on_user_event(name, data));
    }
}
