//! Text tracks and timed cues.
//!
//! A [`TextTrack`] is an internally thread-safe list of [`Cue`] objects plus
//! a display mode. Cue mutations are multicast to registered
//! [`TextTrackClient`] listeners with the same ordering and idempotence rules
//! as the player-level client list.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The purpose of a text track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTrackKind {
    /// Transcriptions of dialogue, for when audio is available but not
    /// understood.
    Subtitles,
    /// Dialogue and sound effects, for the deaf.
    Captions,
    /// Textual descriptions of the video, for the blind.
    Descriptions,
    /// Chapter titles, for navigation.
    Chapters,
    /// Content for scripts, never displayed.
    Metadata,
}

impl fmt::Display for TextTrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subtitles => "subtitles",
            Self::Captions => "captions",
            Self::Descriptions => "descriptions",
            Self::Chapters => "chapters",
            Self::Metadata => "metadata",
        };
        write!(f, "{name}")
    }
}

/// Whether a text track is processed and/or displayed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTrackMode {
    /// Completely ignored.
    #[default]
    Disabled,
    /// Active, cue events fire, nothing is displayed.
    Hidden,
    /// Active and visible.
    Showing,
}

/// A single timed text cue. The cue is active for times in
/// `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl Cue {
    pub fn new(id: impl Into<String>, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Whether the cue should be displayed at the given media time.
    pub fn is_active(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// Listener for cue mutations on a single text track.
///
/// Callbacks run synchronously with the track's internal lock held; a
/// callback must not call back into the track.
pub trait TextTrackClient: Send + Sync {
    /// Called when a cue is added to the track.
    fn on_cue_added(&self, cue: &Arc<Cue>) {
        let _ = cue;
    }

    /// Called when a cue is removed from the track.
    fn on_cue_removed(&self, cue: &Arc<Cue>) {
        let _ = cue;
    }
}

/// A text track holding timed cues.
///
/// Identity is the `id` string; descriptive fields are immutable. The cue
/// list and mode are internally synchronized, so shared handles can be used
/// from any thread.
pub struct TextTrack {
    /// The id string of the track.
    pub id: String,
    /// The kind of the track.
    pub kind: TextTrackKind,
    /// The label string of the track.
    pub label: String,
    /// The language string of the track.
    pub language: String,
    mode: RwLock<TextTrackMode>,
    cues: RwLock<Vec<Arc<Cue>>>,
    clients: Mutex<Vec<Arc<dyn TextTrackClient>>>,
}

impl TextTrack {
    pub fn new(
        kind: TextTrackKind,
        label: impl Into<String>,
        language: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            language: language.into(),
            mode: RwLock::new(TextTrackMode::default()),
            cues: RwLock::new(Vec::new()),
            clients: Mutex::new(Vec::new()),
        }
    }

    /// The current display mode.
    pub fn mode(&self) -> TextTrackMode {
        *self.mode.read()
    }

    /// Sets the display mode.
    pub fn set_mode(&self, mode: TextTrackMode) {
        *self.mode.write() = mode;
    }

    /// All cues in the track, in insertion order.
    pub fn cues(&self) -> Vec<Arc<Cue>> {
        self.cues.read().clone()
    }

    /// The cues that should be displayed at the given media time.
    pub fn active_cues(&self, time: f64) -> Vec<Arc<Cue>> {
        self.cues
            .read()
            .iter()
            .filter(|cue| cue.is_active(time))
            .cloned()
            .collect()
    }

    /// The next media time at which the active cue list changes, or infinity
    /// if nothing starts or ends after `time`. Lets the host delay polling
    /// until something is expected to change.
    pub fn next_cue_change_time(&self, time: f64) -> f64 {
        let mut next = f64::INFINITY;
        for cue in self.cues.read().iter() {
            if cue.start_time > time && cue.start_time < next {
                next = cue.start_time;
            }
            if cue.end_time > time && cue.end_time < next {
                next = cue.end_time;
            }
        }
        next
    }

    /// Adds a cue to the track and notifies clients.
    pub fn add_cue(&self, cue: Arc<Cue>) {
        self.cues.write().push(Arc::clone(&cue));
        for client in self.clients_snapshot() {
            client.on_cue_added(&cue);
        }
    }

    /// Removes a cue (by handle identity) and notifies clients. Removing a
    /// cue that is not present is a no-op.
    pub fn remove_cue(&self, cue: &Arc<Cue>) {
        let removed = {
            let mut cues = self.cues.write();
            let before = cues.len();
            cues.retain(|c| !Arc::ptr_eq(c, cue));
            cues.len() < before
        };
        if removed {
            for client in self.clients_snapshot() {
                client.on_cue_removed(cue);
            }
        }
    }

    /// Registers a client. Adding an already-registered client is a no-op.
    pub fn add_client(&self, client: Arc<dyn TextTrackClient>) {
        let mut clients = self.clients.lock();
        if !clients.iter().any(|c| Arc::ptr_eq(c, &client)) {
            clients.push(client);
        }
    }

    /// Removes a client. Removing an unregistered client is a no-op.
    pub fn remove_client(&self, client: &Arc<dyn TextTrackClient>) {
        self.clients.lock().retain(|c| !Arc::ptr_eq(c, client));
    }

    fn clients_snapshot(&self) -> Vec<Arc<dyn TextTrackClient>> {
        self.clients.lock().clone()
    }
}

impl fmt::Debug for TextTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("language", &self.language)
            .field("mode", &self.mode())
            .field("cues", &self.cues.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        log: Mutex<Vec<String>>,
    }

    impl TextTrackClient for RecordingClient {
        fn on_cue_added(&self, cue: &Arc<Cue>) {
            self.log.lock().push(format!("add:{}", cue.id));
        }

        fn on_cue_removed(&self, cue: &Arc<Cue>) {
            self.log.lock().push(format!("remove:{}", cue.id));
        }
    }

    fn track() -> TextTrack {
        TextTrack::new(TextTrackKind::Subtitles, "English", "en", "text-1")
    }

    #[test]
    fn test_mode_round_trip() {
        let track = track();
        assert_eq!(track.mode(), TextTrackMode::Disabled);
        track.set_mode(TextTrackMode::Showing);
        assert_eq!(track.mode(), TextTrackMode::Showing);
    }

    #[test]
    fn test_active_cues_window() {
        let track = track();
        track.add_cue(Arc::new(Cue::new("a", 0.0, 2.0, "first")));
        track.add_cue(Arc::new(Cue::new("b", 1.5, 4.0, "second")));

        let at = |t: f64| {
            track
                .active_cues(t)
                .iter()
                .map(|c| c.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(at(0.0), vec!["a"]);
        assert_eq!(at(1.75), vec!["a", "b"]);
        // End time is exclusive.
        assert_eq!(at(2.0), vec!["b"]);
        assert!(at(4.0).is_empty());
    }

    #[test]
    fn test_next_cue_change_time() {
        let track = track();
        track.add_cue(Arc::new(Cue::new("a", 1.0, 2.0, "")));
        track.add_cue(Arc::new(Cue::new("b", 5.0, 7.0, "")));

        assert_eq!(track.next_cue_change_time(0.0), 1.0);
        assert_eq!(track.next_cue_change_time(1.0), 2.0);
        assert_eq!(track.next_cue_change_time(2.0), 5.0);
        assert_eq!(track.next_cue_change_time(7.0), f64::INFINITY);
    }

    #[test]
    fn test_cue_events_fire_once_each() {
        let track = track();
        let client: Arc<RecordingClient> = Arc::new(RecordingClient::default());
        track.add_client(client.clone());
        // Double registration must not double delivery.
        track.add_client(client.clone());

        let cue = Arc::new(Cue::new("a", 0.0, 1.0, "hi"));
        track.add_cue(Arc::clone(&cue));
        track.remove_cue(&cue);
        // Removing again is a no-op.
        track.remove_cue(&cue);

        assert_eq!(*client.log.lock(), vec!["add:a", "remove:a"]);
        assert!(track.cues().is_empty());
    }
}
