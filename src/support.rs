//! Routing capability queries without a player in hand.
//!
//! Format support lives on the engine, so answering "can this content play"
//! requires some player instance, even though the answer is the same for all
//! of them. A [`SupportCheckRegistry`] tracks live players and routes
//! queries: to an explicitly designated player if one is set and alive,
//! otherwise to any registered instance still alive. Registration holds weak
//! handles only, so the registry never keeps a player alive.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::capabilities::{MediaCapabilitiesInfo, MediaDecodingConfiguration};
use crate::error::{Error, Result};
use crate::player::MediaPlayer;

#[derive(Default)]
struct RegistryState {
    designated: Option<Weak<MediaPlayer>>,
    instances: Vec<Weak<MediaPlayer>>,
}

#[derive(Default)]
pub struct SupportCheckRegistry {
    state: Mutex<RegistryState>,
}

fn is_same(weak: &Weak<MediaPlayer>, player: &Arc<MediaPlayer>) -> bool {
    std::ptr::eq(weak.as_ptr(), Arc::as_ptr(player))
}

impl SupportCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a player available for support checks. Registering the same
    /// player twice has no effect.
    pub fn register(&self, player: &Arc<MediaPlayer>) {
        let mut state = self.state.lock();
        if !state.instances.iter().any(|w| is_same(w, player)) {
            state.instances.push(Arc::downgrade(player));
        }
    }

    /// Removes a player from the registry. A no-op for unregistered
    /// players; a designated player that is unregistered stays designated.
    pub fn unregister(&self, player: &Arc<MediaPlayer>) {
        let mut state = self.state.lock();
        state.instances.retain(|w| !is_same(w, player));
    }

    /// Designates the preferred player for support checks, or clears the
    /// designation with `None`.
    pub fn set_player_for_support_checks(&self, player: Option<&Arc<MediaPlayer>>) {
        self.state.lock().designated = player.map(Arc::downgrade);
    }

    /// The designated player, if it is still alive.
    pub fn player_for_support_checks(&self) -> Option<Arc<MediaPlayer>> {
        self.state.lock().designated.as_ref().and_then(Weak::upgrade)
    }

    /// Answers whether the given content can be decoded, routing through the
    /// designated player or any live registered instance. Fails only when no
    /// live player is available.
    pub fn decoding_info(
        &self,
        config: &MediaDecodingConfiguration,
    ) -> Result<MediaCapabilitiesInfo> {
        let player = {
            let mut state = self.state.lock();
            state.instances.retain(|w| w.strong_count() > 0);
            state
                .designated
                .as_ref()
                .and_then(Weak::upgrade)
                .or_else(|| state.instances.iter().find_map(Weak::upgrade))
        };
        match player {
            Some(player) => Ok(player.decoding_info(config)),
            None => Err(Error::NoSupportCheckPlayer),
        }
    }
}
