//! Ambient sound selection: at most one looping background track.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{OverlayError, Result};

/// The fixed catalog of ambient tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientSound {
    Rain,
    Ocean,
    Forest,
    Dreams,
}

impl AmbientSound {
    pub const ALL: [AmbientSound; 4] = [
        AmbientSound::Rain,
        AmbientSound::Ocean,
        AmbientSound::Forest,
        AmbientSound::Dreams,
    ];

    /// Name shown on the overlay
    pub fn name(self) -> &'static str {
        match self {
            AmbientSound::Rain => "Rain",
            AmbientSound::Ocean => "Ocean",
            AmbientSound::Forest => "Forest",
            AmbientSound::Dreams => "Dreams",
        }
    }

    /// Audio file name without extension
    pub fn file_stem(self) -> &'static str {
        match self {
            AmbientSound::Rain => "rain",
            AmbientSound::Ocean => "ocean",
            AmbientSound::Forest => "forest",
            AmbientSound::Dreams => "dreams",
        }
    }
}

impl fmt::Display for AmbientSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AmbientSound {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self> {
        AmbientSound::ALL
            .into_iter()
            .find(|sound| sound.file_stem().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OverlayError::InvalidCommand(format!("unknown sound '{}'", s.trim())))
    }
}

/// Which sound is active, if any. Playing exactly when a sound is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SoundSelection {
    current_sound: Option<AmbientSound>,
}

impl SoundSelection {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn playing(sound: AmbientSound) -> Self {
        Self {
            current_sound: Some(sound),
        }
    }

    pub fn current_sound(&self) -> Option<AmbientSound> {
        self.current_sound
    }

    pub fn is_playing(&self) -> bool {
        self.current_sound.is_some()
    }
}

/// Audio output for ambient tracks.
///
/// `play` starts the sound looping forever at the player's volume. `stop`
/// silences whatever is playing and must be safe to call when idle.
pub trait SoundPlayer {
    fn play(&mut self, sound: AmbientSound) -> Result<()>;
    fn stop(&mut self);
}

/// Toggle state machine over a [`SoundPlayer`]
pub struct SoundSelector<P: SoundPlayer> {
    player: P,
    selection: watch::Sender<SoundSelection>,
}

impl<P: SoundPlayer> SoundSelector<P> {
    pub fn new(player: P) -> Self {
        let (selection, _) = watch::channel(SoundSelection::idle());
        Self { player, selection }
    }

    pub fn subscribe(&self) -> watch::Receiver<SoundSelection> {
        self.selection.subscribe()
    }

    pub fn selection(&self) -> SoundSelection {
        *self.selection.borrow()
    }

    /// Start `sound`, or stop it if it is already the active one. Switching
    /// sounds stops the old one before starting the new one. A sound that
    /// fails to load leaves the selector idle; the failure is only logged.
    pub fn toggle(&mut self, sound: AmbientSound) -> SoundSelection {
        let current = self.selection().current_sound();

        if current == Some(sound) {
            info!("Stopping {}", sound);
            self.player.stop();
            self.publish(SoundSelection::idle());
            return self.selection();
        }

        if let Some(previous) = current {
            info!("Switching from {} to {}", previous, sound);
            self.player.stop();
            self.publish(SoundSelection::idle());
        }

        match self.player.play(sound) {
            Ok(()) => {
                info!("Playing {}", sound);
                self.publish(SoundSelection::playing(sound));
            }
            Err(e) => {
                warn!("Could not play {}: {}", sound, e);
            }
        }
        self.selection()
    }

    /// Stop playback at teardown
    pub fn shutdown(&mut self) {
        if self.selection().is_playing() {
            self.player.stop();
            self.publish(SoundSelection::idle());
        }
    }

    fn publish(&self, selection: SoundSelection) {
        self.selection.send_if_modified(|current| {
            let changed = *current != selection;
            *current = selection;
            changed
        });
    }
}
