//! OpenLore overlay: a writing tracker that follows the word count of the
//! focused text field, anywhere on the desktop.
//!
//! This crate provides the polling tracker, the ambient sound selector and
//! the terminal rendering used by the `openlore` binary.

pub mod ambience;
pub mod audio;
pub mod command;
pub mod config;
pub mod error;
pub mod focus;
pub mod overlay;
pub mod platform;
pub mod state;
pub mod tracker;
pub mod word_count;

pub use ambience::{AmbientSound, SoundPlayer, SoundSelection, SoundSelector};
pub use config::Config;
pub use error::{OverlayError, Result};
pub use focus::{FocusQuery, PermissionOracle};
pub use state::TrackerState;
pub use tracker::{TickOutcome, Tracker};
pub use word_count::word_count_from;
