//! Terminal rendering of the overlay.

use colored::Colorize;
use serde::Serialize;

use crate::ambience::{AmbientSound, SoundSelection};
use crate::state::TrackerState;

const BAR_WIDTH: usize = 20;

pub const PERMISSION_HINT: &str = "Accessibility permission required: grant access in \
System Settings > Privacy & Security > Accessibility";

/// Progress bar of `BAR_WIDTH` cells
fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// One status line: bar, words against goal, percent, pages, focus minutes
/// and the active sound.
pub fn render_status(state: &TrackerState, sound: SoundSelection) -> String {
    if !state.has_accessibility_permission {
        return format!("{} {}", "⚠".yellow(), PERMISSION_HINT.yellow());
    }

    let bar = progress_bar(state.progress);
    let bar = if state.goal_reached() {
        bar.green()
    } else {
        bar.blue()
    };

    let mut line = format!(
        "{} {} / {}  {}% • {:.1} pg • {}m",
        bar,
        state.word_count.to_string().bold(),
        state.goal_words,
        state.percent(),
        state.page_count,
        state.focus_minutes
    );

    if let Some(current) = sound.current_sound() {
        line.push_str(&format!("  {}", format!("♪ {}", current).cyan()));
    }
    line
}

#[derive(Serialize)]
struct Frame<'a> {
    #[serde(flatten)]
    tracker: &'a TrackerState,
    percent: u8,
    remaining_words: usize,
    sound: Option<AmbientSound>,
    sound_playing: bool,
}

/// The same information as one JSON object, for piping into other tools
pub fn render_json(state: &TrackerState, sound: SoundSelection) -> serde_json::Result<String> {
    serde_json::to_string(&Frame {
        tracker: state,
        percent: state.percent(),
        remaining_words: state.remaining_words(),
        sound: sound.current_sound(),
        sound_playing: sound.is_playing(),
    })
}
