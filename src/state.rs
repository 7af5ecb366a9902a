use chrono::{DateTime, Utc};
use serde::Serialize;

/// Smallest accepted writing goal
pub const MIN_GOAL_WORDS: u32 = 100;
/// Largest accepted writing goal
pub const MAX_GOAL_WORDS: u32 = 10_000;
/// Goal used at every startup; goals are not persisted
pub const DEFAULT_GOAL_WORDS: u32 = 2_000;

/// Clamp a requested goal into the accepted range
pub fn clamp_goal(requested: i64) -> u32 {
    requested.clamp(MIN_GOAL_WORDS as i64, MAX_GOAL_WORDS as i64) as u32
}

/// Snapshot of everything the overlay shows about the writing session.
///
/// `page_count` and `progress` are derived from `word_count` and `goal_words`
/// and are only written through [`TrackerState::set_word_count`] and
/// [`TrackerState::set_goal`], which recompute both together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerState {
    pub word_count: usize,
    pub goal_words: u32,
    pub page_count: f64,
    pub progress: f64,
    pub focus_minutes: u32,
    pub has_accessibility_permission: bool,
    /// Incremented on every committed change
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    words_per_page: f64,
}

impl TrackerState {
    /// Create the startup state: no words, default goal
    pub fn new(words_per_page: f64) -> Self {
        Self {
            word_count: 0,
            goal_words: DEFAULT_GOAL_WORDS,
            page_count: 0.0,
            progress: 0.0,
            focus_minutes: 0,
            has_accessibility_permission: false,
            revision: 0,
            updated_at: Utc::now(),
            words_per_page,
        }
    }

    pub fn set_word_count(&mut self, count: usize) {
        self.word_count = count;
        self.recompute();
    }

    /// Store a clamped goal and return the stored value
    pub fn set_goal(&mut self, requested: i64) -> u32 {
        self.goal_words = clamp_goal(requested);
        self.recompute();
        self.goal_words
    }

    /// Mark the current contents as a new committed revision
    pub fn commit(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    fn recompute(&mut self) {
        self.page_count = self.word_count as f64 / self.words_per_page;
        self.progress = (self.word_count as f64 / self.goal_words as f64).min(1.0);
    }

    /// Whole percent of the goal reached, capped at 100
    pub fn percent(&self) -> u8 {
        ((self.progress * 100.0) as u32).min(100) as u8
    }

    /// Words still needed to reach the goal
    pub fn remaining_words(&self) -> usize {
        (self.goal_words as usize).saturating_sub(self.word_count)
    }

    pub fn goal_reached(&self) -> bool {
        self.progress >= 1.0
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(300.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_state() {
        let state = TrackerState::default();
        assert_eq!(state.word_count, 0);
        assert_eq!(state.goal_words, 2000);
        assert_eq!(state.page_count, 0.0);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.revision, 0);
    }

    #[test]
    fn test_goal_is_clamped() {
        let mut state = TrackerState::default();
        assert_eq!(state.set_goal(50), 100);
        assert_eq!(state.set_goal(999_999), 10_000);
        assert_eq!(state.set_goal(5_000), 5_000);
        assert_eq!(state.set_goal(-3), 100);
    }

    #[test]
    fn test_derived_values_follow_word_count() {
        let mut state = TrackerState::default();
        state.set_word_count(600);
        assert_eq!(state.page_count, 2.0);
        assert_eq!(state.progress, 0.3);

        state.set_word_count(450);
        assert_eq!(state.page_count, 1.5);
    }

    #[test]
    fn test_progress_is_capped_at_one() {
        let mut state = TrackerState::default();
        state.set_goal(100);
        state.set_word_count(1_000);
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.percent(), 100);
        assert!(state.goal_reached());
        assert_eq!(state.remaining_words(), 0);
    }

    #[test]
    fn test_goal_change_recomputes_progress() {
        let mut state = TrackerState::default();
        state.set_word_count(500);
        assert_eq!(state.progress, 0.25);
        state.set_goal(1_000);
        assert_eq!(state.progress, 0.5);
        assert_eq!(state.page_count, 500.0 / 300.0);
    }

    #[test]
    fn test_percent_and_remaining() {
        let mut state = TrackerState::default();
        state.set_word_count(1_333);
        assert_eq!(state.percent(), 66);
        assert_eq!(state.remaining_words(), 667);
        assert!(!state.goal_reached());
    }

    #[test]
    fn test_commit_bumps_revision() {
        let mut state = TrackerState::default();
        state.commit();
        state.commit();
        assert_eq!(state.revision, 2);
    }
}
