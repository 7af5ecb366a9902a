//! The writing tracker: two periodic ticks feeding one observable state.
//!
//! The word-count tick reads the focused control once per poll interval and
//! commits only when the count changed. The focus tick adds a minute per
//! focus interval. Every mutation goes through a single `watch` sender, so an
//! observer never sees a word count without its matching page count and
//! progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::focus::{read_focused_text, FocusQuery, PermissionOracle};
use crate::state::TrackerState;
use crate::word_count::word_count_from;

/// What a single word-count tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Permission is missing; the count was forced to zero
    PermissionDenied,
    /// A new count (or permission flag) was committed
    Committed(usize),
    /// The count matched the stored one; nothing was published
    Unchanged,
    /// The focus query exceeded its timeout; nothing was published
    TimedOut,
}

struct Timers {
    word_count: JoinHandle<()>,
    focus: JoinHandle<()>,
}

impl Timers {
    fn abort(self) {
        self.word_count.abort();
        self.focus.abort();
    }
}

/// Live word count, goal progress and focus time for the focused text field
pub struct Tracker {
    config: TrackerConfig,
    permission: Arc<dyn PermissionOracle>,
    focus: Arc<dyn FocusQuery>,
    state: watch::Sender<TrackerState>,
    timers: Mutex<Option<Timers>>,
    /// Cleared under the state lock by `stop`; scheduled ticks commit only
    /// while it is set
    ticking: AtomicBool,
}

impl Tracker {
    /// Create a stopped tracker with the startup state
    pub fn new(
        config: TrackerConfig,
        permission: Arc<dyn PermissionOracle>,
        focus: Arc<dyn FocusQuery>,
    ) -> Arc<Self> {
        let mut initial = TrackerState::new(config.words_per_page);
        initial.has_accessibility_permission = permission.is_trusted();
        let (state, _) = watch::channel(initial);

        Arc::new(Self {
            config,
            permission,
            focus,
            state,
            timers: Mutex::new(None),
            ticking: AtomicBool::new(false),
        })
    }

    /// Register an observer; it is notified after every commit
    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_timers().is_some()
    }

    /// Start the word-count and focus ticks. Calling this on a running
    /// tracker does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut timers = self.lock_timers();
        if timers.is_some() {
            debug!("tracker already running");
            return;
        }

        let poll = self.config.poll_interval();
        let minute = self.config.focus_interval();
        info!(
            "Starting tracker (poll every {:?}, focus minute every {:?})",
            poll, minute
        );

        self.ticking.store(true, Ordering::SeqCst);
        let word_count = spawn_ticker(Arc::downgrade(self), poll, |tracker| async move {
            tracker.poll_word_count(true).await;
        });
        let focus = spawn_ticker(Arc::downgrade(self), minute, |tracker| async move {
            tracker.add_focus_minute(true);
        });

        *timers = Some(Timers { word_count, focus });
    }

    /// Cancel both ticks. No tick commits anything after this returns; only
    /// explicit user commands still change the state.
    pub fn stop(&self) {
        if let Some(timers) = self.lock_timers().take() {
            timers.abort();
            // Taking the state lock waits out a commit already in progress.
            self.state.send_if_modified(|_| {
                self.ticking.store(false, Ordering::SeqCst);
                false
            });
            info!("Tracker stopped");
        }
    }

    /// One word-count poll
    pub async fn tick_wordcount(&self) -> TickOutcome {
        self.poll_word_count(false).await
    }

    /// One elapsed focus minute
    pub fn tick_focus(&self) {
        self.add_focus_minute(false);
    }

    /// Whether a commit may proceed; called with the state lock held
    fn may_commit(&self, scheduled: bool) -> bool {
        !scheduled || self.ticking.load(Ordering::SeqCst)
    }

    async fn poll_word_count(&self, scheduled: bool) -> TickOutcome {
        if !self.permission.is_trusted() {
            self.state.send_if_modified(|s| {
                if !self.may_commit(scheduled) {
                    return false;
                }
                s.has_accessibility_permission = false;
                s.set_word_count(0);
                s.commit();
                true
            });
            return TickOutcome::PermissionDenied;
        }

        let query = read_focused_text(self.focus.as_ref());
        let text = match tokio::time::timeout(self.config.query_timeout(), query).await {
            Ok(text) => text,
            Err(_) => {
                debug!(
                    "focus query exceeded {:?}, skipping tick",
                    self.config.query_timeout()
                );
                return TickOutcome::TimedOut;
            }
        };

        let count = text.as_deref().map(word_count_from).unwrap_or(0);

        let committed = self.state.send_if_modified(|s| {
            if !self.may_commit(scheduled) {
                return false;
            }
            let mut changed = false;
            if !s.has_accessibility_permission {
                s.has_accessibility_permission = true;
                changed = true;
            }
            if s.word_count != count {
                s.set_word_count(count);
                changed = true;
            }
            if changed {
                s.commit();
            }
            changed
        });

        if committed {
            debug!("word count now {}", count);
            TickOutcome::Committed(count)
        } else {
            TickOutcome::Unchanged
        }
    }

    fn add_focus_minute(&self, scheduled: bool) {
        self.state.send_if_modified(|s| {
            if !self.may_commit(scheduled) {
                return false;
            }
            s.focus_minutes += 1;
            s.commit();
            true
        });
    }

    /// Set the writing goal, clamped to 100..=10000. Returns the stored goal.
    pub fn update_goal(&self, new_goal: i64) -> u32 {
        let mut stored = 0;
        self.state.send_modify(|s| {
            stored = s.set_goal(new_goal);
            s.commit();
        });
        if stored as i64 != new_goal {
            debug!("goal {} clamped to {}", new_goal, stored);
        }
        stored
    }

    /// Zero the focus-minute counter
    pub fn reset_timer(&self) {
        self.state.send_modify(|s| {
            s.focus_minutes = 0;
            s.commit();
        });
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, Option<Timers>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if let Some(timers) = self.lock_timers().take() {
            timers.abort();
        }
    }
}

/// Run `tick` every `period`, starting one period from now. The task ends
/// once the tracker is gone. A slow tick delays the next one instead of
/// letting firings pile up.
fn spawn_ticker<F, Fut>(tracker: Weak<Tracker>, period: Duration, tick: F) -> JoinHandle<()>
where
    F: Fn(Arc<Tracker>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(tracker) = tracker.upgrade() else {
                break;
            };
            tick(tracker).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Permission oracle whose answer can be flipped mid-test
    struct MockPermission(AtomicBool);

    impl MockPermission {
        fn new(trusted: bool) -> Arc<Self> {
            Arc::new(Self(AtomicBool::new(trusted)))
        }

        fn set(&self, trusted: bool) {
            self.0.store(trusted, Ordering::SeqCst);
        }
    }

    impl PermissionOracle for MockPermission {
        fn is_trusted(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Focus query returning canned text and counting calls
    #[derive(Default)]
    struct MockFocus {
        value: Mutex<Option<String>>,
        selected: Mutex<Option<String>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockFocus {
        fn with_value(text: &str) -> Arc<Self> {
            let focus = Self::default();
            focus.set_value(Some(text));
            Arc::new(focus)
        }

        fn set_value(&self, text: Option<&str>) {
            *self.value.lock().unwrap() = text.map(str::to_string);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FocusQuery for MockFocus {
        async fn focused_text(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.value.lock().unwrap().clone()
        }

        async fn focused_selected_text(&self) -> Option<String> {
            self.selected.lock().unwrap().clone()
        }
    }

    fn tracker(permission: Arc<MockPermission>, focus: Arc<MockFocus>) -> Arc<Tracker> {
        Tracker::new(TrackerConfig::default(), permission, focus)
    }

    #[tokio::test]
    async fn test_tick_counts_words_and_derives_metrics() {
        let focus = MockFocus::with_value("one two three four five six");
        let tracker = tracker(MockPermission::new(true), focus);

        assert_eq!(tracker.tick_wordcount().await, TickOutcome::Committed(6));

        let state = tracker.snapshot();
        assert_eq!(state.word_count, 6);
        assert_eq!(state.page_count, 6.0 / 300.0);
        assert_eq!(state.progress, 6.0 / 2000.0);
        assert!(state.has_accessibility_permission);
    }

    #[tokio::test]
    async fn test_same_text_does_not_commit_twice() {
        let focus = MockFocus::with_value("the same words");
        let tracker = tracker(MockPermission::new(true), focus.clone());

        tracker.tick_wordcount().await;
        let first = tracker.snapshot();

        assert_eq!(tracker.tick_wordcount().await, TickOutcome::Unchanged);
        let second = tracker.snapshot();
        assert_eq!(second.revision, first.revision);
        assert_eq!(second.updated_at, first.updated_at);
        assert_eq!(focus.calls(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_tick_does_not_notify_observers() {
        let focus = MockFocus::with_value("steady");
        let tracker = tracker(MockPermission::new(true), focus);
        let mut rx = tracker.subscribe();

        tracker.tick_wordcount().await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        tracker.tick_wordcount().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_no_permission_forces_zero_without_querying() {
        let permission = MockPermission::new(true);
        let focus = MockFocus::with_value("a few words here");
        let tracker = tracker(permission.clone(), focus.clone());

        tracker.tick_wordcount().await;
        assert_eq!(tracker.snapshot().word_count, 4);

        permission.set(false);
        assert_eq!(
            tracker.tick_wordcount().await,
            TickOutcome::PermissionDenied
        );

        let state = tracker.snapshot();
        assert_eq!(state.word_count, 0);
        assert_eq!(state.page_count, 0.0);
        assert_eq!(state.progress, 0.0);
        assert!(!state.has_accessibility_permission);
        assert_eq!(focus.calls(), 1);
    }

    #[tokio::test]
    async fn test_permission_regained_is_committed_even_at_zero() {
        let permission = MockPermission::new(false);
        let focus = Arc::new(MockFocus::default());
        let tracker = tracker(permission.clone(), focus);

        tracker.tick_wordcount().await;
        assert!(!tracker.snapshot().has_accessibility_permission);

        permission.set(true);
        assert_eq!(tracker.tick_wordcount().await, TickOutcome::Committed(0));
        assert!(tracker.snapshot().has_accessibility_permission);
    }

    #[tokio::test]
    async fn test_selected_text_fallback() {
        let focus = Arc::new(MockFocus::default());
        *focus.selected.lock().unwrap() = Some("just the selection".to_string());
        let tracker = tracker(MockPermission::new(true), focus);

        assert_eq!(tracker.tick_wordcount().await, TickOutcome::Committed(3));
    }

    #[tokio::test]
    async fn test_query_miss_counts_as_zero() {
        let focus = MockFocus::with_value("some words");
        let tracker = tracker(MockPermission::new(true), focus.clone());
        tracker.tick_wordcount().await;

        focus.set_value(None);
        assert_eq!(tracker.tick_wordcount().await, TickOutcome::Committed(0));
        assert_eq!(tracker.snapshot().word_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_query_times_out_without_commit() {
        let focus = Arc::new(MockFocus {
            delay: Some(Duration::from_secs(10)),
            ..MockFocus::default()
        });
        focus.set_value(Some("never seen"));
        let tracker = tracker(MockPermission::new(true), focus);
        let before = tracker.snapshot().revision;

        assert_eq!(tracker.tick_wordcount().await, TickOutcome::TimedOut);
        assert_eq!(tracker.snapshot().revision, before);
        assert_eq!(tracker.snapshot().word_count, 0);
    }

    #[tokio::test]
    async fn test_update_goal_clamps_and_recomputes() {
        let focus = MockFocus::with_value(&"word ".repeat(500));
        let tracker = tracker(MockPermission::new(true), focus);
        tracker.tick_wordcount().await;
        assert_eq!(tracker.snapshot().progress, 0.25);

        assert_eq!(tracker.update_goal(50), 100);
        assert_eq!(tracker.snapshot().progress, 1.0);

        assert_eq!(tracker.update_goal(999_999), 10_000);
        assert_eq!(tracker.snapshot().progress, 0.05);

        assert_eq!(tracker.update_goal(5_000), 5_000);
        let state = tracker.snapshot();
        assert_eq!(state.goal_words, 5_000);
        assert_eq!(state.progress, 0.1);
        assert_eq!(state.page_count, 500.0 / 300.0);
    }

    #[tokio::test]
    async fn test_reset_timer() {
        let tracker = tracker(MockPermission::new(true), Arc::new(MockFocus::default()));
        tracker.tick_focus();
        tracker.tick_focus();
        assert_eq!(tracker.snapshot().focus_minutes, 2);

        tracker.reset_timer();
        assert_eq!(tracker.snapshot().focus_minutes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_drive_both_ticks() {
        let focus = MockFocus::with_value("ticking along nicely");
        let tracker = tracker(MockPermission::new(true), focus.clone());
        tracker.start();
        assert!(tracker.is_running());

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(tracker.snapshot().word_count, 3);
        assert_eq!(focus.calls(), 1);
        assert_eq!(tracker.snapshot().focus_minutes, 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(tracker.snapshot().focus_minutes, 1);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_does_not_double_schedule() {
        let focus = MockFocus::with_value("x");
        let tracker = tracker(MockPermission::new(true), focus.clone());
        tracker.start();
        tracker.start();

        tokio::time::sleep(Duration::from_millis(61_500)).await;
        assert_eq!(tracker.snapshot().focus_minutes, 1);
        assert_eq!(focus.calls(), 61);

        tracker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_mutation_after_stop() {
        let focus = MockFocus::with_value("before stop");
        let tracker = tracker(MockPermission::new(true), focus.clone());
        tracker.start();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        tracker.stop();
        assert!(!tracker.is_running());
        let stopped = tracker.snapshot();

        focus.set_value(Some("changed after the tracker stopped"));
        tokio::time::sleep(Duration::from_secs(180)).await;

        assert_eq!(tracker.snapshot(), stopped);
        assert_eq!(focus.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_tracker_ends_ticks() {
        let focus = MockFocus::with_value("gone soon");
        let tracker = tracker(MockPermission::new(true), focus.clone());
        tracker.start();
        drop(tracker);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(focus.calls(), 0);
    }
}
