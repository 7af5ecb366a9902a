//! Access to the text of whatever control currently has keyboard focus.
//!
//! The tracker only sees these traits. The platform implementation lives in
//! [`crate::platform`]; tests use in-memory mocks.

use async_trait::async_trait;
use tracing::trace;

/// Whether this process may inspect other applications' UI
pub trait PermissionOracle: Send + Sync {
    fn is_trusted(&self) -> bool;
}

/// Reads the focused control system-wide.
///
/// Both methods return `None` for anything that is not readable text: no
/// frontmost application, no focused element, a button, a cross-process
/// error. That is an ordinary outcome, not a failure.
#[async_trait]
pub trait FocusQuery: Send + Sync {
    /// Full text value of the focused control
    async fn focused_text(&self) -> Option<String>;

    /// Currently selected text of the focused control
    async fn focused_selected_text(&self) -> Option<String>;
}

/// Read the focused control's value, falling back to its selection
pub async fn read_focused_text(query: &dyn FocusQuery) -> Option<String> {
    if let Some(text) = query.focused_text().await {
        return Some(text);
    }
    trace!("focused control has no readable value, trying selected text");
    query.focused_selected_text().await
}
