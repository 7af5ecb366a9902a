use async_trait::async_trait;

use crate::focus::{FocusQuery, PermissionOracle};

/// Placeholder backend for platforms without a focused-text API
#[derive(Debug, Default, Clone)]
pub struct SystemAccessibility;

impl SystemAccessibility {
    pub fn new() -> Self {
        Self
    }
}

impl PermissionOracle for SystemAccessibility {
    fn is_trusted(&self) -> bool {
        false
    }
}

#[async_trait]
impl FocusQuery for SystemAccessibility {
    async fn focused_text(&self) -> Option<String> {
        None
    }

    async fn focused_selected_text(&self) -> Option<String> {
        None
    }
}
