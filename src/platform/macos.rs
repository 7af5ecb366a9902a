use std::os::raw::c_void;
use std::ptr;

use async_trait::async_trait;
use core_foundation::base::{CFGetTypeID, CFRelease, CFTypeRef, TCFType};
use core_foundation::string::{CFString, CFStringGetTypeID, CFStringRef};
use tracing::{trace, warn};

use crate::focus::{FocusQuery, PermissionOracle};

type AXUIElementRef = *const c_void;
type AXError = i32;

const AX_ERROR_SUCCESS: AXError = 0;

const ATTR_FOCUSED_APPLICATION: &str = "AXFocusedApplication";
const ATTR_FOCUSED_ELEMENT: &str = "AXFocusedUIElement";
const ATTR_VALUE: &str = "AXValue";
const ATTR_SELECTED_TEXT: &str = "AXSelectedText";

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXUIElementCreateSystemWide() -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AXError;
}

/// A CF object we own a +1 reference to
struct Owned(CFTypeRef);

impl Drop for Owned {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) }
    }
}

fn copy_attribute(element: &Owned, name: &str) -> Result<Owned, AXError> {
    let attribute = CFString::new(name);
    let mut value: CFTypeRef = ptr::null();
    let err = unsafe {
        AXUIElementCopyAttributeValue(element.0, attribute.as_concrete_TypeRef(), &mut value)
    };
    if err != AX_ERROR_SUCCESS || value.is_null() {
        return Err(err);
    }
    Ok(Owned(value))
}

fn string_attribute(element: &Owned, name: &str) -> Option<String> {
    let value = copy_attribute(element, name)
        .map_err(|err| trace!("{} unavailable (AXError={})", name, err))
        .ok()?;

    if unsafe { CFGetTypeID(value.0) != CFStringGetTypeID() } {
        trace!("{} is not a string", name);
        return None;
    }

    // Get rule retains; `value` releases our original reference on drop.
    let text = unsafe { CFString::wrap_under_get_rule(value.0 as CFStringRef) };
    Some(text.to_string())
}

/// Walk system-wide → focused application → focused element and read one
/// string attribute off the element. Blocking cross-process calls.
fn read_focused_attribute(attribute: &str) -> Option<String> {
    let system_wide = unsafe { AXUIElementCreateSystemWide() };
    if system_wide.is_null() {
        return None;
    }
    let system_wide = Owned(system_wide);

    let app = copy_attribute(&system_wide, ATTR_FOCUSED_APPLICATION)
        .map_err(|err| trace!("no focused application (AXError={})", err))
        .ok()?;
    let focused = copy_attribute(&app, ATTR_FOCUSED_ELEMENT)
        .map_err(|err| trace!("no focused element (AXError={})", err))
        .ok()?;

    string_attribute(&focused, attribute)
}

async fn read_off_thread(attribute: &'static str) -> Option<String> {
    match tokio::task::spawn_blocking(move || read_focused_attribute(attribute)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("accessibility query task failed: {}", e);
            None
        }
    }
}

/// Accessibility API backend
#[derive(Debug, Default, Clone)]
pub struct SystemAccessibility;

impl SystemAccessibility {
    pub fn new() -> Self {
        Self
    }
}

impl PermissionOracle for SystemAccessibility {
    fn is_trusted(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }
}

#[async_trait]
impl FocusQuery for SystemAccessibility {
    async fn focused_text(&self) -> Option<String> {
        read_off_thread(ATTR_VALUE).await
    }

    async fn focused_selected_text(&self) -> Option<String> {
        read_off_thread(ATTR_SELECTED_TEXT).await
    }
}
