//! Platform accessibility backends.
//!
//! macOS reads the focused control through the Accessibility API. Other
//! platforms have no system-wide equivalent wired up and report that
//! permission is missing, which keeps the tracker at zero.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::SystemAccessibility;

#[cfg(not(target_os = "macos"))]
mod unsupported;
#[cfg(not(target_os = "macos"))]
pub use unsupported::SystemAccessibility;
