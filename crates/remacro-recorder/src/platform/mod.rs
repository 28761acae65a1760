//! Platform back-ends for capture and injection
//!
//! - **macOS**: CGEventTap listener, CGEvent injection
//! - **Windows**: rdev listener, SendInput injection
//! - anything else: both report `NOT_IMPLEMENTED`

use crate::capture::ListenerHandle;
use crate::injector::InputInjector;
use remacro_core::Result;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod unsupported;

#[cfg(target_os = "macos")]
pub use macos as current;

#[cfg(target_os = "windows")]
pub use windows as current;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use unsupported as current;

/// Permission status
#[derive(Debug, Clone)]
pub struct PermissionStatus {
    pub accessibility: bool,
    pub input_monitoring: bool,
}

impl PermissionStatus {
    pub fn all_granted(&self) -> bool {
        self.accessibility && self.input_monitoring
    }
}

pub fn check_permissions() -> PermissionStatus {
    current::check_permissions()
}

pub fn request_permissions() -> PermissionStatus {
    current::request_permissions()
}

/// Start listening for system-wide pointer and key input. Notifications
/// beyond `buffer` unread ones are dropped.
pub fn listen(buffer: usize) -> Result<ListenerHandle> {
    current::listen(buffer)
}

/// Injector that drives the real input subsystem
pub fn native_injector() -> Result<Box<dyn InputInjector>> {
    current::native_injector()
}
