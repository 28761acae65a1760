//! Windows back-end
//!
//! Uses rdev for global capture and SendInput for injection. Neither needs
//! an explicit permission grant.

mod inject;
mod keymap;
mod listener;

pub use inject::WinInjector;
pub use listener::listen;

use super::PermissionStatus;
use crate::injector::InputInjector;
use remacro_core::Result;

pub fn check_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: true,
        input_monitoring: true,
    }
}

pub fn request_permissions() -> PermissionStatus {
    check_permissions()
}

pub fn native_injector() -> Result<Box<dyn InputInjector>> {
    Ok(Box::new(WinInjector::new()))
}
