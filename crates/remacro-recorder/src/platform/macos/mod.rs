//! macOS back-end
//!
//! Capture uses a listen-only CGEventTap on a dedicated run-loop thread;
//! injection posts CGEvents at the HID tap location. Both need the
//! Accessibility and Input Monitoring permissions.

mod inject;
mod keymap;
mod listener;

pub use inject::MacInjector;
pub use listener::listen;

use super::PermissionStatus;
use crate::injector::InputInjector;
use cidre::cg::event::access as cg_access;
use remacro_core::{Error, ErrorCode, Result};

pub fn check_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: cidre::ax::is_process_trusted(),
        input_monitoring: cg_access::listen_preflight(),
    }
}

pub fn request_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: cidre::ax::is_process_trusted_with_prompt(true),
        input_monitoring: cg_access::listen_request(),
    }
}

pub fn native_injector() -> Result<Box<dyn InputInjector>> {
    if !cidre::ax::is_process_trusted() {
        return Err(Error::new(
            ErrorCode::InjectionFailed,
            "Accessibility permission required to inject input",
        )
        .with_suggestions(vec!["Run `remacro permissions --request`".to_string()]));
    }
    Ok(Box::new(MacInjector::new()))
}
