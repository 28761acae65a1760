//! Platforms without a capture/injection back-end yet
//!
//! TODO: Linux support through XRecord for capture and XTest for injection.

use super::PermissionStatus;
use crate::capture::ListenerHandle;
use crate::injector::InputInjector;
use remacro_core::{Error, Result};

fn unsupported() -> Error {
    Error::not_implemented(format!(
        "Input capture and injection are not available on {}",
        std::env::consts::OS
    ))
    .with_suggestions(vec![
        "Use --dry-run to replay without injecting input".to_string(),
    ])
}

pub fn check_permissions() -> PermissionStatus {
    PermissionStatus {
        accessibility: false,
        input_monitoring: false,
    }
}

pub fn request_permissions() -> PermissionStatus {
    check_permissions()
}

pub fn listen(_buffer: usize) -> Result<ListenerHandle> {
    Err(unsupported())
}

pub fn native_injector() -> Result<Box<dyn InputInjector>> {
    Err(unsupported())
}
