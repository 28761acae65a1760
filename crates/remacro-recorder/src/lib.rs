//! remacro-recorder - System-wide macro recording and playback
//!
//! Captures primary clicks and key presses/releases into a
//! [`remacro_core::Timeline`] and replays them with speed scaling, loops
//! and prompt cancellation. The [`Engine`] ties both together behind an
//! Idle / Recording / Playing state machine.
//!
//! ## Platform Support
//!
//! - **macOS**: CGEventTap capture, CGEvent injection
//! - **Windows**: rdev capture, SendInput injection
//! - **Other**: [`DryRunInjector`] only

pub mod cancel;
pub mod capture;
pub mod engine;
pub mod injector;
pub mod platform;
pub mod playback;

pub use cancel::{CancelToken, WaitOutcome, WaitPolicy};
pub use capture::{
    CaptureSession, ControlSignal, Hotkeys, ListenerHandle, Notification, PointerButton, RawInput,
};
pub use engine::{Engine, EngineConfig, EngineEvent, EngineState};
pub use injector::{DryRunInjector, InjectError, InjectedAction, InputInjector};
pub use platform::PermissionStatus;
pub use playback::{PlaybackParams, PlaybackReport, Player, DEFAULT_LOOP_COUNT, DEFAULT_SPEED};

pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::capture::{ControlSignal, Hotkeys, Notification, RawInput};
    pub use crate::engine::{Engine, EngineConfig, EngineEvent, EngineState};
    pub use crate::injector::{DryRunInjector, InputInjector};
    pub use crate::playback::{PlaybackParams, PlaybackReport};
    pub use remacro_core::prelude::*;
}
