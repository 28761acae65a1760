//! remacro-core - Macro timeline model and file format
//!
//! A macro is a flat, linear list of timestamped input events: primary
//! clicks and key presses/releases, each carrying the wait before it.
//! This crate holds the data model, the timeline edit operations and the
//! versioned JSON file format. Capture and playback live in
//! `remacro-recorder`.

pub mod error;
pub mod events;
pub mod keys;
pub mod storage;
pub mod timeline;

pub use error::{Error, ErrorCode, Result};
pub use events::{EventKind, MacroEvent};
pub use keys::{KeySymbol, SpecialKey};
pub use storage::{MacroDocument, MacroStorage, MACRO_FILE_VERSION};
pub use timeline::{parse_delay, Timeline};

pub mod prelude {
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::events::{EventKind, MacroEvent};
    pub use crate::keys::{KeySymbol, SpecialKey};
    pub use crate::storage::{MacroDocument, MacroStorage};
    pub use crate::timeline::Timeline;
}
