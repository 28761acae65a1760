//! Input injection boundary
//!
//! Playback talks to the OS through [`InputInjector`]. Platform back-ends
//! live under `platform`; [`DryRunInjector`] records what would have been
//! sent and is what tests and `--dry-run` use.

use parking_lot::Mutex;
use remacro_core::{Error, ErrorCode, KeySymbol};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("no injectable mapping for key {0}")]
    UnresolvedKey(String),
    #[error("injection failed: {0}")]
    Failed(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl From<InjectError> for Error {
    fn from(e: InjectError) -> Self {
        match e {
            InjectError::UnresolvedKey(key) => Error::unresolved_symbol(&key),
            InjectError::Failed(reason) => Error::injection_failed("Input injection", &reason),
            InjectError::NotImplemented(msg) => Error::new(ErrorCode::NotImplemented, msg),
        }
    }
}

/// Sends synthetic pointer and key input to the OS
pub trait InputInjector: Send {
    /// Move the pointer to `(x, y)` and click the primary button there
    fn click(&mut self, x: i32, y: i32) -> Result<(), InjectError>;

    fn key_down(&mut self, key: &KeySymbol) -> Result<(), InjectError>;

    fn key_up(&mut self, key: &KeySymbol) -> Result<(), InjectError>;
}

impl<T: InputInjector + ?Sized> InputInjector for Box<T> {
    fn click(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        (**self).click(x, y)
    }

    fn key_down(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        (**self).key_down(key)
    }

    fn key_up(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        (**self).key_up(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InjectedAction {
    Click { x: i32, y: i32 },
    KeyDown(KeySymbol),
    KeyUp(KeySymbol),
}

/// Logs actions instead of injecting them.
///
/// Clones share one action log, so a test can keep a clone and inspect what
/// the engine's copy did. Unresolved keys are refused the same way a real
/// back-end refuses them.
#[derive(Debug, Clone, Default)]
pub struct DryRunInjector {
    log: Arc<Mutex<Vec<InjectedAction>>>,
}

impl DryRunInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<InjectedAction> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn record(&self, action: InjectedAction) {
        info!(?action, "dry run");
        self.log.lock().push(action);
    }
}

fn require_resolved(key: &KeySymbol) -> Result<(), InjectError> {
    if key.is_resolved() {
        Ok(())
    } else {
        Err(InjectError::UnresolvedKey(key.encode()))
    }
}

impl InputInjector for DryRunInjector {
    fn click(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        self.record(InjectedAction::Click { x, y });
        Ok(())
    }

    fn key_down(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        require_resolved(key)?;
        self.record(InjectedAction::KeyDown(key.clone()));
        Ok(())
    }

    fn key_up(&mut self, key: &KeySymbol) -> Result<(), InjectError> {
        require_resolved(key)?;
        self.record(InjectedAction::KeyUp(key.clone()));
        Ok(())
    }
}
