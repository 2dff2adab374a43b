//! Engine lifecycle states and the errors raised by invalid transitions.

use thiserror::Error;

use crate::surface::SurfaceError;

/// Lifecycle state of an [`Engine`][crate::Engine].
///
/// ```text
/// Uninitialized -> Initialized -> Running <-> Stopped -> Destroyed
/// ```
/// `Destroyed` is reachable from every state and is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created but not yet attached to a surface.
    Uninitialized,
    /// Attached to a surface with state allocated, but never started.
    Initialized,
    /// Producing frames on tick.
    Running,
    /// Paused. State is kept but ticks don't produce frames.
    Stopped,
    /// Torn down. Every further call fails.
    Destroyed,
}

impl Lifecycle {
    /// Whether the engine holds a surface and effect state.
    pub fn is_attached(self) -> bool {
        matches!(self, Self::Initialized | Self::Running | Self::Stopped)
    }

    /// Check that an operation requiring an attached engine is allowed.
    pub(crate) fn require_attached(self) -> Result<(), EngineError> {
        match self {
            Self::Uninitialized => Err(EngineError::NotInitialized),
            Self::Destroyed => Err(EngineError::Destroyed),
            _ => Ok(()),
        }
    }
}

/// Error in [`Engine::init`][crate::Engine::init].
#[derive(Debug, Error)]
pub enum InitError {
    /// The surface couldn't provide a drawing context.
    #[error("surface has no drawing context")]
    NoContext(#[source] SurfaceError),
    /// `init` was already called successfully.
    #[error("engine is already initialized")]
    AlreadyInitialized,
    /// The engine was destroyed.
    #[error("engine has been destroyed")]
    Destroyed,
}

/// Error in an operation that requires an initialized, live engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The operation needs a surface, but `init` hasn't succeeded yet.
    #[error("engine is not initialized")]
    NotInitialized,
    /// The engine was destroyed.
    #[error("engine has been destroyed")]
    Destroyed,
}
