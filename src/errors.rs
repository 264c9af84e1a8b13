//! Error types for the game core

use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// None of these are fatal to a session: a failed spawn is skipped, a stale
/// slice is ignored, a failed sprite load drops the object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("object not found: {0}")]
    NotFound(u32),

    #[error("resource failed to load: {0}")]
    ResourceLoad(String),
}
