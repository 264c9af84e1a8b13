//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by spawn order)
//! - No rendering or platform dependencies

pub mod board;
pub mod kinematics;
pub mod object;
pub mod session;

pub use board::{Board, SliceOutcome, TickReport};
pub use kinematics::{Kinematics, Launch};
pub use object::{MovingObject, ObjectKind, Size, SliceAxis, SliceState};
pub use session::{GameOverReason, GamePhase, Session, SessionEvent};
