//! Fruit Rush - deterministic core for a fruit-slicing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, object set, session)
//! - `sprites`: Sprite loading port (objects stay hidden until art is ready)
//! - `highscore`: Persisted best score behind a key-value port
//! - `tuning`: Data-driven game balance
//!
//! The crate owns no pixels and no timers: a host drives `sim::Session`
//! with elapsed time and pointer positions, renders from
//! `Session::board()`, and reacts to drained `SessionEvent`s.

pub mod errors;
pub mod highscore;
pub mod sim;
pub mod sprites;
pub mod tuning;

pub use errors::GameError;
pub use highscore::{HighScore, MemoryStore, ScoreStore};
pub use sim::{GameOverReason, GamePhase, Session, SessionEvent};
pub use sprites::{CompletedLoad, InstantSprites, LoadTicket, SpriteSource};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step (ms)
    pub const STEP_MS: f32 = 20.0;
    /// Maximum fixed steps per `advance` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame fed to the step accumulator (ms)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Target total flight duration for a spawned object (ms)
    pub const FLIGHT_MS: f32 = 6000.0;
    /// Time between periodic spawns (ms)
    pub const SPAWN_INTERVAL_MS: f32 = 3000.0;
    /// Horizontal spawn margin as a fraction of canvas width
    pub const SPAWN_MARGIN: f32 = 0.05;

    /// Misses allowed before the session ends
    pub const MAX_MISSES: u32 = 3;
    /// Points awarded per sliced fruit
    pub const POINTS_PER_SLICE: u64 = 10;
    /// Score interval that triggers a difficulty step
    pub const RAMP_SCORE_STEP: u64 = 100;
    /// Flight duration multiplier applied at each difficulty step
    pub const RAMP_FLIGHT_FACTOR: f32 = 0.95;

    /// Bomb every Nth scorable spawn, N re-rolled in [min, max)
    pub const BOMB_GAP_MIN: u32 = 4;
    pub const BOMB_GAP_MAX: u32 = 8;

    /// Object defaults (square sprites, pixels)
    pub const FRUIT_SIZE: f32 = 80.0;
    pub const BOMB_SIZE: f32 = 60.0;
}
