//! Data-driven game balance
//!
//! Spawn cadence, difficulty ramp, bomb frequency and object sizes are
//! tuning choices, not correctness requirements, so they live in one
//! serde-backed struct the host can override from JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::errors::GameError;
use crate::sim::Size;

/// Default fruit sprite catalog
const DEFAULT_FRUITS: [&str; 4] = [
    "images/apple.png",
    "images/banana.png",
    "images/peach.png",
    "images/watermelon.png",
];

/// Default bomb sprite
const DEFAULT_BOMB: &str = "images/bomb.png";

/// Gameplay balance knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Target total flight duration for a spawned object (ms)
    pub flight_ms: f32,
    /// Fixed simulation step (ms)
    pub step_ms: f32,
    /// Time between periodic spawns (ms)
    pub spawn_interval_ms: f32,
    /// Horizontal spawn margin as a fraction of canvas width
    pub spawn_margin: f32,
    /// Misses allowed before the session ends
    pub max_misses: u32,
    /// Points awarded per sliced fruit
    pub points_per_slice: u64,
    /// Score interval that triggers a difficulty step
    pub ramp_score_step: u64,
    /// Flight duration multiplier applied at each difficulty step
    pub ramp_flight_factor: f32,
    /// Bomb every Nth scorable spawn, N re-rolled in [min, max)
    pub bomb_gap_min: u32,
    pub bomb_gap_max: u32,
    pub fruit_size: Size,
    pub bomb_size: Size,
    pub fruit_sprites: Vec<String>,
    pub bomb_sprite: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            flight_ms: FLIGHT_MS,
            step_ms: STEP_MS,
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            spawn_margin: SPAWN_MARGIN,
            max_misses: MAX_MISSES,
            points_per_slice: POINTS_PER_SLICE,
            ramp_score_step: RAMP_SCORE_STEP,
            ramp_flight_factor: RAMP_FLIGHT_FACTOR,
            bomb_gap_min: BOMB_GAP_MIN,
            bomb_gap_max: BOMB_GAP_MAX,
            fruit_size: Size::new(FRUIT_SIZE, FRUIT_SIZE),
            bomb_size: Size::new(BOMB_SIZE, BOMB_SIZE),
            fruit_sprites: DEFAULT_FRUITS.iter().map(|s| s.to_string()).collect(),
            bomb_sprite: DEFAULT_BOMB.to_string(),
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let tuning: Tuning = serde_json::from_str(json)
            .map_err(|e| GameError::InvalidParameters(format!("tuning json: {e}")))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would panic or produce NaN downstream.
    pub fn validate(&self) -> Result<(), GameError> {
        let positive = [
            self.flight_ms,
            self.step_ms,
            self.spawn_interval_ms,
            self.ramp_flight_factor,
            self.fruit_size.width,
            self.fruit_size.height,
            self.bomb_size.width,
            self.bomb_size.height,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(GameError::InvalidParameters(
                "timing and size values must be positive and finite".into(),
            ));
        }
        if !(0.0..0.5).contains(&self.spawn_margin) {
            return Err(GameError::InvalidParameters(format!(
                "spawn margin {} outside [0, 0.5)",
                self.spawn_margin
            )));
        }
        if self.max_misses == 0 {
            return Err(GameError::InvalidParameters("max_misses must be >= 1".into()));
        }
        if self.ramp_score_step == 0 {
            return Err(GameError::InvalidParameters(
                "ramp_score_step must be >= 1".into(),
            ));
        }
        if self.bomb_gap_min == 0 || self.bomb_gap_max <= self.bomb_gap_min {
            return Err(GameError::InvalidParameters(format!(
                "bomb gap [{}, {}) is empty",
                self.bomb_gap_min, self.bomb_gap_max
            )));
        }
        if self.fruit_sprites.is_empty() {
            return Err(GameError::InvalidParameters(
                "fruit sprite catalog is empty".into(),
            ));
        }
        Ok(())
    }
}
