//! Closed-form trajectory solver for spawned objects
//!
//! Canvas coordinates: origin at the top-left, y grows downward, floor at
//! `y = height`. Time is measured in fixed simulation ticks of `step_ms`
//! each; gravity and velocities are per-tick quantities, so integration is
//! plain addition with no dt factor.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::errors::GameError;

/// Solved per-session kinematic constants.
///
/// Re-solved whenever the flight duration changes (difficulty ramp).
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    /// Canvas width in pixels
    pub width: f32,
    /// Canvas height in pixels (floor level)
    pub height: f32,
    /// Target total flight duration (ms)
    pub flight_ms: f32,
    /// Fixed simulation step (ms)
    pub step_ms: f32,
    /// Horizontal spawn margin as a fraction of canvas width
    pub margin: f32,
    /// Downward acceleration in pixels per tick²
    pub gravity: f32,
    /// Flight duration expressed in ticks
    pub total_ticks: u32,
}

/// One spawn trajectory: start position, per-tick velocity, and the
/// rising/falling tick split it was solved for.
#[derive(Debug, Clone, Copy)]
pub struct Launch {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rising_ticks: u32,
    pub falling_ticks: u32,
}

impl Kinematics {
    /// Derive the gravity constant for the given canvas and timing.
    ///
    /// Gravity is chosen so a free-falling object traverses the full canvas
    /// height in half the flight duration: `g = 2H / (T/2/Δt)²`.
    pub fn solve(
        width: f32,
        height: f32,
        flight_ms: f32,
        step_ms: f32,
        margin: f32,
    ) -> Result<Self, GameError> {
        let finite = [width, height, flight_ms, step_ms, margin]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GameError::InvalidParameters(
                "non-finite canvas or timing value".into(),
            ));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(GameError::InvalidParameters(format!(
                "canvas {width}x{height} is empty"
            )));
        }
        if flight_ms <= 0.0 || step_ms <= 0.0 {
            return Err(GameError::InvalidParameters(format!(
                "flight {flight_ms}ms / step {step_ms}ms must be positive"
            )));
        }
        if !(0.0..0.5).contains(&margin) {
            return Err(GameError::InvalidParameters(format!(
                "spawn margin {margin} outside [0, 0.5)"
            )));
        }

        let total_ticks = (flight_ms / step_ms).round() as u32;
        if total_ticks < 2 {
            return Err(GameError::InvalidParameters(format!(
                "flight spans {total_ticks} ticks, need at least 2"
            )));
        }

        let half_ticks = flight_ms / 2.0 / step_ms;
        let gravity = 2.0 * height / (half_ticks * half_ticks);

        Ok(Self {
            width,
            height,
            flight_ms,
            step_ms,
            margin,
            gravity,
            total_ticks,
        })
    }

    /// Sample one launch: spawn position on the floor and an initial
    /// velocity that rises to a randomized peak in the top half of the
    /// canvas and returns to the floor within the tick budget.
    pub fn launch(&self, rng: &mut Pcg32, object_width: f32) -> Result<Launch, GameError> {
        let x_min = self.width * self.margin;
        let x_max = self.width * (1.0 - self.margin) - object_width;
        if !(x_max > x_min) {
            return Err(GameError::InvalidParameters(format!(
                "object width {object_width} leaves no spawn interval"
            )));
        }
        let x = rng.random_range(x_min..x_max);

        // Peak y-coordinate biased into the top half of the canvas
        let peak_y = (self.height / 2.0) * (self.margin + rng.random::<f32>() * (1.0 - self.margin));
        let distance = self.height - peak_y;

        // Split the tick budget: fall time is what a rest-at-peak drop
        // would take, rise time is the remainder.
        let falling_ticks = (2.0 * distance / self.gravity).sqrt().round() as u32;
        let rising_ticks = self.total_ticks.saturating_sub(falling_ticks);
        if rising_ticks == 0 {
            return Err(GameError::InvalidParameters(format!(
                "peak {peak_y} leaves no rising ticks in a {} tick flight",
                self.total_ticks
            )));
        }

        let rise = rising_ticks as f32;
        let vy = -(distance + self.gravity * rise * rise / 2.0) / rise;
        // Horizontal drift toward the canvas center over the flight
        let vx = (self.width / 2.0 - x) * 2.0 / self.flight_ms * self.step_ms;

        Ok(Launch {
            pos: Vec2::new(x, self.height),
            vel: Vec2::new(vx, vy),
            rising_ticks,
            falling_ticks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn defaults() -> Kinematics {
        Kinematics::solve(800.0, 600.0, 6000.0, 20.0, 0.05).unwrap()
    }

    /// Integrate a launch the way the board does and report
    /// (lowest y reached, y after `ticks`, final vy).
    fn fly(kin: &Kinematics, launch: &Launch, ticks: u32) -> (f32, f32, f32) {
        let mut pos = launch.pos;
        let mut vel = launch.vel;
        let mut min_y = pos.y;
        for _ in 0..ticks {
            pos.x += vel.x;
            vel.y += kin.gravity;
            pos.y += vel.y;
            min_y = min_y.min(pos.y);
        }
        (min_y, pos.y, vel.y)
    }

    #[test]
    fn test_solve_default_gravity() {
        let kin = defaults();
        assert_eq!(kin.total_ticks, 300);
        // 2 * 600 / 150^2
        assert!((kin.gravity - 0.053333).abs() < 1e-4);
        assert!(kin.gravity > 0.0);
    }

    #[test]
    fn test_solve_rejects_degenerate_inputs() {
        for (w, h, t, dt) in [
            (0.0, 600.0, 6000.0, 20.0),
            (800.0, -1.0, 6000.0, 20.0),
            (800.0, 600.0, 0.0, 20.0),
            (800.0, 600.0, 6000.0, -20.0),
            (800.0, 600.0, 10.0, 20.0), // under 2 ticks
            (f32::NAN, 600.0, 6000.0, 20.0),
            (800.0, 600.0, f32::INFINITY, 20.0),
        ] {
            let res = Kinematics::solve(w, h, t, dt, 0.05);
            assert!(
                matches!(res, Err(GameError::InvalidParameters(_))),
                "expected rejection for ({w}, {h}, {t}, {dt})"
            );
        }
    }

    #[test]
    fn test_launch_initially_rises() {
        let kin = defaults();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let launch = kin.launch(&mut rng, 80.0).unwrap();
            assert!(launch.vel.y < 0.0);
            assert_eq!(launch.rising_ticks + launch.falling_ticks, kin.total_ticks);
        }
    }

    #[test]
    fn test_launch_spawns_inside_margins() {
        let kin = defaults();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..50 {
            let launch = kin.launch(&mut rng, 80.0).unwrap();
            assert!(launch.pos.x >= kin.width * kin.margin);
            assert!(launch.pos.x <= kin.width * (1.0 - kin.margin) - 80.0);
            assert_eq!(launch.pos.y, kin.height);
        }
    }

    #[test]
    fn test_launch_peaks_in_top_half_and_returns_to_floor() {
        let kin = defaults();
        let mut rng = Pcg32::seed_from_u64(23);
        for _ in 0..50 {
            let launch = kin.launch(&mut rng, 80.0).unwrap();
            let budget = launch.rising_ticks + launch.falling_ticks;
            let (min_y, end_y, end_vy) = fly(&kin, &launch, budget);
            // Discrete integration overshoots the target apex by ~g*rising/2
            assert!(
                min_y <= kin.height / 2.0 + kin.gravity * launch.rising_ticks as f32,
                "apex {min_y} not in top half"
            );
            assert!(min_y > 0.0, "apex {min_y} above canvas top");
            // Back at the floor within one tick's displacement by the budget
            assert!(
                end_y >= kin.height - end_vy,
                "still {} px above the floor after {budget} ticks",
                kin.height - end_y
            );
        }
    }

    #[test]
    fn test_launch_rejects_oversized_object() {
        let kin = defaults();
        let mut rng = Pcg32::seed_from_u64(3);
        let res = kin.launch(&mut rng, 1000.0);
        assert!(matches!(res, Err(GameError::InvalidParameters(_))));
    }

    #[test]
    fn test_shorter_flight_means_stronger_gravity() {
        let slow = Kinematics::solve(800.0, 600.0, 6000.0, 20.0, 0.05).unwrap();
        let fast = Kinematics::solve(800.0, 600.0, 6000.0 * 0.95, 20.0, 0.05).unwrap();
        assert!(fast.gravity > slow.gravity);
    }
}
