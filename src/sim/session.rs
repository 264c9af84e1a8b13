//! Session state machine and fixed-timestep driver
//!
//! Owns score, misses, spawn cadence and the difficulty ramp. The host
//! calls `advance` with wall-clock elapsed time and `pointer_moved` with
//! input positions; score-affecting outcomes come back as drained
//! `SessionEvent`s rather than callbacks.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::board::Board;
use super::kinematics::Kinematics;
use super::object::ObjectKind;
use crate::consts::{MAX_FRAME_MS, MAX_SUBSTEPS};
use crate::errors::GameError;
use crate::highscore::{HighScore, ScoreStore};
use crate::sprites::SpriteSource;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Menu; nothing simulated
    Idle,
    /// Active gameplay
    Playing,
    /// Suspended mid-run, state frozen
    Paused,
    /// Run ended, waiting for a new start or return to menu
    GameOver,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    MissLimit,
    HazardHit,
}

/// Outcomes the presentation layer reacts to, drained once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Scored { points: u64, total: u64 },
    NewHighScore { best: u64 },
    Missed { count: u32 },
    GameOver { reason: GameOverReason },
}

/// One run of the game, from start to game over
pub struct Session {
    tuning: Tuning,
    phase: GamePhase,
    score: u64,
    misses: u32,
    /// Current flight duration; shrinks as difficulty ramps
    flight_ms: f32,
    /// Difficulty steps applied so far
    ramp_steps: u64,
    kin: Kinematics,
    board: Board,
    seed: u64,
    rng: Pcg32,
    loader: Box<dyn SpriteSource>,
    store: Box<dyn ScoreStore>,
    high_score: HighScore,
    events: Vec<SessionEvent>,
    /// Unconsumed wall-clock time (ms)
    accumulator_ms: f32,
    /// Time until the next periodic spawn (ms)
    spawn_countdown_ms: f32,
    /// Scorable spawns remaining before the next bomb
    fruits_until_bomb: u32,
    last_pointer: Option<Vec2>,
}

impl Session {
    pub fn new(
        width: f32,
        height: f32,
        seed: u64,
        tuning: Tuning,
        loader: Box<dyn SpriteSource>,
        store: Box<dyn ScoreStore>,
    ) -> Result<Self, GameError> {
        tuning.validate()?;
        let kin = Kinematics::solve(
            width,
            height,
            tuning.flight_ms,
            tuning.step_ms,
            tuning.spawn_margin,
        )?;
        let high_score = HighScore::load(store.as_ref());
        let flight_ms = tuning.flight_ms;
        let spawn_countdown_ms = tuning.spawn_interval_ms;
        Ok(Self {
            tuning,
            phase: GamePhase::Idle,
            score: 0,
            misses: 0,
            flight_ms,
            ramp_steps: 0,
            kin,
            board: Board::new(width, height),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            loader,
            store,
            high_score,
            events: Vec::new(),
            accumulator_ms: 0.0,
            spawn_countdown_ms,
            fruits_until_bomb: 0,
            last_pointer: None,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn best(&self) -> u64 {
        self.high_score.best()
    }

    /// The live object set, for the render surface
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current solved kinematics (gravity reflects the difficulty ramp)
    pub fn kinematics(&self) -> &Kinematics {
        &self.kin
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a new run. Everything but the high score resets; stale sprite
    /// loads from a previous run are invalidated by the board's generation
    /// bump.
    pub fn start(&mut self) -> Result<(), GameError> {
        self.score = 0;
        self.misses = 0;
        self.flight_ms = self.tuning.flight_ms;
        self.ramp_steps = 0;
        self.kin = Kinematics::solve(
            self.kin.width,
            self.kin.height,
            self.flight_ms,
            self.tuning.step_ms,
            self.tuning.spawn_margin,
        )?;
        self.board.reset();
        self.events.clear();
        self.accumulator_ms = 0.0;
        self.spawn_countdown_ms = self.tuning.spawn_interval_ms;
        self.fruits_until_bomb = self.roll_bomb_gap();
        self.last_pointer = None;
        self.phase = GamePhase::Playing;
        log::info!("Session started (seed {})", self.seed);
        self.spawn_next();
        Ok(())
    }

    /// Feed wall-clock time; runs zero or more fixed steps.
    pub fn advance(&mut self, elapsed_ms: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        // Negative elapsed time (clock adjustment) must not drain the
        // accumulator and stall future steps
        self.accumulator_ms += elapsed_ms.clamp(0.0, MAX_FRAME_MS);
        let mut substeps = 0;
        while self.accumulator_ms >= self.tuning.step_ms && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator_ms -= self.tuning.step_ms;
            substeps += 1;
            if self.phase != GamePhase::Playing {
                break;
            }
        }
    }

    /// One fixed simulation step.
    fn step(&mut self) {
        // Deferred insertions first, so a finished load is visible before
        // anything else observes the set this step
        let completed = self.loader.poll_completed();
        self.board.admit_loads(completed);

        self.spawn_countdown_ms -= self.tuning.step_ms;
        if self.spawn_countdown_ms <= 0.0 {
            self.spawn_countdown_ms += self.tuning.spawn_interval_ms;
            self.spawn_next();
        }

        let report = self.board.tick(self.kin.gravity);
        for _ in 0..report.missed {
            self.on_miss();
            if self.phase != GamePhase::Playing {
                break;
            }
        }
    }

    fn roll_bomb_gap(&mut self) -> u32 {
        self.rng
            .random_range(self.tuning.bomb_gap_min..self.tuning.bomb_gap_max)
    }

    /// Spawn the next object on the cadence: a bomb once the scorable
    /// counter runs out, a catalog fruit otherwise.
    fn spawn_next(&mut self) {
        let (kind, sprite, size) = if self.fruits_until_bomb == 0 {
            self.fruits_until_bomb = self.roll_bomb_gap();
            (
                ObjectKind::Bomb,
                self.tuning.bomb_sprite.clone(),
                self.tuning.bomb_size,
            )
        } else {
            self.fruits_until_bomb -= 1;
            let idx = self.rng.random_range(0..self.tuning.fruit_sprites.len());
            (
                ObjectKind::Fruit,
                self.tuning.fruit_sprites[idx].clone(),
                self.tuning.fruit_size,
            )
        };
        if let Err(e) = self.board.spawn(
            kind,
            &sprite,
            size,
            &self.kin,
            &mut self.rng,
            self.loader.as_mut(),
        ) {
            log::warn!("Skipping spawn: {e}");
        }
    }

    /// Route a pointer position through hit testing. The slice axis comes
    /// from the segment since the previous position.
    pub fn pointer_moved(&mut self, pos: Vec2) {
        let segment = match self.last_pointer {
            Some(prev) => pos - prev,
            None => Vec2::ZERO,
        };
        // Tracked in every phase, so the axis after a resume reflects the
        // pointer's recent displacement rather than its pre-pause position
        self.last_pointer = Some(pos);
        if self.phase != GamePhase::Playing {
            return;
        }

        let outcomes = self.board.hit_test(pos, segment, self.loader.as_mut());
        for outcome in outcomes {
            match outcome.kind {
                ObjectKind::Fruit => self.on_score(),
                ObjectKind::Bomb => {
                    self.on_hazard_hit();
                    break;
                }
            }
        }
    }

    fn on_score(&mut self) {
        self.score += self.tuning.points_per_slice;
        self.events.push(SessionEvent::Scored {
            points: self.tuning.points_per_slice,
            total: self.score,
        });
        if self.high_score.submit(self.score, self.store.as_mut()) {
            self.events.push(SessionEvent::NewHighScore { best: self.score });
        }

        // Each crossed score multiple shortens the flight and steepens
        // gravity; this is the sole difficulty ramp
        let steps = self.score / self.tuning.ramp_score_step;
        while self.ramp_steps < steps {
            self.ramp_steps += 1;
            let next_flight = self.flight_ms * self.tuning.ramp_flight_factor;
            match Kinematics::solve(
                self.kin.width,
                self.kin.height,
                next_flight,
                self.tuning.step_ms,
                self.tuning.spawn_margin,
            ) {
                Ok(kin) => {
                    self.flight_ms = next_flight;
                    self.kin = kin;
                    log::info!(
                        "Difficulty up: flight {:.0}ms, gravity {:.4}",
                        self.flight_ms,
                        self.kin.gravity
                    );
                }
                Err(e) => {
                    log::warn!("Ramp stopped: {e}");
                    break;
                }
            }
        }
    }

    fn on_miss(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.misses += 1;
        self.events.push(SessionEvent::Missed { count: self.misses });
        log::info!("Miss {}/{}", self.misses, self.tuning.max_misses);
        if self.misses >= self.tuning.max_misses {
            self.game_over(GameOverReason::MissLimit);
        }
    }

    fn on_hazard_hit(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.game_over(GameOverReason::HazardHit);
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.phase = GamePhase::GameOver;
        self.board.reset();
        self.events.push(SessionEvent::GameOver { reason });
        log::info!(
            "Game over ({reason:?}): score {}, best {}",
            self.score,
            self.high_score.best()
        );
    }

    /// Freeze the run. No steps, spawns or slices until `resume`.
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
            log::info!("Paused");
        }
    }

    /// Continue a paused run. Wall-clock time spent paused is discarded,
    /// never replayed as a burst of steps. No-op unless paused.
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
            self.accumulator_ms = 0.0;
            log::info!("Resumed");
        }
    }

    /// Abandon the current run and return to the menu.
    pub fn to_menu(&mut self) {
        if self.phase == GamePhase::Idle {
            return;
        }
        self.phase = GamePhase::Idle;
        self.board.reset();
        log::info!("Returned to menu");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscore::MemoryStore;
    use crate::sim::object::SliceState;
    use crate::sprites::InstantSprites;

    fn session_with(tuning: Tuning, seed: u64) -> Session {
        Session::new(
            800.0,
            600.0,
            seed,
            tuning,
            Box::new(InstantSprites::new()),
            Box::new(MemoryStore::new()),
        )
        .unwrap()
    }

    fn default_session(seed: u64) -> Session {
        session_with(Tuning::default(), seed)
    }

    /// Advance one fixed step at a time until the predicate holds.
    fn advance_until(session: &mut Session, max_steps: u32, mut done: impl FnMut(&Session) -> bool) {
        let step = session.tuning.step_ms;
        for _ in 0..max_steps {
            session.advance(step);
            if done(session) {
                return;
            }
        }
        panic!("condition not reached in {max_steps} steps");
    }

    /// Center of the first live object matching the predicate.
    fn center_of(session: &Session, pred: impl Fn(ObjectKind) -> bool) -> Vec2 {
        let obj = session
            .board()
            .objects()
            .iter()
            .find(|o| pred(o.kind) && !o.is_sliced())
            .expect("no matching object");
        obj.pos + Vec2::new(obj.size.width / 2.0, obj.size.height / 2.0)
    }

    #[test]
    fn test_new_rejects_zero_ramp_step() {
        // Would divide by zero on the first scored slice
        let mut tuning = Tuning::default();
        tuning.ramp_score_step = 0;
        let res = Session::new(
            800.0,
            600.0,
            1,
            tuning,
            Box::new(InstantSprites::new()),
            Box::new(MemoryStore::new()),
        );
        assert!(matches!(res, Err(GameError::InvalidParameters(_))));
    }

    #[test]
    fn test_start_spawns_one_scorable_immediately() {
        let mut session = default_session(1);
        assert_eq!(session.phase(), GamePhase::Idle);
        session.start().unwrap();
        assert_eq!(session.phase(), GamePhase::Playing);

        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());
        assert_eq!(session.board().objects().len(), 1);
        assert_eq!(session.board().objects()[0].kind, ObjectKind::Fruit);
    }

    #[test]
    fn test_three_unsliced_fruits_end_the_run_with_cleared_set() {
        let mut session = default_session(2);
        session.start().unwrap();

        advance_until(&mut session, 5000, |s| s.phase() == GamePhase::GameOver);
        assert_eq!(session.misses(), 3);
        assert!(session.board().objects().is_empty());

        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::Missed { count: 3 }));
        assert_eq!(
            events.last(),
            Some(&SessionEvent::GameOver {
                reason: GameOverReason::MissLimit
            })
        );
        // Repeated ticks after the transition change nothing
        session.advance(1000.0);
        assert_eq!(session.misses(), 3);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_slicing_scores_and_ramps_difficulty() {
        let mut tuning = Tuning::default();
        tuning.points_per_slice = 100;
        tuning.ramp_score_step = 100;
        let mut session = session_with(tuning, 3);
        session.start().unwrap();

        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());
        let slow_gravity = session.kinematics().gravity;
        let slow_flight = session.kinematics().flight_ms;

        session.pointer_moved(center_of(&session, |k| k == ObjectKind::Fruit));

        assert_eq!(session.score(), 100);
        assert_eq!(session.best(), 100);
        // Shorter flight, strictly faster fall
        assert!((session.kinematics().flight_ms - slow_flight * 0.95).abs() < 1e-3);
        assert!(session.kinematics().gravity > slow_gravity);

        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::Scored { points: 100, total: 100 }));
        assert!(events.contains(&SessionEvent::NewHighScore { best: 100 }));

        // The slice left two decorative halves
        let halves: Vec<_> = session
            .board()
            .objects()
            .iter()
            .filter(|o| o.slice_state == SliceState::Sliced)
            .collect();
        assert_eq!(halves.len(), 2);
    }

    #[test]
    fn test_slicing_a_bomb_ends_the_run() {
        let mut tuning = Tuning::default();
        // Alternate fruit and bomb so the second spawn is a bomb
        tuning.bomb_gap_min = 1;
        tuning.bomb_gap_max = 2;
        tuning.spawn_interval_ms = tuning.step_ms * 2.0;
        let mut session = session_with(tuning, 4);
        session.start().unwrap();

        advance_until(&mut session, 20, |s| {
            s.board().objects().iter().any(|o| o.kind == ObjectKind::Bomb)
        });
        session.pointer_moved(center_of(&session, |k| k == ObjectKind::Bomb));

        assert_eq!(session.phase(), GamePhase::GameOver);
        assert!(session.board().objects().is_empty());
        assert_eq!(
            session.drain_events().last(),
            Some(&SessionEvent::GameOver {
                reason: GameOverReason::HazardHit
            })
        );
    }

    #[test]
    fn test_bomb_cadence_respects_gap_range() {
        let mut tuning = Tuning::default();
        tuning.spawn_interval_ms = tuning.step_ms * 2.0;
        let mut session = session_with(tuning, 5);
        session.start().unwrap();

        // Record each admitted object's kind in spawn order
        let mut seen = Vec::new();
        let mut kinds = Vec::new();
        for _ in 0..400 {
            session.advance(session.tuning.step_ms);
            for obj in session.board().objects() {
                if !seen.contains(&obj.id) {
                    seen.push(obj.id);
                    kinds.push(obj.kind);
                }
            }
            if session.phase() != GamePhase::Playing {
                break;
            }
        }

        let bombs = kinds.iter().filter(|k| **k == ObjectKind::Bomb).count();
        assert!(bombs >= 2, "expected several bombs, saw {bombs}");

        // Runs of fruits between bombs stay inside [gap_min, gap_max)
        let mut run = 0u32;
        let mut runs = Vec::new();
        for kind in &kinds {
            match kind {
                ObjectKind::Fruit => run += 1,
                ObjectKind::Bomb => {
                    runs.push(run);
                    run = 0;
                }
            }
        }
        for gap in &runs {
            assert!(
                (session.tuning.bomb_gap_min..session.tuning.bomb_gap_max).contains(gap),
                "fruit run {gap} outside the configured gap"
            );
        }
    }

    #[test]
    fn test_pause_freezes_everything_resume_continues() {
        let mut session = default_session(6);
        session.start().unwrap();
        advance_until(&mut session, 10, |s| !s.board().objects().is_empty());
        session.advance(session.tuning.step_ms * 4.0);

        let frozen: Vec<Vec2> = session.board().objects().iter().map(|o| o.pos).collect();
        let score = session.score();
        let misses = session.misses();

        session.pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        // Wall-clock time passes; nothing may move
        for _ in 0..50 {
            session.advance(1000.0);
        }
        session.pointer_moved(Vec2::new(400.0, 300.0));

        session.resume();
        assert_eq!(session.phase(), GamePhase::Playing);
        let after: Vec<Vec2> = session.board().objects().iter().map(|o| o.pos).collect();
        assert_eq!(after, frozen);
        assert_eq!(session.score(), score);
        assert_eq!(session.misses(), misses);

        // And the paused time never replays as a burst
        session.advance(session.tuning.step_ms);
        let moved: Vec<Vec2> = session.board().objects().iter().map(|o| o.pos).collect();
        assert_ne!(moved, frozen);
        for (a, b) in moved.iter().zip(frozen.iter()) {
            assert!((a.y - b.y).abs() < 20.0, "position jumped during resume");
        }
    }

    #[test]
    fn test_slice_axis_after_resume_uses_recent_motion() {
        let mut session = default_session(11);
        session.start().unwrap();
        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());

        let center = center_of(&session, |k| k == ObjectKind::Fruit);
        // A far-below position seen while playing, then a near-horizontal
        // approach made entirely during the pause
        session.pointer_moved(center + Vec2::new(5.0, 300.0));
        session.pause();
        session.pointer_moved(center - Vec2::new(50.0, 5.0));
        session.resume();
        session.pointer_moved(center);

        // Horizontal swipe: halves keep full width, half height
        let halves = session.board().objects();
        assert_eq!(halves.len(), 2);
        for half in halves {
            assert_eq!(half.size.width, session.tuning.fruit_size.width);
            assert_eq!(half.size.height, session.tuning.fruit_size.height / 2.0);
        }
    }

    #[test]
    fn test_resume_outside_pause_is_noop() {
        let mut session = default_session(7);
        session.resume();
        assert_eq!(session.phase(), GamePhase::Idle);
        session.pause();
        assert_eq!(session.phase(), GamePhase::Idle);

        session.start().unwrap();
        session.resume();
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_negative_elapsed_never_stalls_the_clock() {
        let mut session = default_session(12);
        session.start().unwrap();
        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());

        let before: Vec<Vec2> = session.board().objects().iter().map(|o| o.pos).collect();
        session.advance(-5000.0);
        assert_eq!(
            before,
            session.board().objects().iter().map(|o| o.pos).collect::<Vec<_>>()
        );

        // The very next full step still runs
        session.advance(session.tuning.step_ms);
        let after: Vec<Vec2> = session.board().objects().iter().map(|o| o.pos).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn test_restart_discards_previous_sessions_loads() {
        let mut tuning = Tuning::default();
        tuning.spawn_interval_ms = 60_000.0;
        let mut session = session_with(tuning, 8);

        // First run requests its initial spawn, then is abandoned before
        // the load is admitted
        session.start().unwrap();
        session.start().unwrap();

        session.advance(session.tuning.step_ms * 2.0);
        assert_eq!(session.board().objects().len(), 1);
        assert_eq!(session.board().pending_count(), 0);
    }

    #[test]
    fn test_high_score_survives_restart() {
        let mut tuning = Tuning::default();
        tuning.points_per_slice = 30;
        let mut session = session_with(tuning, 9);
        session.start().unwrap();

        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());
        session.pointer_moved(center_of(&session, |k| k == ObjectKind::Fruit));
        assert_eq!(session.best(), 30);

        session.start().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.misses(), 0);
        assert_eq!(session.best(), 30);
    }

    #[test]
    fn test_to_menu_clears_the_run() {
        let mut session = default_session(10);
        session.start().unwrap();
        advance_until(&mut session, 5, |s| !s.board().objects().is_empty());

        session.to_menu();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert!(session.board().objects().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = default_session(42);
        let mut b = default_session(42);
        a.start().unwrap();
        b.start().unwrap();

        for _ in 0..200 {
            a.advance(a.tuning.step_ms);
            b.advance(b.tuning.step_ms);
        }

        let pos_a: Vec<(u32, Vec2)> = a.board().objects().iter().map(|o| (o.id, o.pos)).collect();
        let pos_b: Vec<(u32, Vec2)> = b.board().objects().iter().map(|o| (o.id, o.pos)).collect();
        assert_eq!(pos_a, pos_b);
    }
}
