//! Live object set: spawning, integration, removal, hit testing, slicing
//!
//! The board owns every object in flight. Spawns are parked in a pending
//! queue until their sprite load completes, so nothing is visible or
//! hit-testable before its art is ready. Removal is two-phase: scan first,
//! then one retain pass, never splicing mid-iteration.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::kinematics::Kinematics;
use super::object::{MovingObject, ObjectKind, Size, SliceAxis};
use crate::errors::GameError;
use crate::sprites::{CompletedLoad, LoadTicket, SpriteSource, half_sprites};

/// A spawn waiting on its sprite load
#[derive(Debug)]
struct PendingSpawn {
    ticket: LoadTicket,
    /// Session generation at request time; stale completions are discarded
    generation: u32,
    object: MovingObject,
}

/// What one simulation tick cost the player
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Unsliced fruits that crossed the floor this tick
    pub missed: u32,
}

/// What one slice did, applied by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceOutcome {
    pub id: u32,
    pub kind: ObjectKind,
}

/// Exclusive owner of the live object set
#[derive(Debug)]
pub struct Board {
    width: f32,
    height: f32,
    objects: Vec<MovingObject>,
    pending: Vec<PendingSpawn>,
    generation: u32,
    next_id: u32,
}

impl Board {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            pending: Vec::new(),
            generation: 0,
            next_id: 1,
        }
    }

    /// Allocate a new object ID
    fn next_object_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Live objects, in spawn order. The render surface walks this each
    /// frame; pending spawns are not in it.
    pub fn objects(&self) -> &[MovingObject] {
        &self.objects
    }

    /// Spawns still waiting on their sprite load
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Solve a trajectory, build the object, and park it until its sprite
    /// finishes loading.
    pub fn spawn(
        &mut self,
        kind: ObjectKind,
        sprite: &str,
        size: Size,
        kin: &Kinematics,
        rng: &mut Pcg32,
        loader: &mut dyn SpriteSource,
    ) -> Result<(), GameError> {
        let launch = kin.launch(rng, size.width)?;
        let id = self.next_object_id();
        let object = MovingObject::new(id, kind, sprite, launch.pos, launch.vel, size);
        let ticket = loader.request(sprite);
        log::debug!(
            "Spawn {id} ({kind:?}) at x={:.1}, rising {} / falling {} ticks",
            launch.pos.x,
            launch.rising_ticks,
            launch.falling_ticks
        );
        self.pending.push(PendingSpawn {
            ticket,
            generation: self.generation,
            object,
        });
        Ok(())
    }

    /// Move finished loads from the pending queue into the live set.
    ///
    /// Stale-generation completions (requested before a reset) and failed
    /// loads drop their object; a dropped object is not a miss. Tickets
    /// with no pending entry (half-sprite warm-ups) are ignored.
    pub fn admit_loads(&mut self, completed: Vec<CompletedLoad>) {
        for load in completed {
            let Some(idx) = self.pending.iter().position(|p| p.ticket == load.ticket) else {
                continue;
            };
            let spawn = self.pending.swap_remove(idx);
            if spawn.generation != self.generation {
                log::debug!(
                    "Discarding stale spawn {} from generation {}",
                    spawn.object.id,
                    spawn.generation
                );
                continue;
            }
            match load.result {
                Ok(()) => self.objects.push(spawn.object),
                Err(e) => log::warn!("Dropping spawn {}: {e}", spawn.object.id),
            }
        }
    }

    /// Integrate every live object, then remove whatever left the canvas.
    pub fn tick(&mut self, gravity: f32) -> TickReport {
        for obj in &mut self.objects {
            obj.integrate(gravity);
        }

        let missed = self
            .objects
            .iter()
            .filter(|o| o.pos.y > self.height && o.kind == ObjectKind::Fruit && !o.is_sliced())
            .count() as u32;

        let (width, height) = (self.width, self.height);
        self.objects.retain(|o| !o.off_bounds(width, height));

        TickReport { missed }
    }

    /// Slice every unsliced object containing `point`, in encounter order.
    /// The cut axis comes from the pointer's recent displacement.
    pub fn hit_test(
        &mut self,
        point: Vec2,
        segment: Vec2,
        loader: &mut dyn SpriteSource,
    ) -> Vec<SliceOutcome> {
        let hits: Vec<u32> = self
            .objects
            .iter()
            .filter(|o| !o.is_sliced() && o.contains(point))
            .map(|o| o.id)
            .collect();

        let axis = SliceAxis::from_segment(segment);
        let mut outcomes = Vec::with_capacity(hits.len());
        for id in hits {
            match self.slice(id, axis, loader) {
                Ok(outcome) => outcomes.push(outcome),
                // Unreachable from this scan; kept so a stale id can never
                // corrupt the set
                Err(e) => log::debug!("Skipping hit on {id}: {e}"),
            }
        }
        outcomes
    }

    /// Cut one object. Bombs vanish without successors; fruits are replaced
    /// by two decorative halves falling apart from the cut point.
    pub fn slice(
        &mut self,
        id: u32,
        axis: SliceAxis,
        loader: &mut dyn SpriteSource,
    ) -> Result<SliceOutcome, GameError> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.id == id && !o.is_sliced())
            .ok_or(GameError::NotFound(id))?;
        let mut original = self.objects.remove(idx);
        original.slice();

        if original.is_hazard() {
            return Ok(SliceOutcome {
                id,
                kind: ObjectKind::Bomb,
            });
        }

        let Size { width, height } = original.size;
        let (half_size, second_offset) = match axis {
            SliceAxis::Horizontal => (
                Size::new(width, height / 2.0),
                Vec2::new(0.0, height / 2.0),
            ),
            SliceAxis::Vertical => (
                Size::new(width / 2.0, height),
                Vec2::new(width / 2.0, 0.0),
            ),
        };
        let (sprite_a, sprite_b) = half_sprites(&original.sprite, axis);
        // Warm the cache; halves insert immediately, they are decorative
        loader.request(&sprite_a);
        loader.request(&sprite_b);

        let speed = original.vel.x.abs();
        for (sprite, offset, vx) in [
            (sprite_a, Vec2::ZERO, -speed),
            (sprite_b, second_offset, speed),
        ] {
            let half_id = self.next_object_id();
            let mut half = MovingObject::new(
                half_id,
                ObjectKind::Fruit,
                sprite,
                original.pos + offset,
                Vec2::new(vx, 0.0),
                half_size,
            );
            half.slice();
            self.objects.push(half);
        }

        Ok(SliceOutcome {
            id,
            kind: ObjectKind::Fruit,
        })
    }

    /// Clear the live set and invalidate in-flight spawns. Their loads may
    /// still complete; the generation check turns them away.
    pub fn reset(&mut self) {
        self.objects.clear();
        self.generation += 1;
    }
}
