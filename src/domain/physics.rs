//! Actor physics against the tile grid.
//!
//! ## Tick order
//!
//!   1. Horizontal acceleration toward the input direction, or friction
//!   2. Coyote timer refresh/decay, then jump acceptance
//!   3. Gravity, clamped to max fall speed
//!   4. X pass: move, resolve against the first solid in travel direction
//!   5. Y pass: same, setting `grounded` on a downward hit
//!
//! Position is integer pixels; velocity is `f32` px/s. Each pass moves
//! `round(v * dt)` pixels in chunks no larger than half a tile, so even a
//! long frame cannot tunnel through a tile.
//!
//! ## Grounded
//!
//! `grounded` is recomputed every tick from the Y pass. An actor resting
//! on a floor usually moves zero pixels (gravity alone is below half a
//! pixel per frame), so a zero-pixel downward pass probes one pixel below
//! and treats a solid there as a downward hit.

use super::grid::{Aabb, TileGrid};

pub const ACTOR_W: i32 = 16;
pub const ACTOR_H: i32 = 32;

/// Largest single collision sub-step, in pixels.
const MAX_SUBSTEP_PX: i32 = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub accel: f32,
    pub max_speed: f32,
    pub friction: f32,
    pub gravity: f32,
    pub max_fall: f32,
    pub jump_speed: f32,
    pub coyote_time: f32,
    /// Landing speed above which the actor takes damage.
    pub fall_damage_speed: f32,
    /// HP lost per px/s above `fall_damage_speed`.
    pub fall_damage_factor: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            accel: 900.0,
            max_speed: 180.0,
            friction: 1200.0,
            gravity: 1200.0,
            max_fall: 600.0,
            jump_speed: 380.0,
            coyote_time: 0.08,
            fall_damage_speed: 450.0,
            fall_damage_factor: 0.2,
        }
    }
}

impl PhysicsConfig {
    /// HP lost for landing at `speed` px/s.
    pub fn fall_damage(&self, speed: f32) -> f32 {
        if speed > self.fall_damage_speed {
            (speed - self.fall_damage_speed) * self.fall_damage_factor
        } else {
            0.0
        }
    }

    /// Replace negative or non-finite values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let d = PhysicsConfig::default();
        for (name, value, fallback) in [
            ("accel", &mut self.accel, d.accel),
            ("max_speed", &mut self.max_speed, d.max_speed),
            ("friction", &mut self.friction, d.friction),
            ("gravity", &mut self.gravity, d.gravity),
            ("max_fall", &mut self.max_fall, d.max_fall),
            ("jump_speed", &mut self.jump_speed, d.jump_speed),
            ("coyote_time", &mut self.coyote_time, d.coyote_time),
            ("fall_damage_speed", &mut self.fall_damage_speed, d.fall_damage_speed),
            ("fall_damage_factor", &mut self.fall_damage_factor, d.fall_damage_factor),
        ] {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("physics.{name} = {value} is invalid, using {fallback}");
                *value = fallback;
            }
        }
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Per-tick movement request.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveIntent {
    /// -1 left, 0 none, +1 right.
    pub horizontal: i8,
    pub jump: bool,
}

/// What happened during one `Actor::step`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub jumped: bool,
    /// Downward speed at the moment of landing, if the actor landed.
    pub landed_speed: Option<f32>,
    pub hit_ceiling: bool,
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    pub coyote: f32,
    pub facing: Facing,
}

impl Actor {
    pub fn new(x: i32, y: i32) -> Self {
        Actor {
            x,
            y,
            w: ACTOR_W,
            h: ACTOR_H,
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            coyote: 0.0,
            facing: Facing::Right,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }

    /// Advance one tick. `dt` is in seconds.
    pub fn step(&mut self, grid: &TileGrid, cfg: &PhysicsConfig, intent: MoveIntent, dt: f32) -> StepReport {
        let mut report = StepReport::default();
        let was_grounded = self.grounded;

        // 1. horizontal
        let dir = intent.horizontal.signum() as f32;
        if dir != 0.0 {
            self.vx += dir * cfg.accel * dt;
            self.facing = if dir < 0.0 { Facing::Left } else { Facing::Right };
        } else if self.vx > 0.0 {
            self.vx = (self.vx - cfg.friction * dt).max(0.0);
        } else if self.vx < 0.0 {
            self.vx = (self.vx + cfg.friction * dt).min(0.0);
        }
        self.vx = self.vx.clamp(-cfg.max_speed, cfg.max_speed);

        // 2. coyote + jump
        if self.grounded {
            self.coyote = cfg.coyote_time;
        } else {
            self.coyote = (self.coyote - dt).max(0.0);
        }
        if intent.jump && (self.grounded || self.coyote > 0.0) {
            self.vy = -cfg.jump_speed;
            self.grounded = false;
            self.coyote = 0.0;
            report.jumped = true;
        }

        // 3. gravity
        self.vy = (self.vy + cfg.gravity * dt).min(cfg.max_fall);

        // 4. X pass
        let dx = (self.vx * dt).round() as i32;
        if self.move_x(grid, dx) {
            self.vx = 0.0;
        }

        // 5. Y pass
        self.grounded = false;
        let dy = (self.vy * dt).round() as i32;
        let fall_speed = self.vy;
        match self.move_y(grid, dy) {
            Some(true) => {
                self.grounded = true;
                self.vy = 0.0;
            }
            Some(false) => {
                self.vy = 0.0;
                report.hit_ceiling = true;
            }
            None => {
                if dy == 0 && self.vy >= 0.0 && self.resting_on_solid(grid) {
                    self.grounded = true;
                    self.vy = 0.0;
                }
            }
        }
        if self.grounded && !was_grounded {
            report.landed_speed = Some(fall_speed);
        }

        report
    }

    /// Move horizontally by `dx` pixels. Returns true on contact.
    fn move_x(&mut self, grid: &TileGrid, dx: i32) -> bool {
        let mut remaining = dx;
        while remaining != 0 {
            let chunk = remaining.clamp(-MAX_SUBSTEP_PX, MAX_SUBSTEP_PX);
            remaining -= chunk;
            let moved = Aabb::new(self.x + chunk, self.y, self.w, self.h);
            match first_contact(grid, &moved, chunk > 0, Axis::X) {
                Some(edge) => {
                    self.x = if chunk > 0 { edge - self.w } else { edge };
                    return true;
                }
                None => self.x += chunk,
            }
        }
        false
    }

    /// Move vertically by `dy` pixels. Returns `Some(true)` when landing on
    /// something, `Some(false)` on a ceiling hit, `None` when unobstructed.
    fn move_y(&mut self, grid: &TileGrid, dy: i32) -> Option<bool> {
        let mut remaining = dy;
        while remaining != 0 {
            let chunk = remaining.clamp(-MAX_SUBSTEP_PX, MAX_SUBSTEP_PX);
            remaining -= chunk;
            let moved = Aabb::new(self.x, self.y + chunk, self.w, self.h);
            match first_contact(grid, &moved, chunk > 0, Axis::Y) {
                Some(edge) => {
                    self.y = if chunk > 0 { edge - self.h } else { edge };
                    return Some(chunk > 0);
                }
                None => self.y += chunk,
            }
        }
        None
    }

    fn resting_on_solid(&self, grid: &TileGrid) -> bool {
        let probe = Aabb::new(self.x, self.y + 1, self.w, self.h);
        grid.overlaps_solid(&probe)
    }

    // ══════════════════════════════════════════════════════════
    // Placement utilities
    // ══════════════════════════════════════════════════════════

    /// Nudge the actor out of any solid tiles it overlaps, along the axis
    /// of least penetration each time. Returns true if it ends clear.
    pub fn push_out_of_solids(&mut self, grid: &TileGrid, max_iters: usize) -> bool {
        for _ in 0..max_iters {
            let b = self.aabb();
            let hit = grid
                .tiles_overlapping(&b)
                .cells()
                .map(|(tx, ty)| (tx, ty, Aabb::tile_rect(tx, ty)))
                .find(|&(tx, ty, t)| grid.is_solid(tx, ty) && b.intersects(&t));
            let Some((_, _, t)) = hit else {
                return true;
            };

            let push_left = b.right() - t.left();
            let push_right = t.right() - b.left();
            let push_up = b.bottom() - t.top();
            let push_down = t.bottom() - b.top();
            let least = push_left.min(push_right).min(push_up).min(push_down);

            if least == push_up {
                self.y -= push_up;
            } else if least == push_left {
                self.x -= push_left;
            } else if least == push_right {
                self.x += push_right;
            } else {
                self.y += push_down;
            }
        }
        !grid.overlaps_solid(&self.aabb())
    }

    /// Drop the actor straight down by at most `max_px` until it rests on
    /// a solid. Returns true (and sets `grounded`) if support was found.
    pub fn snap_to_ground(&mut self, grid: &TileGrid, max_px: i32) -> bool {
        for d in 0..=max_px {
            let probe = Aabb::new(self.x, self.y + d + 1, self.w, self.h);
            if grid.overlaps_solid(&probe) {
                self.y += d;
                self.vy = 0.0;
                self.grounded = true;
                return true;
            }
        }
        false
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Narrow phase for one axis: among solid tiles `moved` overlaps, the
/// edge that stops it first. Moving positive that is the smallest
/// leading tile edge; moving negative, the largest trailing one.
fn first_contact(grid: &TileGrid, moved: &Aabb, positive: bool, axis: Axis) -> Option<i32> {
    let hits = grid
        .tiles_overlapping(moved)
        .cells()
        .filter(|&(tx, ty)| grid.is_solid(tx, ty))
        .map(|(tx, ty)| Aabb::tile_rect(tx, ty))
        .filter(|t| moved.intersects(t));

    match (axis, positive) {
        (Axis::X, true) => hits.map(|t| t.left()).min(),
        (Axis::X, false) => hits.map(|t| t.right()).max(),
        (Axis::Y, true) => hits.map(|t| t.top()).min(),
        (Axis::Y, false) => hits.map(|t| t.bottom()).max(),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
