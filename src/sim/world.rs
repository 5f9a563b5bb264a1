//! WorldState: the complete snapshot of a running game.
//!
//! ## Ownership
//!
//! The world owns every piece of simulation state. Nothing outside `sim`
//! mutates it except through `step()` and the shop hand-off in `scene`.
//! The renderer reads it once per frame and only writes `camera.view_*`.
//!
//! ## Camera / Viewport
//!
//! The camera works in world pixels:
//!   - `(x, y)` is the world pixel at the top-left of the view
//!   - `(view_w, view_h)` is the view size in pixels, set by the renderer
//!   - each frame it centres on the actor, clamped so it never shows
//!     anything outside the world (pinned at 0 if the world is smaller)

use crate::config::GameConfig;
use crate::domain::economy::Economy;
use crate::domain::grid::{TileGrid, WorldError, TILE_SIZE};
use crate::domain::mining::MiningController;
use crate::domain::physics::{Actor, PhysicsConfig};
use crate::domain::terrain::TerrainGenerator;
use crate::domain::visibility::VisibilityTracker;

/// Column the actor first appears in.
const SPAWN_COLUMN: i32 = 5;
/// Proximity sight around the actor's centre tile.
pub const SIGHT_RADIUS: i32 = 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Paused,
    InShop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    pub fn new(view_w: i32, view_h: i32) -> Self {
        Camera { x: 0, y: 0, view_w, view_h }
    }

    /// Centre on `(cx, cy)` and clamp to `[0, world - view]` on each axis.
    pub fn follow(&mut self, cx: i32, cy: i32, world_w: i32, world_h: i32) {
        self.x = (cx - self.view_w / 2).clamp(0, (world_w - self.view_w).max(0));
        self.y = (cy - self.view_h / 2).clamp(0, (world_h - self.view_h).max(0));
    }

    /// Tile under a point given in view pixels.
    pub fn screen_to_tile(&self, sx: i32, sy: i32) -> (i32, i32) {
        ((sx + self.x).div_euclid(TILE_SIZE), (sy + self.y).div_euclid(TILE_SIZE))
    }
}

pub struct WorldState {
    // ── Terrain ──
    pub grid: TileGrid,
    pub visibility: VisibilityTracker,
    pub seed: u64,
    pub surface_level: usize,
    pub shop_door_x: i32,

    // ── Actor ──
    pub actor: Actor,
    pub physics: PhysicsConfig,

    // ── Progression ──
    pub mining: MiningController,
    pub economy: Economy,

    // ── Meta ──
    pub phase: Phase,
    pub camera: Camera,
    pub max_dt: f32,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: f32,
}

// ── Construction ──

impl WorldState {
    pub fn new(config: &GameConfig, seed: u64) -> Result<Self, WorldError> {
        let wc = &config.world;
        if wc.width == 0 || wc.height < wc.surface_level + 3 {
            return Err(WorldError::TooSmall {
                width: wc.width,
                height: wc.height,
                surface_level: wc.surface_level,
            });
        }

        let terrain = TerrainGenerator::new(wc.width, wc.height, wc.surface_level).generate(seed);
        let grid = TileGrid::from_terrain(terrain, wc.width, wc.height)?;
        log::info!("world generated: {}x{}, seed {seed}", wc.width, wc.height);

        let mut world = WorldState {
            visibility: VisibilityTracker::new(wc.width, wc.height, wc.surface_level),
            grid,
            seed,
            surface_level: wc.surface_level,
            shop_door_x: wc.shop_door_x.clamp(0, wc.width as i32 - 1),
            actor: Actor::new(0, 0),
            physics: config.physics.clone(),
            mining: MiningController::new(config.mining.clone(), seed.wrapping_add(1)),
            economy: Economy::new(),
            phase: Phase::Playing,
            camera: Camera::new(0, 0),
            max_dt: config.timing.max_dt,
            tick: 0,
            message: String::new(),
            message_timer: 0.0,
        };
        world.respawn();
        Ok(world)
    }

    pub fn set_message(&mut self, msg: &str, seconds: f32) {
        self.message = msg.to_string();
        self.message_timer = seconds;
    }

    pub fn tick_message(&mut self, dt: f32) {
        if self.message_timer > 0.0 {
            self.message_timer -= dt;
            if self.message_timer <= 0.0 {
                self.message_timer = 0.0;
                self.message.clear();
            }
        }
    }
}

// ── Placement / camera ──

impl WorldState {
    pub fn world_px(&self) -> (i32, i32) {
        (self.grid.width() as i32 * TILE_SIZE, self.grid.height() as i32 * TILE_SIZE)
    }

    pub fn update_camera(&mut self) {
        let (cx, cy) = self.actor.aabb().center();
        let (ww, wh) = self.world_px();
        self.camera.follow(cx, cy, ww, wh);
    }

    /// Tile holding the actor's centre.
    pub fn actor_tile(&self) -> (i32, i32) {
        self.actor.aabb().center_tile()
    }

    /// Stand the actor on the surface at column `tile_x`, stopped. If that
    /// column has been dug out, the nearest column that still has ground
    /// within reach of the surface row is used instead. Returns true if the
    /// actor ended up grounded at or above the surface.
    pub fn place_on_column(&mut self, tile_x: i32) -> bool {
        let width = self.grid.width() as i32;
        let tx = tile_x.clamp(0, width - 1);
        let candidates = std::iter::once(tx)
            .chain((1..width).flat_map(|d| [tx - d, tx + d]))
            .filter(|&c| (0..width).contains(&c));

        let mut placed = false;
        for col in candidates {
            if self.try_stand_on_surface(col) {
                placed = true;
                break;
            }
        }
        if !placed {
            log::warn!("no standing room near column {tx}, placing anyway");
            self.try_stand_on_surface(tx);
        } else if self.actor_tile().0 != tx {
            log::debug!("column {tx} is dug out, placed at {:?}", self.actor_tile());
        }
        self.update_camera();
        placed
    }

    /// Feet on the surface row of `col`, then resolve overlap and settle
    /// onto ground no more than a short drop below.
    fn try_stand_on_surface(&mut self, col: i32) -> bool {
        let surface = self.surface_level as i32;
        let a = &mut self.actor;
        a.x = col * TILE_SIZE + (TILE_SIZE - a.w) / 2;
        a.y = surface * TILE_SIZE - a.h;
        a.vx = 0.0;
        a.vy = 0.0;
        a.grounded = false;
        a.coyote = 0.0;
        a.push_out_of_solids(&self.grid, 16);
        a.snap_to_ground(&self.grid, 2 * TILE_SIZE) && self.actor_tile().1 <= surface
    }

    /// Drop the actor onto the first solid tile of column `tile_x`.
    #[cfg(test)]
    pub(crate) fn drop_into_column(&mut self, tile_x: i32) {
        let row = self.grid.surface_row(tile_x).unwrap_or(self.surface_level as i32);
        let a = &mut self.actor;
        a.x = tile_x * TILE_SIZE + (TILE_SIZE - a.w) / 2;
        a.y = row * TILE_SIZE - a.h;
        a.vx = 0.0;
        a.vy = 0.0;
        a.snap_to_ground(&self.grid, 0);
        self.update_camera();
    }

    /// Back to the spawn column with full pools.
    pub fn respawn(&mut self) {
        self.place_on_column(SPAWN_COLUMN);
        self.economy.refill();
    }

    /// Is the actor standing in the shop doorway?
    pub fn at_shop_door(&self) -> bool {
        let (tx, ty) = self.actor_tile();
        tx == self.shop_door_x && ty <= self.surface_level as i32
    }
}

#[cfg(test)]
pub(crate) fn test_config(width: usize, height: usize) -> GameConfig {
    let mut cfg = GameConfig::default();
    cfg.world.width = width;
    cfg.world.height = height;
    cfg.world.surface_level = 4;
    cfg.world.shop_door_x = 2;
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Camera ──

    #[test]
    fn camera_centres_then_clamps() {
        let mut cam = Camera::new(800, 600);
        cam.follow(1600, 1600, 3200, 3200);
        assert_eq!((cam.x, cam.y), (1200, 1300));
        cam.follow(10, 10, 3200, 3200);
        assert_eq!((cam.x, cam.y), (0, 0));
        cam.follow(3190, 3190, 3200, 3200);
        assert_eq!((cam.x, cam.y), (2400, 2600));
    }

    #[test]
    fn camera_pins_when_world_smaller_than_view() {
        let mut cam = Camera::new(800, 600);
        cam.follow(100, 100, 320, 320);
        assert_eq!((cam.x, cam.y), (0, 0));
    }

    #[test]
    fn screen_to_tile_applies_offset() {
        let cam = Camera { x: 64, y: 320, view_w: 800, view_h: 600 };
        assert_eq!(cam.screen_to_tile(0, 0), (2, 10));
        assert_eq!(cam.screen_to_tile(31, 31), (2, 10));
        assert_eq!(cam.screen_to_tile(32, 64), (3, 12));
    }

    // ── World ──

    #[test]
    fn fresh_world_spawns_grounded_on_surface() {
        let world = WorldState::new(&test_config(20, 30), 7).unwrap();
        assert!(world.actor.grounded);
        assert!(!world.grid.overlaps_solid(&world.actor.aabb()));
        assert_eq!(world.actor.aabb().bottom(), 4 * TILE_SIZE);
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn rows_above_surface_revealed() {
        let world = WorldState::new(&test_config(20, 30), 7).unwrap();
        for y in 0..=4 {
            for x in 0..20 {
                assert!(world.visibility.is_revealed(x, y));
            }
        }
        assert!(!world.visibility.is_revealed(0, 5));
    }

    #[test]
    fn too_small_world_rejected() {
        let r = WorldState::new(&test_config(20, 6), 1);
        assert!(matches!(r, Err(WorldError::TooSmall { .. })));
    }

    #[test]
    fn shop_door_detection() {
        let mut world = WorldState::new(&test_config(20, 30), 7).unwrap();
        assert!(!world.at_shop_door());
        world.place_on_column(2);
        assert!(world.at_shop_door());
    }

    #[test]
    fn placement_settles_into_shallow_dip() {
        let mut world = WorldState::new(&test_config(20, 30), 7).unwrap();
        world.grid.remove_tile(8, 4);
        assert!(world.place_on_column(8));
        assert_eq!(world.actor_tile(), (8, 4));
        assert_eq!(world.actor.aabb().bottom(), 5 * TILE_SIZE);
        assert!(!world.grid.overlaps_solid(&world.actor.aabb()));
    }

    #[test]
    fn placement_skips_dug_shaft() {
        let mut world = WorldState::new(&test_config(20, 30), 7).unwrap();
        for y in 4..29 {
            world.grid.remove_tile(8, y);
        }
        assert!(world.place_on_column(8));
        let (tx, ty) = world.actor_tile();
        assert_eq!((tx - 8).abs(), 1);
        assert!(ty <= 4);
        assert!(world.actor.grounded);
        assert!(!world.grid.overlaps_solid(&world.actor.aabb()));
    }

    #[test]
    fn message_expires() {
        let mut world = WorldState::new(&test_config(20, 30), 7).unwrap();
        world.set_message("hello", 0.5);
        world.tick_message(0.3);
        assert_eq!(world.message, "hello");
        world.tick_message(0.3);
        assert!(world.message.is_empty());
    }
}
