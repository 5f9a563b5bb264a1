//! Mining state machine: one timed operation per tile coordinate.
//!
//! ## Lifecycle
//!
//! ```text
//!   NotMining ──try_start──▶ InProgress ──advance (elapsed ≥ duration)──▶ Completed
//!                                 │
//!                                 └── tile changed underneath / cancel_all ──▶ Cancelled (refund)
//! ```
//!
//! Stamina is paid in full when an operation starts. Duration is fixed at
//! start from the tile, the tool in hand and the Speed skill, and never
//! recomputed. Any number of operations may run at distinct coordinates.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::economy::Economy;
use super::grid::TileGrid;
use super::item::{ItemId, ToolId};
use super::tile::Tile;
use super::visibility::VisibilityTracker;

#[derive(Clone, Debug, PartialEq)]
pub struct MiningConfig {
    /// Chebyshev reach from the actor's centre tile.
    pub range_tiles: i32,
    /// Fractional duration jitter, applied as `1 ± jitter`.
    pub jitter: f32,
    pub speed_bonus_per_level: f32,
    pub min_duration: f32,
    pub min_stamina_cost: f32,
    pub stamina_per_second: f32,
    pub decay_reduction_per_level: f32,
    pub skill_point_every: u32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            range_tiles: 3,
            jitter: 0.10,
            speed_bonus_per_level: 0.10,
            min_duration: 0.05,
            min_stamina_cost: 1.0,
            stamina_per_second: 4.0,
            decay_reduction_per_level: 0.05,
            skill_point_every: 15,
        }
    }
}

/// Why a mining request was refused. Refusals never change state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MineRejection {
    #[error("target is outside the world")]
    OutOfBounds,
    #[error("target has not been uncovered")]
    NotRevealed,
    #[error("nothing there can be mined")]
    NotMineable,
    #[error("target is out of reach")]
    OutOfRange,
    #[error("already mining that tile")]
    AlreadyMining,
    #[error("need {cost} stamina, have {available:.0}")]
    InsufficientStamina { cost: f32, available: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiningOperation {
    pub tile: Tile,
    pub tool: ToolId,
    pub elapsed: f32,
    pub duration: f32,
    pub stamina_paid: f32,
}

impl MiningOperation {
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

/// Accepted request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MiningStart {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
    pub duration: f32,
    pub cost: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MiningOutcome {
    Completed { x: i32, y: i32, tile: Tile, item: Option<ItemId>, stored: bool },
    Cancelled { x: i32, y: i32, refund: f32 },
    ToolBroke { tool: ToolId },
    SkillPointEarned { points: u32 },
}

pub struct MiningController {
    cfg: MiningConfig,
    ops: BTreeMap<(i32, i32), MiningOperation>,
    rng: StdRng,
    since_point: u32,
    total_mined: u32,
}

impl MiningController {
    pub fn new(cfg: MiningConfig, seed: u64) -> Self {
        MiningController {
            cfg,
            ops: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
            since_point: 0,
            total_mined: 0,
        }
    }

    pub fn total_mined(&self) -> u32 {
        self.total_mined
    }

    #[cfg(test)]
    pub fn since_last_point(&self) -> u32 {
        self.since_point
    }

    pub fn active_count(&self) -> usize {
        self.ops.len()
    }

    /// `(x, y, fraction)` for every operation in flight.
    pub fn progress(&self) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        self.ops.iter().map(|(&(x, y), op)| (x, y, op.progress()))
    }

    // ══════════════════════════════════════════════════════════
    // Cost model
    // ══════════════════════════════════════════════════════════

    /// Seconds to mine `tile` with `tool` at `speed_level`, for a given
    /// jitter multiplier. `None` if the tool cannot make progress.
    pub fn duration_for(&self, tile: Tile, tool: ToolId, speed_level: u32, jitter: f32) -> Option<f32> {
        let base = tile.base_duration()?;
        let factor = tool.speed_factor(tile.class()?);
        if factor <= 0.0 {
            return None;
        }
        let skill = 1.0 + speed_level as f32 * self.cfg.speed_bonus_per_level;
        Some((base * jitter / (factor * skill)).max(self.cfg.min_duration))
    }

    pub fn stamina_cost(&self, duration: f32) -> f32 {
        (duration * self.cfg.stamina_per_second).max(self.cfg.min_stamina_cost).round()
    }

    // ══════════════════════════════════════════════════════════
    // Transitions
    // ══════════════════════════════════════════════════════════

    /// Start mining `(x, y)` for an actor whose centre is in `actor_tile`.
    pub fn try_start(
        &mut self,
        (x, y): (i32, i32),
        actor_tile: (i32, i32),
        grid: &TileGrid,
        visibility: &VisibilityTracker,
        economy: &mut Economy,
    ) -> Result<MiningStart, MineRejection> {
        let tile = grid.tile_at(x, y).ok_or(MineRejection::OutOfBounds)?;
        if !visibility.is_revealed(x, y) {
            return Err(MineRejection::NotRevealed);
        }
        if !tile.is_removable() {
            return Err(MineRejection::NotMineable);
        }
        let reach = (x - actor_tile.0).abs().max((y - actor_tile.1).abs());
        if reach > self.cfg.range_tiles {
            return Err(MineRejection::OutOfRange);
        }
        if self.ops.contains_key(&(x, y)) {
            return Err(MineRejection::AlreadyMining);
        }

        let tool = economy.effective_tool();
        let j = self.cfg.jitter;
        let jitter = if j > 0.0 { self.rng.gen_range(1.0 - j..=1.0 + j) } else { 1.0 };
        let duration = self
            .duration_for(tile, tool, economy.skills.speed, jitter)
            .ok_or(MineRejection::NotMineable)?;
        let cost = self.stamina_cost(duration);

        if !economy.spend_stamina(cost) {
            return Err(MineRejection::InsufficientStamina {
                cost,
                available: economy.stamina.value,
            });
        }

        self.ops.insert((x, y), MiningOperation {
            tile,
            tool,
            elapsed: 0.0,
            duration,
            stamina_paid: cost,
        });
        log::debug!("mining {tile:?} at ({x},{y}) with {tool:?}: {duration:.2}s, {cost} stamina");

        Ok(MiningStart { x, y, tile, duration, cost })
    }

    /// Advance every operation by `dt` and apply completions.
    pub fn advance(
        &mut self,
        dt: f32,
        grid: &mut TileGrid,
        visibility: &mut VisibilityTracker,
        economy: &mut Economy,
    ) -> Vec<MiningOutcome> {
        let mut outcomes = Vec::new();
        let mut finished = Vec::new();

        for (&(x, y), op) in self.ops.iter_mut() {
            if grid.tile_at(x, y) != Some(op.tile) {
                finished.push(((x, y), false));
                continue;
            }
            op.elapsed += dt;
            if op.elapsed >= op.duration {
                finished.push(((x, y), true));
            }
        }

        for ((x, y), done) in finished {
            let Some(op) = self.ops.remove(&(x, y)) else { continue };
            if done {
                self.complete(x, y, op, grid, visibility, economy, &mut outcomes);
            } else {
                economy.refund_stamina(op.stamina_paid);
                log::debug!("mining at ({x},{y}) cancelled: tile changed");
                outcomes.push(MiningOutcome::Cancelled { x, y, refund: op.stamina_paid });
            }
        }

        outcomes
    }

    #[allow(clippy::too_many_arguments)]
    fn complete(
        &mut self,
        x: i32,
        y: i32,
        op: MiningOperation,
        grid: &mut TileGrid,
        visibility: &mut VisibilityTracker,
        economy: &mut Economy,
        outcomes: &mut Vec<MiningOutcome>,
    ) {
        let Some(tile) = grid.remove_tile(x, y) else { return };
        visibility.reveal(x, y);
        visibility.reveal_neighbors4(x, y);

        let item = tile.drop_item();
        let stored = item.map_or(false, |i| economy.add_item(i));
        outcomes.push(MiningOutcome::Completed { x, y, tile, item, stored });

        let reduction = (1.0 - economy.skills.endurance as f32 * self.cfg.decay_reduction_per_level).max(0.0);
        if economy.tools.decay(op.tool, tile.decay_per_block() * reduction) {
            log::info!("{} broke", op.tool.label());
            outcomes.push(MiningOutcome::ToolBroke { tool: op.tool });
        }

        self.total_mined += 1;
        self.since_point += 1;
        if self.since_point >= self.cfg.skill_point_every {
            self.since_point = 0;
            economy.skills.points += 1;
            log::info!("skill point earned ({} unspent)", economy.skills.points);
            outcomes.push(MiningOutcome::SkillPointEarned { points: economy.skills.points });
        }
    }

    /// Abort everything in flight, refunding the stamina each one reserved.
    pub fn cancel_all(&mut self, economy: &mut Economy) -> Vec<MiningOutcome> {
        std::mem::take(&mut self.ops)
            .into_iter()
            .map(|((x, y), op)| {
                economy.refund_stamina(op.stamina_paid);
                MiningOutcome::Cancelled { x, y, refund: op.stamina_paid }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Column 0..4, surface at row 1; rows 0-1 revealed.
    fn setup(rows: &[&str]) -> (TileGrid, VisibilityTracker, Economy, MiningController) {
        let grid = TileGrid::from_diagram(rows);
        let vis = VisibilityTracker::new(grid.width(), grid.height(), 1);
        (grid, vis, Economy::new(), MiningController::new(MiningConfig::default(), 1))
    }

    fn no_jitter() -> MiningController {
        let cfg = MiningConfig { jitter: 0.0, ..MiningConfig::default() };
        MiningController::new(cfg, 1)
    }

    // ── Cost model ──

    #[test]
    fn duration_scales_with_tool_and_speed() {
        let m = no_jitter();
        let hand = m.duration_for(Tile::Stone, ToolId::Hand, 0, 1.0).unwrap();
        let pick = m.duration_for(Tile::Stone, ToolId::StonePick, 0, 1.0).unwrap();
        let fast = m.duration_for(Tile::Stone, ToolId::StonePick, 5, 1.0).unwrap();
        assert!((hand - 1.2 / 0.35).abs() < 1e-4);
        assert!((pick - 1.2 / 1.8).abs() < 1e-4);
        assert!((fast - 1.2 / (1.8 * 1.5)).abs() < 1e-4);
    }

    #[test]
    fn duration_floored_at_minimum() {
        let m = no_jitter();
        let d = m.duration_for(Tile::Grass, ToolId::MetalShovel, 1000, 1.0).unwrap();
        assert_eq!(d, MiningConfig::default().min_duration);
    }

    #[test]
    fn bedrock_has_no_duration() {
        let m = no_jitter();
        assert_eq!(m.duration_for(Tile::Bedrock, ToolId::MetalPick, 0, 1.0), None);
    }

    #[test]
    fn stamina_cost_rounds_with_floor() {
        let m = no_jitter();
        assert_eq!(m.stamina_cost(0.05), 1.0);
        assert_eq!(m.stamina_cost(1.2), 5.0);
        assert_eq!(m.stamina_cost(3.4286), 14.0);
    }

    // ── Start rejections ──

    #[test]
    fn rejects_unrevealed_out_of_range_and_bedrock() {
        let (grid, vis, mut eco, mut m) = setup(&[
            ".....",
            "ggggg",
            "ddddd",
            "BBBBB",
        ]);
        let before = eco.stamina;
        assert_eq!(m.try_start((0, 2), (0, 0), &grid, &vis, &mut eco), Err(MineRejection::NotRevealed));
        assert_eq!(m.try_start((9, 1), (0, 0), &grid, &vis, &mut eco), Err(MineRejection::OutOfBounds));
        assert_eq!(m.try_start((0, 0), (0, 0), &grid, &vis, &mut eco), Err(MineRejection::NotMineable));
        assert_eq!(m.try_start((4, 1), (0, 0), &grid, &vis, &mut eco), Err(MineRejection::OutOfRange));

        let mut vis = vis;
        vis.reveal(0, 3);
        assert_eq!(m.try_start((0, 3), (0, 1), &grid, &vis, &mut eco), Err(MineRejection::NotMineable));

        assert_eq!(eco.stamina, before);
        assert_eq!(m.active_count(), 0);
    }

    #[test]
    fn range_is_chebyshev() {
        let (grid, vis, mut eco, mut m) = setup(&[".......", "ggggggg", "BBBBBBB"]);
        assert!(m.try_start((3, 1), (0, 0), &grid, &vis, &mut eco).is_ok());
        assert_eq!(m.try_start((4, 1), (1, 5), &grid, &vis, &mut eco), Err(MineRejection::OutOfRange));
    }

    #[test]
    fn insufficient_stamina_is_rejected_cleanly() {
        let (grid, vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        eco.stamina.value = 0.5;
        let r = m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco);
        assert!(matches!(r, Err(MineRejection::InsufficientStamina { .. })));
        assert_eq!(eco.stamina.value, 0.5);
        assert_eq!(m.active_count(), 0);
    }

    #[test]
    fn stamina_deducted_once_per_tile() {
        let (grid, vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        let start = m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        let after_first = eco.stamina.value;
        assert_eq!(after_first, eco.skills.max_stamina() - start.cost);
        assert_eq!(eco.stamina.cooldown, crate::domain::economy::STAMINA_REGEN.cooldown);

        assert_eq!(m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco), Err(MineRejection::AlreadyMining));
        assert_eq!(eco.stamina.value, after_first);
        assert_eq!(m.active_count(), 1);
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let (grid, vis, mut eco, mut m) = setup(&[".......", "ggggggg", "BBBBBBB"]);
        for x in 0..7 {
            let s = m.try_start((x, 1), (3, 0), &grid, &vis, &mut eco).unwrap();
            assert!(s.duration >= 0.4 * 0.9 - 1e-5 && s.duration <= 0.4 * 1.1 + 1e-5, "{}", s.duration);
        }
    }

    // ── Advance / completion ──

    #[test]
    fn stone_with_pickaxe_end_to_end() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&[
            "...",
            "ggg",
            "d#d",
            "ddd",
            "BBB",
        ]);
        eco.tools.grant(ToolId::StonePick);
        eco.equip(ToolId::StonePick);
        eco.skills.endurance = 2;
        vis.reveal(1, 2);

        m.try_start((1, 2), (1, 1), &grid, &vis, &mut eco).unwrap();
        let out = m.advance(10.0, &mut grid, &mut vis, &mut eco);

        assert_eq!(grid.tile_at(1, 2), Some(Tile::Empty));
        assert_eq!(eco.inventory.count(ItemId::Stone), 1);
        assert_eq!(ItemId::Stone.key(), "stone_item");
        let expected = 160.0 - 1.5 * (1.0 - 2.0 * 0.05);
        let got = eco.tools.durability(ToolId::StonePick).unwrap();
        assert!((got - expected).abs() < 1e-4, "{got}");
        for (nx, ny) in [(1, 1), (1, 3), (0, 2), (2, 2)] {
            assert!(vis.is_revealed(nx, ny));
        }
        assert!(!vis.is_revealed(0, 3));
        assert_eq!(out, vec![MiningOutcome::Completed {
            x: 1, y: 2, tile: Tile::Stone, item: Some(ItemId::Stone), stored: true,
        }]);
        assert_eq!(m.active_count(), 0);
    }

    #[test]
    fn partial_progress_does_not_complete() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        assert!(m.advance(0.1, &mut grid, &mut vis, &mut eco).is_empty());
        let (_, _, frac) = m.progress().next().unwrap();
        assert!(frac > 0.0 && frac < 1.0);
        assert_eq!(grid.tile_at(1, 1), Some(Tile::Grass));
    }

    #[test]
    fn concurrent_operations_complete_independently() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        for x in 0..3 {
            m.try_start((x, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        }
        assert_eq!(m.active_count(), 3);
        let out = m.advance(5.0, &mut grid, &mut vis, &mut eco);
        let completed = out.iter().filter(|o| matches!(o, MiningOutcome::Completed { .. })).count();
        assert_eq!(completed, 3);
        assert_eq!(eco.inventory.count(ItemId::Grass), 3);
    }

    #[test]
    fn changed_tile_cancels_with_refund() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        let s = m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        let paid = eco.stamina.value;
        grid.set_tile(1, 1, Tile::Empty);
        let out = m.advance(0.01, &mut grid, &mut vis, &mut eco);
        assert_eq!(out, vec![MiningOutcome::Cancelled { x: 1, y: 1, refund: s.cost }]);
        assert_eq!(eco.stamina.value, paid + s.cost);
    }

    #[test]
    fn full_inventory_discards_item_but_removes_tile() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        let cap = eco.skills.capacity();
        eco.inventory.add(ItemId::Dirt, cap, cap);
        m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        let out = m.advance(5.0, &mut grid, &mut vis, &mut eco);
        assert_eq!(grid.tile_at(1, 1), Some(Tile::Empty));
        assert_eq!(eco.inventory.count(ItemId::Grass), 0);
        assert!(matches!(out[0], MiningOutcome::Completed { stored: false, .. }));
    }

    #[test]
    fn tool_breaks_on_exact_decay() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        eco.tools.grant(ToolId::WoodShovel);
        eco.equip(ToolId::WoodShovel);
        eco.tools.decay(ToolId::WoodShovel, 99.5);
        m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        let out = m.advance(5.0, &mut grid, &mut vis, &mut eco);
        assert!(out.contains(&MiningOutcome::ToolBroke { tool: ToolId::WoodShovel }));
        assert_eq!(eco.tools.durability(ToolId::WoodShovel), Some(0.0));
        assert_eq!(eco.effective_tool(), ToolId::Hand);
    }

    #[test]
    fn hand_never_decays() {
        let (mut grid, mut vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        m.try_start((1, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        let out = m.advance(5.0, &mut grid, &mut vis, &mut eco);
        assert!(!out.iter().any(|o| matches!(o, MiningOutcome::ToolBroke { .. })));
        assert_eq!(eco.tools.durability(ToolId::Hand), None);
    }

    #[test]
    fn one_skill_point_per_fifteen_completions() {
        let row_sky = ".".repeat(16);
        let row_mixed = "gd#cgd#cgd#cgd#c".to_string();
        let row_rock = "B".repeat(16);
        let (mut grid, mut vis, mut eco, mut m) =
            setup(&[row_sky.as_str(), row_mixed.as_str(), row_rock.as_str()]);
        eco.stamina.value = 10_000.0;

        let mut points = 0;
        for x in 0..16 {
            vis.reveal(x, 1);
            m.try_start((x, 1), (x, 0), &grid, &vis, &mut eco).unwrap();
            let out = m.advance(20.0, &mut grid, &mut vis, &mut eco);
            points += out.iter().filter(|o| matches!(o, MiningOutcome::SkillPointEarned { .. })).count();
            if x == 13 {
                assert_eq!(points, 0);
            }
            if x == 14 {
                assert_eq!(points, 1);
                assert_eq!(m.since_last_point(), 0);
            }
        }
        assert_eq!(eco.skills.points, 1);
        assert_eq!(m.since_last_point(), 1);
        assert_eq!(m.total_mined(), 16);
    }

    #[test]
    fn cancel_all_refunds_everything() {
        let (grid, vis, mut eco, mut m) = setup(&["...", "ggg", "BBB"]);
        let full = eco.stamina.value;
        m.try_start((0, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        m.try_start((2, 1), (1, 0), &grid, &vis, &mut eco).unwrap();
        assert!(eco.stamina.value < full);
        let out = m.cancel_all(&mut eco);
        assert_eq!(out.len(), 2);
        assert_eq!(eco.stamina.value, full);
        assert_eq!(m.active_count(), 0);
    }
}
