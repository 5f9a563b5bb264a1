//! The step function: advances the world by one tick.
//!
//! Processing order:
//!   1. Clamp dt, expire the message bar
//!   2. Equip / skill / consumable requests
//!   3. Mining request (screen click or adjacent direction)
//!   4. Actor integration, landing and fall damage
//!   5. Proximity reveal
//!   6. HP / stamina regen
//!   7. Mining progress and completions
//!   8. Camera follow
//!   9. Faint check (respawn at the surface)
//!  10. Shop request at the door
//!
//! Nothing here blocks: the shop itself runs outside `step` once the
//! caller sees `GameEvent::ShopRequested`.

use crate::domain::economy::Skill;
use crate::domain::item::{ItemId, ToolId};
use crate::domain::mining::MiningOutcome;
use crate::domain::physics::MoveIntent;
use super::event::GameEvent;
use super::world::{Phase, WorldState, SIGHT_RADIUS};

pub const FAINT_MESSAGE: &str = "You fainted and were carried back to the surface";

/// Where the player asked to mine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MineIntent {
    /// Point in view pixels, resolved through the camera.
    Screen { sx: i32, sy: i32 },
    /// Offset in tiles from the actor's centre tile.
    Adjacent(i32, i32),
}

/// Everything the player asked for this tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub horizontal: i8,
    pub jump: bool,
    pub mine: Option<MineIntent>,
    pub interact: bool,
    pub equip: Option<ToolId>,
    pub spend_skill: Option<Skill>,
    pub use_item: Option<ItemId>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    let dt = dt.clamp(0.0, world.max_dt);
    world.tick += 1;
    world.tick_message(dt);

    resolve_requests(world, &input, &mut events);
    if let Some(intent) = input.mine {
        resolve_mine_request(world, intent, &mut events);
    }
    resolve_movement(world, &input, dt, &mut events);

    let (tx, ty) = world.actor_tile();
    world.visibility.reveal_around(tx, ty, SIGHT_RADIUS);
    world.economy.regen(dt);

    resolve_mining(world, dt, &mut events);
    world.update_camera();
    resolve_faint(world, &mut events);

    if input.interact && world.at_shop_door() {
        events.push(GameEvent::ShopRequested);
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════

fn resolve_requests(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    if let Some(tool) = input.equip {
        if world.economy.equip(tool) {
            events.push(GameEvent::ToolEquipped(tool));
        } else {
            world.set_message(&format!("{} is not available", tool.label()), 2.0);
        }
    }

    if let Some(skill) = input.spend_skill {
        if world.economy.skills.spend(skill) {
            let level = world.economy.skills.level(skill);
            log::info!("{} raised to {level}", skill.label());
            events.push(GameEvent::SkillLeveled { skill, level });
        }
    }

    if let Some(item) = input.use_item {
        if world.economy.use_consumable(item) {
            events.push(GameEvent::ConsumableUsed(item));
        }
    }
}

fn resolve_mine_request(world: &mut WorldState, intent: MineIntent, events: &mut Vec<GameEvent>) {
    let actor_tile = world.actor_tile();
    let target = match intent {
        MineIntent::Screen { sx, sy } => world.camera.screen_to_tile(sx, sy),
        MineIntent::Adjacent(dx, dy) => (actor_tile.0 + dx, actor_tile.1 + dy),
    };

    match world.mining.try_start(target, actor_tile, &world.grid, &world.visibility, &mut world.economy) {
        Ok(start) => events.push(GameEvent::MiningStarted {
            x: start.x,
            y: start.y,
            duration: start.duration,
            cost: start.cost,
        }),
        Err(why) => events.push(GameEvent::MiningRejected(why)),
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_movement(world: &mut WorldState, input: &FrameInput, dt: f32, events: &mut Vec<GameEvent>) {
    let intent = MoveIntent { horizontal: input.horizontal, jump: input.jump };
    let report = world.actor.step(&world.grid, &world.physics, intent, dt);

    if report.jumped {
        events.push(GameEvent::Jumped);
    }
    if let Some(speed) = report.landed_speed {
        events.push(GameEvent::Landed { speed });
        let amount = world.physics.fall_damage(speed);
        if amount > 0.0 {
            world.economy.take_damage(amount);
            events.push(GameEvent::Damaged { amount });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Mining
// ══════════════════════════════════════════════════════════════

fn resolve_mining(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let outcomes = world.mining.advance(dt, &mut world.grid, &mut world.visibility, &mut world.economy);
    for outcome in outcomes {
        push_outcome(outcome, events);
    }
}

pub(crate) fn push_outcome(outcome: MiningOutcome, events: &mut Vec<GameEvent>) {
    match outcome {
        MiningOutcome::Completed { x, y, tile, item, stored } => {
            events.push(GameEvent::MiningCompleted { x, y, tile });
            match item {
                Some(item) if stored => events.push(GameEvent::ItemCollected(item)),
                Some(item) => events.push(GameEvent::InventoryFull(item)),
                None => {}
            }
        }
        MiningOutcome::Cancelled { x, y, refund } => {
            events.push(GameEvent::MiningCancelled { x, y, refund });
        }
        MiningOutcome::ToolBroke { tool } => events.push(GameEvent::ToolBroke(tool)),
        MiningOutcome::SkillPointEarned { points } => {
            events.push(GameEvent::SkillPointEarned { points });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Faint
// ══════════════════════════════════════════════════════════════

fn resolve_faint(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.economy.hp.is_empty() { return; }

    log::info!("fainted at {:?}, respawning", world.actor_tile());
    for outcome in world.mining.cancel_all(&mut world.economy) {
        push_outcome(outcome, events);
    }
    world.respawn();
    world.set_message(FAINT_MESSAGE, 3.0);
    events.push(GameEvent::Fainted);
}
