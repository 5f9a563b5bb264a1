//! Events emitted during a simulation step.
//! The presentation layer consumes these for the message bar and log.

use crate::domain::economy::Skill;
use crate::domain::item::{ItemId, ToolId};
use crate::domain::mining::MineRejection;
use crate::domain::tile::Tile;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Landed { speed: f32 },
    Damaged { amount: f32 },
    Fainted,
    MiningStarted { x: i32, y: i32, duration: f32, cost: f32 },
    MiningRejected(MineRejection),
    MiningCompleted { x: i32, y: i32, tile: Tile },
    MiningCancelled { x: i32, y: i32, refund: f32 },
    ItemCollected(ItemId),
    InventoryFull(ItemId),
    ToolBroke(ToolId),
    ToolEquipped(ToolId),
    SkillPointEarned { points: u32 },
    SkillLeveled { skill: Skill, level: u32 },
    ConsumableUsed(ItemId),
    ShopRequested,
}
