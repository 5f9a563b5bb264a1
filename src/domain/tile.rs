//! Tile types and their properties.
//! Properties are queried via methods, not stored as flags,
//! so tile semantics are centralized here.

use super::item::ItemId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Grass,
    Dirt,
    Stone,
    Coal,
    Copper,
    Iron,
    Gold,
    Emerald,
    Diamond,
    Bedrock,
}

/// Material class used to pick a tool's speed factor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileClass {
    Soft,
    Hard,
    Unbreakable,
}

impl Tile {
    /// Does this tile block movement? Everything but `Empty` does.
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Empty)
    }

    /// Can this tile be mined away?
    pub fn is_removable(self) -> bool {
        !matches!(self, Tile::Empty | Tile::Bedrock)
    }

    pub fn class(self) -> Option<TileClass> {
        match self {
            Tile::Empty => None,
            Tile::Grass | Tile::Dirt => Some(TileClass::Soft),
            Tile::Bedrock => Some(TileClass::Unbreakable),
            _ => Some(TileClass::Hard),
        }
    }

    /// Seconds to mine with a speed factor of 1.0, before jitter.
    /// `None` means the tile cannot be mined.
    pub fn base_duration(self) -> Option<f32> {
        match self {
            Tile::Grass   => Some(0.4),
            Tile::Dirt    => Some(0.5),
            Tile::Stone   => Some(1.2),
            Tile::Coal    => Some(1.4),
            Tile::Copper  => Some(1.6),
            Tile::Iron    => Some(1.9),
            Tile::Gold    => Some(2.2),
            Tile::Emerald => Some(2.6),
            Tile::Diamond => Some(3.0),
            Tile::Empty | Tile::Bedrock => None,
        }
    }

    /// Durability removed from the tool that mines this tile.
    pub fn decay_per_block(self) -> f32 {
        match self {
            Tile::Grass   => 0.5,
            Tile::Dirt    => 0.75,
            Tile::Stone   => 1.5,
            Tile::Coal    => 1.75,
            Tile::Copper  => 2.0,
            Tile::Iron    => 2.25,
            Tile::Gold    => 2.5,
            Tile::Emerald => 3.0,
            Tile::Diamond => 3.5,
            Tile::Empty | Tile::Bedrock => 0.0,
        }
    }

    /// Item awarded when this tile is mined.
    pub fn drop_item(self) -> Option<ItemId> {
        match self {
            Tile::Grass   => Some(ItemId::Grass),
            Tile::Dirt    => Some(ItemId::Dirt),
            Tile::Stone   => Some(ItemId::Stone),
            Tile::Coal    => Some(ItemId::Coal),
            Tile::Copper  => Some(ItemId::Copper),
            Tile::Iron    => Some(ItemId::Iron),
            Tile::Gold    => Some(ItemId::Gold),
            Tile::Emerald => Some(ItemId::Emerald),
            Tile::Diamond => Some(ItemId::Diamond),
            Tile::Empty | Tile::Bedrock => None,
        }
    }
}
