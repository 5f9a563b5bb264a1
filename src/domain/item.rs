//! Items, tools and their static tables.
//!
//! Every per-item or per-tool number lives in a `match` here so the
//! economy, mining and shop code never carry their own copies.

use super::tile::TileClass;

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ItemId {
    Grass,
    Dirt,
    Stone,
    Coal,
    Copper,
    Iron,
    Gold,
    Emerald,
    Diamond,
    HealthPotion,
    StaminaTonic,
}

impl ItemId {
    pub const ALL: [ItemId; 11] = [
        ItemId::Grass, ItemId::Dirt, ItemId::Stone, ItemId::Coal, ItemId::Copper,
        ItemId::Iron, ItemId::Gold, ItemId::Emerald, ItemId::Diamond,
        ItemId::HealthPotion, ItemId::StaminaTonic,
    ];

    /// Stable identifier, e.g. `stone_item`.
    pub fn key(self) -> &'static str {
        match self {
            ItemId::Grass        => "grass_item",
            ItemId::Dirt         => "dirt_item",
            ItemId::Stone        => "stone_item",
            ItemId::Coal         => "coal_item",
            ItemId::Copper       => "copper_item",
            ItemId::Iron         => "iron_item",
            ItemId::Gold         => "gold_item",
            ItemId::Emerald      => "emerald_item",
            ItemId::Diamond      => "diamond_item",
            ItemId::HealthPotion => "health_potion",
            ItemId::StaminaTonic => "stamina_tonic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemId::Grass        => "Grass",
            ItemId::Dirt         => "Dirt",
            ItemId::Stone        => "Stone",
            ItemId::Coal         => "Coal",
            ItemId::Copper       => "Copper",
            ItemId::Iron         => "Iron",
            ItemId::Gold         => "Gold",
            ItemId::Emerald      => "Emerald",
            ItemId::Diamond      => "Diamond",
            ItemId::HealthPotion => "Health Potion",
            ItemId::StaminaTonic => "Stamina Tonic",
        }
    }

    /// Consumables are bought in the shop and do not count toward capacity.
    pub fn is_consumable(self) -> bool {
        matches!(self, ItemId::HealthPotion | ItemId::StaminaTonic)
    }

    /// Coins paid by the shop for one unit. Consumables cannot be sold.
    pub fn sell_price(self) -> Option<u32> {
        match self {
            ItemId::Grass   => Some(1),
            ItemId::Dirt    => Some(1),
            ItemId::Stone   => Some(2),
            ItemId::Coal    => Some(4),
            ItemId::Copper  => Some(6),
            ItemId::Iron    => Some(8),
            ItemId::Gold    => Some(15),
            ItemId::Emerald => Some(25),
            ItemId::Diamond => Some(40),
            ItemId::HealthPotion | ItemId::StaminaTonic => None,
        }
    }

    /// Shop price for one unit, consumables only.
    pub fn buy_price(self) -> Option<u32> {
        match self {
            ItemId::HealthPotion => Some(15),
            ItemId::StaminaTonic => Some(12),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tools
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ToolId {
    Hand,
    WoodShovel,
    MetalShovel,
    StonePick,
    MetalPick,
    Sword,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::Hand, ToolId::WoodShovel, ToolId::MetalShovel,
        ToolId::StonePick, ToolId::MetalPick, ToolId::Sword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolId::Hand        => "Hand",
            ToolId::WoodShovel  => "Wood Shovel",
            ToolId::MetalShovel => "Metal Shovel",
            ToolId::StonePick   => "Stone Pickaxe",
            ToolId::MetalPick   => "Metal Pickaxe",
            ToolId::Sword       => "Sword",
        }
    }

    /// Mining speed multiplier against a tile class.
    ///
    /// | tool          | Soft | Hard |
    /// |---------------|------|------|
    /// | Hand          | 1.0  | 0.35 |
    /// | Wood Shovel   | 2.0  | 0.5  |
    /// | Metal Shovel  | 3.0  | 0.6  |
    /// | Stone Pickaxe | 1.0  | 1.8  |
    /// | Metal Pickaxe | 1.2  | 3.0  |
    /// | Sword         | 0.8  | 0.4  |
    ///
    /// Unbreakable tiles always yield 0.
    pub fn speed_factor(self, class: TileClass) -> f32 {
        match (self, class) {
            (_, TileClass::Unbreakable) => 0.0,
            (ToolId::Hand, TileClass::Soft)        => 1.0,
            (ToolId::Hand, TileClass::Hard)        => 0.35,
            (ToolId::WoodShovel, TileClass::Soft)  => 2.0,
            (ToolId::WoodShovel, TileClass::Hard)  => 0.5,
            (ToolId::MetalShovel, TileClass::Soft) => 3.0,
            (ToolId::MetalShovel, TileClass::Hard) => 0.6,
            (ToolId::StonePick, TileClass::Soft)   => 1.0,
            (ToolId::StonePick, TileClass::Hard)   => 1.8,
            (ToolId::MetalPick, TileClass::Soft)   => 1.2,
            (ToolId::MetalPick, TileClass::Hard)   => 3.0,
            (ToolId::Sword, TileClass::Soft)       => 0.8,
            (ToolId::Sword, TileClass::Hard)       => 0.4,
        }
    }

    /// Durability of a fresh tool. `None` for the bare hand.
    pub fn max_durability(self) -> Option<f32> {
        match self {
            ToolId::Hand        => None,
            ToolId::WoodShovel  => Some(100.0),
            ToolId::MetalShovel => Some(240.0),
            ToolId::StonePick   => Some(160.0),
            ToolId::MetalPick   => Some(280.0),
            ToolId::Sword       => Some(250.0),
        }
    }

    pub fn buy_price(self) -> Option<u32> {
        match self {
            ToolId::Hand        => None,
            ToolId::WoodShovel  => Some(25),
            ToolId::MetalShovel => Some(80),
            ToolId::StonePick   => Some(45),
            ToolId::MetalPick   => Some(120),
            ToolId::Sword       => Some(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = ItemId::ALL.iter().map(|i| i.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), ItemId::ALL.len());
    }

    #[test]
    fn stone_key_matches_save_format() {
        assert_eq!(ItemId::Stone.key(), "stone_item");
    }

    #[test]
    fn consumables_are_bought_not_sold() {
        for item in ItemId::ALL {
            if item.is_consumable() {
                assert!(item.buy_price().is_some());
                assert!(item.sell_price().is_none());
            } else {
                assert!(item.sell_price().is_some());
            }
        }
    }

    #[test]
    fn pickaxe_beats_shovel_on_hard() {
        assert!(ToolId::StonePick.speed_factor(TileClass::Hard)
            > ToolId::MetalShovel.speed_factor(TileClass::Hard));
        assert!(ToolId::MetalShovel.speed_factor(TileClass::Soft)
            > ToolId::StonePick.speed_factor(TileClass::Soft));
    }

    #[test]
    fn nothing_digs_unbreakable() {
        for tool in ToolId::ALL {
            assert_eq!(tool.speed_factor(TileClass::Unbreakable), 0.0);
        }
    }

    #[test]
    fn only_hand_is_free_and_infinite() {
        for tool in ToolId::ALL {
            let is_hand = tool == ToolId::Hand;
            assert_eq!(tool.max_durability().is_none(), is_hand);
            assert_eq!(tool.buy_price().is_none(), is_hand);
        }
    }
}
