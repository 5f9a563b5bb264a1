//! Shop transactions over the scene hand-off state.
//!
//! The shop only ever sees a `ShopHandoff`: it cannot touch the world,
//! the HP/stamina pools or mining in flight. A rejected transaction
//! leaves the hand-off exactly as it was.

use thiserror::Error;

use super::economy::{Inventory, SkillLevels, ToolState};
use super::item::{ItemId, ToolId};

/// Everything that crosses the boundary between world and shop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShopHandoff {
    pub coins: u32,
    pub inventory: Inventory,
    pub tools: ToolState,
    pub skills: SkillLevels,
}

/// One line of the buy list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Offer {
    Tool(ToolId),
    Consumable(ItemId),
}

impl Offer {
    pub const CATALOG: [Offer; 7] = [
        Offer::Tool(ToolId::WoodShovel),
        Offer::Tool(ToolId::MetalShovel),
        Offer::Tool(ToolId::StonePick),
        Offer::Tool(ToolId::MetalPick),
        Offer::Tool(ToolId::Sword),
        Offer::Consumable(ItemId::HealthPotion),
        Offer::Consumable(ItemId::StaminaTonic),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Offer::Tool(t) => t.label(),
            Offer::Consumable(i) => i.label(),
        }
    }

    pub fn price(self) -> Option<u32> {
        match self {
            Offer::Tool(t) => t.buy_price(),
            Offer::Consumable(i) => i.buy_price(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("{0} is not for sale")]
    NotForSale(&'static str),
    #[error("costs {price} coins, you have {coins}")]
    NotEnoughCoins { price: u32, coins: u32 },
    #[error("the shop does not buy {0}")]
    NotSellable(&'static str),
    #[error("you have no {0}")]
    NothingToSell(&'static str),
}

impl ShopHandoff {
    /// Buy one unit. Tools come with full durability, replacing any
    /// worn copy. Returns the price paid.
    pub fn buy(&mut self, offer: Offer) -> Result<u32, ShopError> {
        let price = offer.price().ok_or(ShopError::NotForSale(offer.label()))?;
        if self.coins < price {
            return Err(ShopError::NotEnoughCoins { price, coins: self.coins });
        }
        match offer {
            Offer::Tool(tool) => self.tools.grant(tool),
            Offer::Consumable(item) => {
                // Consumables bypass capacity, so this cannot fail.
                self.inventory.add(item, 1, 0);
            }
        }
        self.coins -= price;
        Ok(price)
    }

    /// Sell one unit of `item`. Returns the coins received.
    pub fn sell(&mut self, item: ItemId) -> Result<u32, ShopError> {
        let price = item.sell_price().ok_or(ShopError::NotSellable(item.label()))?;
        if !self.inventory.remove(item, 1) {
            return Err(ShopError::NothingToSell(item.label()));
        }
        self.coins += price;
        Ok(price)
    }

    /// Carried items the shop will buy: `(item, count, unit price)`.
    pub fn sellable(&self) -> Vec<(ItemId, u32, u32)> {
        self.inventory
            .iter()
            .filter_map(|(item, n)| item.sell_price().map(|p| (item, n, p)))
            .collect()
    }
}
