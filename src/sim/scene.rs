//! Scene switching between the mine and the shop.
//!
//! The shop runs as its own loop. The world hands it a `ShopHandoff` by
//! value, waits, and takes the returned state back. While the shop runs
//! the world is frozen in `Phase::InShop`.

use crate::domain::shop::ShopHandoff;
use super::event::GameEvent;
use super::step::push_outcome;
use super::world::{Phase, WorldState};

/// A shop front end. `run` blocks until the player leaves.
pub trait ShopScene {
    fn run(&mut self, handoff: ShopHandoff) -> ShopHandoff;
}

/// Result of a shop visit.
#[derive(Clone, Debug, PartialEq)]
pub struct ShopReturn {
    /// The actor ended up standing on the surface.
    pub grounded: bool,
    pub coins_delta: i64,
    /// Mining refunded on the way in.
    pub cancelled: Vec<GameEvent>,
}

/// Leave the mine, run `scene`, and come back out of the shop door.
/// Returns `None` unless the world is currently playing.
pub fn enter_shop(world: &mut WorldState, scene: &mut dyn ShopScene) -> Option<ShopReturn> {
    if world.phase != Phase::Playing { return None; }

    let mut cancelled = Vec::new();
    for outcome in world.mining.cancel_all(&mut world.economy) {
        push_outcome(outcome, &mut cancelled);
    }
    world.phase = Phase::InShop;

    let eco = &mut world.economy;
    let coins_before = eco.coins;
    log::info!("entering shop with {coins_before} coins ({} operations cancelled)", cancelled.len());

    let handoff = ShopHandoff {
        coins: eco.coins,
        inventory: std::mem::take(&mut eco.inventory),
        tools: std::mem::take(&mut eco.tools),
        skills: eco.skills,
    };
    let back = scene.run(handoff);

    eco.coins = back.coins;
    eco.inventory = back.inventory;
    eco.tools = back.tools;
    eco.skills = back.skills;
    eco.clamp_pools();

    let coins_delta = eco.coins as i64 - coins_before as i64;
    let grounded = world.place_on_column(world.shop_door_x);
    world.phase = Phase::Playing;
    log::info!("left shop, coins {coins_delta:+}");

    Some(ShopReturn { grounded, coins_delta, cancelled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::TILE_SIZE;
    use crate::domain::item::{ItemId, ToolId};
    use crate::domain::shop::Offer;
    use crate::domain::tile::Tile;
    use crate::sim::world::test_config;

    /// Records what it was given and applies a scripted session.
    struct Scripted {
        buy: Vec<Offer>,
        sell: Vec<ItemId>,
        seen: Option<ShopHandoff>,
        runs: u32,
    }

    impl Scripted {
        fn new(buy: Vec<Offer>, sell: Vec<ItemId>) -> Self {
            Scripted { buy, sell, seen: None, runs: 0 }
        }
    }

    impl ShopScene for Scripted {
        fn run(&mut self, mut handoff: ShopHandoff) -> ShopHandoff {
            self.runs += 1;
            self.seen = Some(handoff.clone());
            for item in &self.sell {
                let _ = handoff.sell(*item);
            }
            for offer in &self.buy {
                let _ = handoff.buy(*offer);
            }
            handoff
        }
    }

    fn world() -> WorldState {
        WorldState::new(&test_config(20, 30), 3).unwrap()
    }

    #[test]
    fn purchases_and_sales_carry_back() {
        let mut w = world();
        w.economy.coins = 30;
        w.economy.add_item(ItemId::Diamond);
        let mut shop = Scripted::new(vec![Offer::Tool(ToolId::StonePick)], vec![ItemId::Diamond]);

        let ret = enter_shop(&mut w, &mut shop).unwrap();
        assert_eq!(ret.coins_delta, 40 - 45);
        assert_eq!(w.economy.coins, 25);
        assert_eq!(w.economy.inventory.count(ItemId::Diamond), 0);
        assert_eq!(w.economy.tools.durability(ToolId::StonePick), Some(160.0));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn shop_sees_current_state() {
        let mut w = world();
        w.economy.coins = 7;
        w.economy.add_item(ItemId::Coal);
        w.economy.skills.points = 2;
        let mut shop = Scripted::new(vec![], vec![]);
        enter_shop(&mut w, &mut shop);

        let seen = shop.seen.unwrap();
        assert_eq!(seen.coins, 7);
        assert_eq!(seen.inventory.count(ItemId::Coal), 1);
        assert_eq!(seen.skills.points, 2);
        assert_eq!(w.economy.inventory.count(ItemId::Coal), 1);
    }

    #[test]
    fn mining_in_flight_is_refunded() {
        let mut w = world();
        let full = w.economy.stamina.value;
        let (tx, ty) = w.actor_tile();
        w.mining
            .try_start((tx, ty + 1), (tx, ty), &w.grid, &w.visibility, &mut w.economy)
            .unwrap();
        assert!(w.economy.stamina.value < full);

        let ret = enter_shop(&mut w, &mut Scripted::new(vec![], vec![])).unwrap();
        assert!(matches!(
            ret.cancelled.as_slice(),
            [GameEvent::MiningCancelled { x, y, .. }] if (*x, *y) == (tx, ty + 1)
        ));
        assert_eq!(w.mining.active_count(), 0);
        assert_eq!(w.economy.stamina.value, full);
        assert_eq!(w.grid.tile_at(tx, ty + 1), Some(Tile::Grass));
    }

    #[test]
    fn exits_grounded_at_door_over_a_dip() {
        let mut w = world();
        let door = w.shop_door_x;
        w.grid.set_tile(door, 4, Tile::Empty);
        let ret = enter_shop(&mut w, &mut Scripted::new(vec![], vec![])).unwrap();
        assert!(ret.grounded);
        assert_eq!(w.actor_tile(), (door, 4));
        assert_eq!(w.actor.aabb().bottom(), 5 * TILE_SIZE);
        assert_eq!((w.actor.vx, w.actor.vy), (0.0, 0.0));
        assert!(w.at_shop_door());
    }

    #[test]
    fn exits_on_surface_when_door_column_is_dug_out() {
        let mut w = world();
        let door = w.shop_door_x;
        for y in 4..29 {
            w.grid.set_tile(door, y, Tile::Empty);
        }
        let ret = enter_shop(&mut w, &mut Scripted::new(vec![], vec![])).unwrap();
        assert!(ret.grounded);
        let (tx, ty) = w.actor_tile();
        assert!(ty <= w.surface_level as i32, "exited at row {ty}");
        assert_eq!((tx - door).abs(), 1);
        assert!(!w.grid.overlaps_solid(&w.actor.aabb()));
    }

    #[test]
    fn pools_are_not_touched_by_the_shop() {
        let mut w = world();
        w.economy.take_damage(30.0);
        let hp = w.economy.hp.value;
        enter_shop(&mut w, &mut Scripted::new(vec![], vec![]));
        assert_eq!(w.economy.hp.value, hp);
    }

    #[test]
    fn only_enters_while_playing() {
        let mut w = world();
        w.phase = Phase::Paused;
        let mut shop = Scripted::new(vec![], vec![]);
        assert_eq!(enter_shop(&mut w, &mut shop), None);
        assert_eq!(shop.runs, 0);
        assert_eq!(w.phase, Phase::Paused);
    }
}
