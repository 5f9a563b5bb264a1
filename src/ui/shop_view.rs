//! Terminal shop scene.
//!
//! `ShopView` is the menu state (tab, cursor, status line) and applies
//! actions to the hand-off. `TerminalShop` drives it with its own frame
//! loop on the shared renderer and input trackers, returning once the
//! player leaves.

use std::thread;
use std::time::Duration;

use crossterm::event::KeyCode;
use crossterm::style::Color;

use crate::domain::item::ItemId;
use crate::domain::shop::{Offer, ShopHandoff};
use crate::sim::scene::ShopScene;
use super::gamepad::GamepadState;
use super::input::InputState;
use super::renderer::{Cell, FrameBuffer, Renderer};

const TITLE_ROW: usize = 0;
const TAB_ROW: usize = 2;
const LIST_ROW: usize = 4;

const TITLE_BG: Color = Color::Rgb { r: 90, g: 60, b: 30 };
const SELECTED_BG: Color = Color::Rgb { r: 70, g: 70, b: 70 };
const IDLE_TAB_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tab {
    Buy,
    Sell,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShopAction {
    Up,
    Down,
    SwitchTab,
    Activate,
    /// Mouse click on a terminal row.
    Click(usize),
    Leave,
}

pub struct ShopView {
    pub tab: Tab,
    pub cursor: usize,
    pub status: String,
    pub done: bool,
}

impl ShopView {
    pub fn new() -> Self {
        ShopView { tab: Tab::Buy, cursor: 0, status: String::new(), done: false }
    }

    fn rows(&self, handoff: &ShopHandoff) -> usize {
        match self.tab {
            Tab::Buy => Offer::CATALOG.len(),
            Tab::Sell => handoff.sellable().len(),
        }
    }

    pub fn apply(&mut self, action: ShopAction, handoff: &mut ShopHandoff) {
        match action {
            ShopAction::Up => self.cursor = self.cursor.saturating_sub(1),
            ShopAction::Down => {
                if self.cursor + 1 < self.rows(handoff) {
                    self.cursor += 1;
                }
            }
            ShopAction::SwitchTab => {
                self.tab = match self.tab {
                    Tab::Buy => Tab::Sell,
                    Tab::Sell => Tab::Buy,
                };
                self.cursor = 0;
            }
            ShopAction::Activate => self.activate(handoff),
            ShopAction::Click(row) if row == TAB_ROW => self.apply(ShopAction::SwitchTab, handoff),
            ShopAction::Click(row) => {
                let Some(idx) = row.checked_sub(LIST_ROW) else { return };
                if idx < self.rows(handoff) {
                    self.cursor = idx;
                    self.activate(handoff);
                }
            }
            ShopAction::Leave => self.done = true,
        }
    }

    fn activate(&mut self, handoff: &mut ShopHandoff) {
        match self.tab {
            Tab::Buy => {
                let Some(&offer) = Offer::CATALOG.get(self.cursor) else { return };
                self.status = match handoff.buy(offer) {
                    Ok(price) => {
                        log::info!("bought {} for {price}", offer.label());
                        format!("Bought {} for {price} coins", offer.label())
                    }
                    Err(e) => format!("Can't buy: {e}"),
                };
            }
            Tab::Sell => {
                let Some(&(item, _, _)) = handoff.sellable().get(self.cursor) else { return };
                self.status = match handoff.sell(item) {
                    Ok(price) => format!("Sold {} for {price} coins", item.label()),
                    Err(e) => format!("Can't sell: {e}"),
                };
                let rows = self.rows(handoff);
                self.cursor = self.cursor.min(rows.saturating_sub(1));
            }
        }
    }

    pub fn compose(&self, buf: &mut FrameBuffer, handoff: &ShopHandoff) {
        let title = format!(" SHOP   Coins: {}   Bag: {}/{} ",
            handoff.coins,
            handoff.inventory.total_resources(),
            handoff.skills.capacity());
        buf.bar(TITLE_ROW, &title, Color::White, TITLE_BG);

        let (buy_bg, sell_bg) = match self.tab {
            Tab::Buy => (SELECTED_BG, IDLE_TAB_BG),
            Tab::Sell => (IDLE_TAB_BG, SELECTED_BG),
        };
        buf.put_str(2, TAB_ROW, "   BUY   ", Color::White, buy_bg);
        buf.put_str(12, TAB_ROW, "   SELL   ", Color::White, sell_bg);

        let lines = match self.tab {
            Tab::Buy => buy_lines(handoff),
            Tab::Sell => sell_lines(handoff),
        };
        if lines.is_empty() {
            buf.put_str(4, LIST_ROW, "Nothing to sell", Color::DarkGrey, Color::Reset);
        }
        for (i, line) in lines.iter().enumerate() {
            let row = LIST_ROW + i;
            let (marker, bg) = if i == self.cursor { ('>', SELECTED_BG) } else { (' ', Color::Reset) };
            buf.set(2, row, Cell::from_char(marker, Color::Yellow, bg));
            buf.put_str(4, row, line, Color::White, bg);
        }

        let status_row = LIST_ROW + Offer::CATALOG.len().max(lines.len()) + 1;
        if !self.status.is_empty() {
            buf.put_str(2, status_row, &self.status, Color::Rgb { r: 200, g: 180, b: 50 }, Color::Reset);
        }
        buf.put_str(2, status_row + 2,
            "Tab switch  Up/Down select  Enter buy/sell  Esc leave  (click works too)",
            Color::DarkGrey, Color::Reset);
    }
}

fn buy_lines(handoff: &ShopHandoff) -> Vec<String> {
    Offer::CATALOG
        .iter()
        .map(|&offer| {
            let price = offer.price().unwrap_or(0);
            let note = match offer {
                Offer::Tool(tool) => match (handoff.tools.durability(tool), tool.max_durability()) {
                    (Some(d), Some(max)) if d > 0.0 => format!("owned {d:.0}/{max:.0}"),
                    _ => String::new(),
                },
                Offer::Consumable(item) => format!("carrying {}", handoff.inventory.count(item)),
            };
            format!("{:<16}{:>5}c   {}", offer.label(), price, note)
        })
        .collect()
}

fn sell_lines(handoff: &ShopHandoff) -> Vec<String> {
    handoff
        .sellable()
        .iter()
        .map(|&(item, n, price): &(ItemId, u32, u32)| format!("{:<16}x{:<4}{:>4}c each", item.label(), n, price))
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Terminal scene
// ══════════════════════════════════════════════════════════════

pub struct TerminalShop<'a> {
    renderer: &'a mut Renderer,
    kb: &'a mut InputState,
    gp: &'a mut GamepadState,
    frame: Duration,
}

impl<'a> TerminalShop<'a> {
    pub fn new(renderer: &'a mut Renderer, kb: &'a mut InputState, gp: &'a mut GamepadState, frame: Duration) -> Self {
        TerminalShop { renderer, kb, gp, frame }
    }

    fn read_action(&self) -> Option<ShopAction> {
        let (kb, gp) = (&*self.kb, &*self.gp);
        if kb.ctrl_c_pressed() || kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q')]) || gp.cancel_pressed() {
            return Some(ShopAction::Leave);
        }
        if let Some((_, row)) = kb.clicked_cell() {
            return Some(ShopAction::Click(row as usize));
        }
        if kb.any_pressed(&[KeyCode::Tab, KeyCode::Left, KeyCode::Right]) || gp.left_pressed() || gp.right_pressed() {
            return Some(ShopAction::SwitchTab);
        }
        if kb.any_pressed(&[KeyCode::Up, KeyCode::Char('w')]) || gp.up_pressed() {
            return Some(ShopAction::Up);
        }
        if kb.any_pressed(&[KeyCode::Down, KeyCode::Char('s')]) || gp.down_pressed() {
            return Some(ShopAction::Down);
        }
        if kb.any_pressed(&[KeyCode::Enter, KeyCode::Char(' ')]) || gp.confirm_pressed() || gp.jump_pressed() {
            return Some(ShopAction::Activate);
        }
        None
    }
}

impl ShopScene for TerminalShop<'_> {
    fn run(&mut self, mut handoff: ShopHandoff) -> ShopHandoff {
        let mut view = ShopView::new();
        self.renderer.invalidate();

        while !view.done {
            self.kb.drain_events();
            self.gp.update();
            if let Some(action) = self.read_action() {
                view.apply(action, &mut handoff);
            }
            if let Err(e) = self.renderer.present(|buf| view.compose(buf, &handoff)) {
                log::warn!("shop render failed: {e}");
                break;
            }
            thread::sleep(self.frame);
        }

        self.renderer.invalidate();
        handoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ToolId;

    fn handoff(coins: u32) -> ShopHandoff {
        ShopHandoff { coins, ..ShopHandoff::default() }
    }

    #[test]
    fn cursor_stays_in_list() {
        let mut h = handoff(0);
        let mut v = ShopView::new();
        v.apply(ShopAction::Up, &mut h);
        assert_eq!(v.cursor, 0);
        for _ in 0..20 {
            v.apply(ShopAction::Down, &mut h);
        }
        assert_eq!(v.cursor, Offer::CATALOG.len() - 1);
    }

    #[test]
    fn activate_buys_selected_offer() {
        let mut h = handoff(100);
        let mut v = ShopView::new();
        v.apply(ShopAction::Down, &mut h);
        v.apply(ShopAction::Activate, &mut h);
        assert_eq!(h.coins, 20);
        assert!(h.tools.is_usable(ToolId::MetalShovel));
        assert!(v.status.starts_with("Bought"));
    }

    #[test]
    fn failed_purchase_reports_and_keeps_coins() {
        let mut h = handoff(5);
        let mut v = ShopView::new();
        v.apply(ShopAction::Activate, &mut h);
        assert_eq!(h.coins, 5);
        assert!(v.status.starts_with("Can't buy"));
    }

    #[test]
    fn selling_last_unit_pulls_cursor_back() {
        let mut h = handoff(0);
        h.inventory.add(ItemId::Coal, 1, 10);
        h.inventory.add(ItemId::Gold, 1, 10);
        let mut v = ShopView::new();
        v.apply(ShopAction::SwitchTab, &mut h);
        v.apply(ShopAction::Down, &mut h);
        v.apply(ShopAction::Activate, &mut h);
        assert_eq!(h.coins, 15);
        assert_eq!(v.cursor, 0);
        v.apply(ShopAction::Activate, &mut h);
        assert_eq!(h.coins, 19);
        assert!(h.sellable().is_empty());
    }

    #[test]
    fn click_selects_and_acts() {
        let mut h = handoff(50);
        let mut v = ShopView::new();
        v.apply(ShopAction::Click(LIST_ROW + 5), &mut h);
        assert_eq!(v.cursor, 5);
        assert_eq!(h.inventory.count(ItemId::HealthPotion), 1);
        v.apply(ShopAction::Click(TAB_ROW), &mut h);
        assert_eq!(v.tab, Tab::Sell);
        v.apply(ShopAction::Click(LIST_ROW + 3), &mut h);
        assert_eq!(h.coins, 35);
    }

    #[test]
    fn leave_finishes() {
        let mut h = handoff(0);
        let mut v = ShopView::new();
        v.apply(ShopAction::Leave, &mut h);
        assert!(v.done);
    }
}
