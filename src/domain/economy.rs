//! Player resources: inventory, tools, skills, and the HP/stamina pools.
//!
//! Derived stats (`max_hp`, `max_stamina`, `capacity`) are pure functions
//! of `SkillLevels` and are never cached. Every mutating call either applies
//! fully or returns a rejection and leaves state untouched.

use std::collections::BTreeMap;

use super::item::{ItemId, ToolId};

// ── Derived stat curves ──

const HP_BASE: f32 = 100.0;
const HP_PER_STRENGTH: f32 = 10.0;
const STAMINA_BASE: f32 = 100.0;
const STAMINA_PER_ENDURANCE: f32 = 10.0;
const CAPACITY_BASE: u32 = 20;
const CAPACITY_PER_STRENGTH: u32 = 5;

const HEALTH_POTION_HP: f32 = 40.0;
const STAMINA_TONIC_SP: f32 = 50.0;

/// Shape of a regenerating pool: `rate = min + max * fraction^exponent`,
/// paused for `cooldown` seconds after damage or spending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegenCurve {
    pub min_rate: f32,
    pub max_rate: f32,
    pub exponent: f32,
    pub cooldown: f32,
}

pub const HP_REGEN: RegenCurve = RegenCurve {
    min_rate: 0.5,
    max_rate: 6.0,
    exponent: 2.0,
    cooldown: 3.0,
};

pub const STAMINA_REGEN: RegenCurve = RegenCurve {
    min_rate: 4.0,
    max_rate: 20.0,
    exponent: 1.5,
    cooldown: 1.0,
};

// ══════════════════════════════════════════════════════════════
// Pool
// ══════════════════════════════════════════════════════════════

/// A bounded resource (HP or stamina) with a regen cooldown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pool {
    pub value: f32,
    pub cooldown: f32,
}

impl Pool {
    pub fn full(max: f32) -> Self {
        Pool { value: max, cooldown: 0.0 }
    }

    /// Deduct `amount` if available and restart the regen cooldown.
    pub fn spend(&mut self, amount: f32, curve: &RegenCurve) -> bool {
        if amount > self.value {
            return false;
        }
        self.value -= amount;
        self.cooldown = curve.cooldown;
        true
    }

    /// Unconditional loss, floored at zero. Restarts the cooldown.
    pub fn damage(&mut self, amount: f32, curve: &RegenCurve) {
        self.value = (self.value - amount).max(0.0);
        self.cooldown = curve.cooldown;
    }

    pub fn restore(&mut self, amount: f32, max: f32) {
        self.value = (self.value + amount).min(max);
    }

    /// Count the cooldown down; once it has run out, regenerate.
    pub fn regen(&mut self, dt: f32, max: f32, curve: &RegenCurve) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
            return;
        }
        if max <= 0.0 {
            self.value = 0.0;
            return;
        }
        let fraction = (self.value / max).clamp(0.0, 1.0);
        let rate = curve.min_rate + curve.max_rate * fraction.powf(curve.exponent);
        self.value = (self.value + rate * dt).clamp(0.0, max);
    }

    pub fn is_empty(&self) -> bool {
        self.value <= 0.0
    }
}

// ══════════════════════════════════════════════════════════════
// Inventory
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    counts: BTreeMap<ItemId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Inventory::default()
    }

    pub fn count(&self, item: ItemId) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    /// Units that count toward capacity (everything but consumables).
    pub fn total_resources(&self) -> u32 {
        self.counts
            .iter()
            .filter(|(item, _)| !item.is_consumable())
            .map(|(_, n)| *n)
            .sum()
    }

    /// Add `n` units, all or nothing. Consumables ignore `capacity`.
    pub fn add(&mut self, item: ItemId, n: u32, capacity: u32) -> bool {
        if !item.is_consumable() && self.total_resources() + n > capacity {
            return false;
        }
        *self.counts.entry(item).or_insert(0) += n;
        true
    }

    pub fn remove(&mut self, item: ItemId, n: u32) -> bool {
        match self.counts.get_mut(&item) {
            Some(have) if *have >= n => {
                *have -= n;
                if *have == 0 {
                    self.counts.remove(&item);
                }
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.counts.iter().map(|(item, n)| (*item, *n))
    }
}

// ══════════════════════════════════════════════════════════════
// Tools
// ══════════════════════════════════════════════════════════════

/// Remaining durability per owned tool. The hand is always owned and
/// never wears out, so it is not stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolState {
    durability: BTreeMap<ToolId, f32>,
}

impl ToolState {
    pub fn new() -> Self {
        ToolState::default()
    }

    /// `None` means infinite (the hand). Tools never bought report 0.
    pub fn durability(&self, tool: ToolId) -> Option<f32> {
        if tool == ToolId::Hand {
            None
        } else {
            Some(self.durability.get(&tool).copied().unwrap_or(0.0))
        }
    }

    pub fn is_usable(&self, tool: ToolId) -> bool {
        self.durability(tool).map_or(true, |d| d > 0.0)
    }

    /// Set a tool to its full durability (buying or re-buying it).
    pub fn grant(&mut self, tool: ToolId) {
        if let Some(max) = tool.max_durability() {
            self.durability.insert(tool, max);
        }
    }

    /// Wear a tool down, floored at zero. Returns true if this call broke it.
    pub fn decay(&mut self, tool: ToolId, amount: f32) -> bool {
        let Some(d) = self.durability.get_mut(&tool) else {
            return false;
        };
        let before = *d;
        *d = (*d - amount).max(0.0);
        before > 0.0 && *d == 0.0
    }
}

// ══════════════════════════════════════════════════════════════
// Skills
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Skill {
    Strength,
    Endurance,
    Speed,
}

impl Skill {
    pub fn label(self) -> &'static str {
        match self {
            Skill::Strength => "Strength",
            Skill::Endurance => "Endurance",
            Skill::Speed => "Speed",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkillLevels {
    pub strength: u32,
    pub endurance: u32,
    pub speed: u32,
    pub points: u32,
}

impl SkillLevels {
    pub fn level(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Strength => self.strength,
            Skill::Endurance => self.endurance,
            Skill::Speed => self.speed,
        }
    }

    /// Spend one unspent point on `skill`. Rejected without points.
    pub fn spend(&mut self, skill: Skill) -> bool {
        if self.points == 0 {
            return false;
        }
        self.points -= 1;
        match skill {
            Skill::Strength => self.strength += 1,
            Skill::Endurance => self.endurance += 1,
            Skill::Speed => self.speed += 1,
        }
        true
    }

    pub fn max_hp(&self) -> f32 {
        HP_BASE + self.strength as f32 * HP_PER_STRENGTH
    }

    pub fn max_stamina(&self) -> f32 {
        STAMINA_BASE + self.endurance as f32 * STAMINA_PER_ENDURANCE
    }

    pub fn capacity(&self) -> u32 {
        CAPACITY_BASE + self.strength * CAPACITY_PER_STRENGTH
    }
}

// ══════════════════════════════════════════════════════════════
// Economy
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Economy {
    pub coins: u32,
    pub inventory: Inventory,
    pub tools: ToolState,
    pub equipped: ToolId,
    pub skills: SkillLevels,
    pub hp: Pool,
    pub stamina: Pool,
}

impl Economy {
    pub fn new() -> Self {
        let skills = SkillLevels::default();
        Economy {
            coins: 0,
            inventory: Inventory::new(),
            tools: ToolState::new(),
            equipped: ToolId::Hand,
            hp: Pool::full(skills.max_hp()),
            stamina: Pool::full(skills.max_stamina()),
            skills,
        }
    }

    /// The equipped tool, or the hand if it is broken or not owned.
    pub fn effective_tool(&self) -> ToolId {
        if self.tools.is_usable(self.equipped) {
            self.equipped
        } else {
            ToolId::Hand
        }
    }

    /// Equip an owned, unbroken tool.
    pub fn equip(&mut self, tool: ToolId) -> bool {
        if !self.tools.is_usable(tool) {
            return false;
        }
        self.equipped = tool;
        true
    }

    pub fn add_item(&mut self, item: ItemId) -> bool {
        let cap = self.skills.capacity();
        self.inventory.add(item, 1, cap)
    }

    pub fn spend_stamina(&mut self, amount: f32) -> bool {
        self.stamina.spend(amount, &STAMINA_REGEN)
    }

    /// Give back stamina reserved for an operation that never finished.
    pub fn refund_stamina(&mut self, amount: f32) {
        let max = self.skills.max_stamina();
        self.stamina.restore(amount, max);
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hp.damage(amount, &HP_REGEN);
    }

    /// Apply one tick of passive regeneration to both pools.
    pub fn regen(&mut self, dt: f32) {
        let max_hp = self.skills.max_hp();
        let max_sp = self.skills.max_stamina();
        self.hp.regen(dt, max_hp, &HP_REGEN);
        self.stamina.regen(dt, max_sp, &STAMINA_REGEN);
    }

    /// Keep pools within bounds after skills or state changed elsewhere.
    pub fn clamp_pools(&mut self) {
        self.hp.value = self.hp.value.clamp(0.0, self.skills.max_hp());
        self.stamina.value = self.stamina.value.clamp(0.0, self.skills.max_stamina());
    }

    /// Drink a consumable. Rejected if none are carried.
    pub fn use_consumable(&mut self, item: ItemId) -> bool {
        if !item.is_consumable() || !self.inventory.remove(item, 1) {
            return false;
        }
        match item {
            ItemId::HealthPotion => {
                let max = self.skills.max_hp();
                self.hp.restore(HEALTH_POTION_HP, max);
            }
            ItemId::StaminaTonic => {
                let max = self.skills.max_stamina();
                self.stamina.restore(STAMINA_TONIC_SP, max);
            }
            _ => {}
        }
        true
    }

    /// Refill both pools to their current maximums.
    pub fn refill(&mut self) {
        self.hp = Pool::full(self.skills.max_hp());
        self.stamina = Pool::full(self.skills.max_stamina());
    }
}
