// ── Character vitals ──
//
// The vampire's stats. Scans and attacks feed it, idling starves it.
// Every update saturates at the field's bounds.

use serde::{Deserialize, Serialize};

pub const MAX_HUNGER: u32 = 1000;
pub const MAX_BLOOD: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// `0..=MAX_HUNGER`, higher is better fed.
    pub hunger: u32,
    /// `0..=MAX_BLOOD`.
    pub blood: u32,
    pub level: u32,
    pub exp: u32,
    pub exp_to_next: u32,
    pub money: u32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            hunger: 800,
            blood: 100,
            level: 5,
            exp: 150,
            exp_to_next: 200,
            money: 400,
        }
    }
}

impl Vitals {
    pub fn hunger_percent(&self) -> u32 {
        self.hunger.min(MAX_HUNGER) / 10
    }

    pub fn on_scan_started(&mut self) {
        self.hunger = self.hunger.saturating_sub(10);
    }

    /// Reward a finished scan. Returns `true` on level-up.
    pub fn on_scan_completed(&mut self, devices_found: usize) -> bool {
        if devices_found == 0 {
            return false;
        }
        let found = u32::try_from(devices_found).unwrap_or(u32::MAX);
        self.money = self.money.saturating_add(found.saturating_mul(2));
        self.blood = self.blood.saturating_add(5).min(MAX_BLOOD);
        self.gain_exp(found.saturating_mul(5))
    }

    /// Pay for and reward an attack. Returns `true` on level-up.
    pub fn on_attack_started(&mut self) -> bool {
        self.hunger = self.hunger.saturating_sub(20);
        self.blood = self.blood.saturating_add(10).min(MAX_BLOOD);
        self.money = self.money.saturating_add(10);
        self.gain_exp(15)
    }

    pub fn on_idle_minutes(&mut self, minutes: u32) {
        self.hunger = self.hunger.saturating_sub(minutes);
    }

    fn gain_exp(&mut self, amount: u32) -> bool {
        self.exp = self.exp.saturating_add(amount);
        if self.exp < self.exp_to_next {
            return false;
        }
        self.level = self.level.saturating_add(1);
        self.exp = 0;
        self.exp_to_next = self.exp_to_next.saturating_add(self.exp_to_next / 2);
        true
    }
}
