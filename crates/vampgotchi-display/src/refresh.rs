// ── Full / partial refresh scheduling ──
//
// E-paper panels ghost after many partial updates. The policy forces a full
// refresh on the first update and on every `full_every`-th one after that.

use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RefreshKind {
    Full,
    Partial,
}

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    full_every: u64,
    updates: u64,
}

impl RefreshPolicy {
    /// `full_every` of 0 or 1 makes every update a full refresh.
    pub fn new(full_every: u32) -> Self {
        Self {
            full_every: u64::from(full_every.max(1)),
            updates: 0,
        }
    }

    /// Kind of the next update; advances the counter.
    pub fn next_update(&mut self) -> RefreshKind {
        let kind = if self.updates % self.full_every == 0 {
            RefreshKind::Full
        } else {
            RefreshKind::Partial
        };
        self.updates = self.updates.wrapping_add(1);
        kind
    }

    /// Updates issued so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
