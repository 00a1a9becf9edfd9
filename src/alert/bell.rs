//! Alarm bells and the registry that owns them
//!
//! Entities never hold a bell directly; they hold a [`BellId`] resolved
//! through the registry on every use, so a bell sabotaged or removed
//! mid-night is simply observed as unavailable.

use ahash::AHashMap;
use glam::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::BellId;

/// Result of attempting to ring a bell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingOutcome {
    /// The bell tolled; this is its toll count so far tonight
    Rung { toll_count: u32 },
    Sabotaged,
    /// Toll budget for the night spent
    Exhausted,
    OnCooldown,
}

impl RingOutcome {
    pub fn rang(&self) -> bool {
        matches!(self, RingOutcome::Rung { .. })
    }
}

/// One alarm bell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bell {
    pub position: Vec2,
    toll_count: u32,
    max_tolls: u32,
    /// Minimum seconds between tolls
    cooldown: f32,
    /// Night-clock timestamp of the last toll
    last_toll_at: Option<f32>,
    sabotaged: bool,
}

impl Bell {
    pub fn new(position: Vec2, max_tolls: u32, cooldown: f32) -> Self {
        Self {
            position,
            toll_count: 0,
            max_tolls,
            cooldown,
            last_toll_at: None,
            sabotaged: false,
        }
    }

    pub fn toll_count(&self) -> u32 {
        self.toll_count
    }

    pub fn is_sabotaged(&self) -> bool {
        self.sabotaged
    }

    /// External command: block or unblock ringing
    pub fn set_sabotaged(&mut self, sabotaged: bool) {
        self.sabotaged = sabotaged;
    }

    pub fn can_ring(&self, now: f32) -> bool {
        !self.sabotaged
            && self.toll_count < self.max_tolls
            && self
                .last_toll_at
                .map(|at| now - at >= self.cooldown)
                .unwrap_or(true)
    }

    /// Attempt to toll at night-clock time `now`
    pub fn ring(&mut self, now: f32) -> RingOutcome {
        if self.sabotaged {
            return RingOutcome::Sabotaged;
        }
        if self.toll_count >= self.max_tolls {
            return RingOutcome::Exhausted;
        }
        if let Some(at) = self.last_toll_at {
            if now - at < self.cooldown {
                return RingOutcome::OnCooldown;
            }
        }

        self.toll_count += 1;
        self.last_toll_at = Some(now);
        RingOutcome::Rung {
            toll_count: self.toll_count,
        }
    }

    /// Restore the toll budget at the start of a night
    ///
    /// Sabotage is an external latch and survives the reset.
    pub fn reset_for_new_night(&mut self) {
        self.toll_count = 0;
        self.last_toll_at = None;
    }
}

/// Registry of every bell in the level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BellRegistry {
    bells: AHashMap<BellId, Bell>,
    next_id: u32,
}

impl BellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bell: Bell) -> BellId {
        let id = BellId(self.next_id);
        self.next_id += 1;
        self.bells.insert(id, bell);
        id
    }

    pub fn get(&self, id: BellId) -> Option<&Bell> {
        self.bells.get(&id)
    }

    pub fn get_mut(&mut self, id: BellId) -> Option<&mut Bell> {
        self.bells.get_mut(&id)
    }

    pub fn remove(&mut self, id: BellId) -> Option<Bell> {
        self.bells.remove(&id)
    }

    pub fn count(&self) -> usize {
        self.bells.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BellId, &Bell)> {
        self.bells.iter().map(|(&id, bell)| (id, bell))
    }

    /// Nearest non-sabotaged bell within `radius` of `from`
    ///
    /// Strict nearest by distance. At an exact tie the first bell
    /// enumerated wins, which is map-order-dependent; the tie-break is
    /// deliberately unspecified beyond that.
    pub fn nearest_available(&self, from: Vec2, radius: f32) -> Option<BellId> {
        self.bells
            .iter()
            .filter(|(_, bell)| !bell.is_sabotaged())
            .map(|(&id, bell)| (id, from.distance(bell.position)))
            .filter(|&(_, dist)| dist <= radius)
            .min_by_key(|&(_, dist)| OrderedFloat(dist))
            .map(|(id, _)| id)
    }

    pub fn reset_for_new_night(&mut self) {
        for bell in self.bells.values_mut() {
            bell.reset_for_new_night();
        }
    }
}
