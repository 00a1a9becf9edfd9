//! Process-wide alert level shared by every entity
//!
//! Read-mostly shared state with a single writer path: only bell tolls (and
//! the new-night reset) mutate it. In this single-threaded model that is a
//! discipline, not a lock; a concurrent embedding must serialize writes
//! behind one owner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// City-wide alert level, escalated one step per bell toll
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Nothing amiss; normal patrols
    #[default]
    Calm,
    /// An alarm has sounded somewhere
    Elevated,
    /// The city is actively hunting
    Alert,
}

impl AlertLevel {
    /// The next level up, saturating at `Alert`
    pub fn next(&self) -> AlertLevel {
        match self {
            AlertLevel::Calm => AlertLevel::Elevated,
            AlertLevel::Elevated => AlertLevel::Alert,
            AlertLevel::Alert => AlertLevel::Alert,
        }
    }
}

/// The shared alert state: current level plus the last confirmed sighting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalAlertState {
    level: AlertLevel,
    last_known_target: Option<Vec2>,
}

impl GlobalAlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_level(&self) -> AlertLevel {
        self.level
    }

    /// Advance one step; returns (old, new) if the level actually moved
    pub fn advance_level(&mut self) -> Option<(AlertLevel, AlertLevel)> {
        let old = self.level;
        self.level = self.level.next();
        if self.level != old {
            tracing::info!(?old, new = ?self.level, "alert level raised");
            Some((old, self.level))
        } else {
            None
        }
    }

    pub fn last_known_target_position(&self) -> Option<Vec2> {
        self.last_known_target
    }

    /// Record a confirmed sighting
    pub fn record_sighting(&mut self, position: Vec2) {
        self.last_known_target = Some(position);
    }

    /// Dawn/new-night reset
    pub fn reset(&mut self) {
        self.level = AlertLevel::Calm;
        self.last_known_target = None;
    }
}
